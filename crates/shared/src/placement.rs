use crate::compass::EntryHeading;
use crate::models::{AssetCategory, AssetFilter, AssetMarker, Incident, StrategyPlan};

/// Base marker distance from the incident, about 200 m expressed in degrees of arc.
pub const BASE_RADIUS_DEG: f64 = 0.0018;

/// Extra distance per category under `SeeAll` so icons at one entry point don't overlap.
pub const RADIUS_STEP_DEG: f64 = 0.0005;

/// Compute the marker set for a plan under the given filter.
///
/// Entry point order is preserved. Helicopter markers are never produced when the plan
/// does not deploy a helicopter.
pub fn place_markers(
    incident: Incident,
    plan: &StrategyPlan,
    filter: AssetFilter,
) -> Vec<AssetMarker> {
    let mut markers = Vec::new();
    for entry in &plan.entry_points {
        let heading = EntryHeading::from_entry_point(entry);
        let angle = heading.angle();
        let facing = heading.opposite();

        match filter {
            AssetFilter::SeeAll => {
                for (k, category) in AssetCategory::ALL.into_iter().enumerate() {
                    if !is_deployable(category, plan) {
                        continue;
                    }
                    let radius = BASE_RADIUS_DEG + k as f64 * RADIUS_STEP_DEG;
                    markers.push(marker(incident, entry, category, radius, angle, &facing));
                }
            }
            AssetFilter::Only(category) => {
                if is_deployable(category, plan) {
                    markers.push(marker(
                        incident,
                        entry,
                        category,
                        BASE_RADIUS_DEG,
                        angle,
                        &facing,
                    ));
                }
            }
        }
    }
    markers
}

fn is_deployable(category: AssetCategory, plan: &StrategyPlan) -> bool {
    category != AssetCategory::Helicopter || plan.helicopter_deployed
}

fn marker(
    incident: Incident,
    entry: &str,
    category: AssetCategory,
    radius: f64,
    angle: f64,
    facing: &EntryHeading,
) -> AssetMarker {
    AssetMarker {
        coordinates: incident.offset(radius, angle),
        category,
        label: format!("{} - {}", category, entry),
        source_entry_point: entry.to_string(),
        facing: facing.clone(),
    }
}
