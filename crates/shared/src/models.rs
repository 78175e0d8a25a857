use serde::{Deserialize, Serialize};

use crate::compass::EntryHeading;

/// The fixed point of the active fire for the session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub longitude: f64,
    pub latitude: f64,
}

impl Incident {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Incident { longitude, latitude }
    }

    /// Offset from the incident by `radius` degrees of arc along a compass bearing.
    /// Local planar approximation, fine at a few hundred meters.
    pub fn offset(&self, radius: f64, bearing_deg: f64) -> Coordinates {
        let rad = bearing_deg.to_radians();
        Coordinates {
            longitude: self.longitude + radius * rad.sin(),
            latitude: self.latitude + radius * rad.cos(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub longitude: f64,
    pub latitude: f64,
}

/// Structured suppression decision parsed from the planning backend's free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyPlan {
    pub helicopter_deployed: bool,
    /// Terrain slope in degrees.
    pub slope: f64,
    /// Elevation in meters.
    pub elevation: f64,
    /// Wind speed in m/s.
    pub wind_speed: f64,
    /// Compass degrees, 0 = north.
    pub wind_direction: f64,
    pub entry_points: Vec<String>,
    pub strategy_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSnapshot {
    pub wind_direction: f64,
    pub wind_speed: f64,
    #[serde(default)]
    pub humidity: Option<f64>,
}

/// Plan and weather as returned together by one acquisition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRecord {
    pub strategy_data: StrategyPlan,
    pub weather_data: WeatherSnapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetCategory {
    Firefighter,
    Helicopter,
    Fireengine,
}

impl AssetCategory {
    /// Fixed order used for radius staggering under `SeeAll`.
    pub const ALL: [AssetCategory; 3] = [
        AssetCategory::Firefighter,
        AssetCategory::Helicopter,
        AssetCategory::Fireengine,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            AssetCategory::Firefighter => "firefighter",
            AssetCategory::Helicopter => "helicopter",
            AssetCategory::Fireengine => "fireengine",
        }
    }

    pub fn from_slug(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.slug().eq_ignore_ascii_case(s.trim()))
    }
}

impl std::fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetCategory::Firefighter => write!(f, "Firefighter"),
            AssetCategory::Helicopter => write!(f, "Helicopter"),
            AssetCategory::Fireengine => write!(f, "Fire Engine"),
        }
    }
}

/// Which asset categories are shown on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AssetFilter {
    #[default]
    SeeAll,
    Only(AssetCategory),
}

impl AssetFilter {
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all")
            || s.eq_ignore_ascii_case("see_all")
            || s.eq_ignore_ascii_case("see-all")
        {
            return Some(AssetFilter::SeeAll);
        }
        AssetCategory::from_slug(s).map(AssetFilter::Only)
    }
}

/// A placed deployment marker. `facing` is the direction the icon points, i.e. the
/// opposite of the entry side, so the icon looks into the fire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetMarker {
    pub coordinates: Coordinates,
    pub category: AssetCategory,
    pub label: String,
    pub source_entry_point: String,
    pub facing: EntryHeading,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElevationSelection {
    pub chosen_elevation: f64,
    pub fallback_used: bool,
}

/// Header badge for the helicopter decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HelicopterStatus {
    Loading,
    Necessary,
    Unnecessary,
}

impl HelicopterStatus {
    pub fn from_plan(plan: Option<&StrategyPlan>) -> Self {
        match plan {
            None => HelicopterStatus::Loading,
            Some(p) if p.helicopter_deployed => HelicopterStatus::Necessary,
            Some(_) => HelicopterStatus::Unnecessary,
        }
    }
}

impl std::fmt::Display for HelicopterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HelicopterStatus::Loading => write!(f, "Loading..."),
            HelicopterStatus::Necessary => write!(f, "Necessary"),
            HelicopterStatus::Unnecessary => write!(f, "Unnecessary"),
        }
    }
}
