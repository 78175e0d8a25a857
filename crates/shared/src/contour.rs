use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::models::ElevationSelection;

/// Elevation used when the terrain query finds no contour near the incident.
pub const FALLBACK_ELEVATION_M: f64 = 500.0;
pub const FALLBACK_BAND_LOW_M: f64 = 400.0;
pub const FALLBACK_BAND_HIGH_M: f64 = 600.0;

/// Contour highlight is hidden below this zoom level.
pub const CONTOUR_MIN_ZOOM: f64 = 12.0;

/// Attribute holding a contour line's elevation in the terrain tileset.
pub const ELEVATION_PROPERTY: &str = "ele";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContourSettings {
    pub min_zoom: f64,
    /// Search radius of the terrain query in meters.
    pub query_radius_m: f64,
    pub query_limit: u32,
    pub fallback_elevation: f64,
    pub fallback_low: f64,
    pub fallback_high: f64,
}

impl Default for ContourSettings {
    fn default() -> Self {
        ContourSettings {
            min_zoom: CONTOUR_MIN_ZOOM,
            query_radius_m: 100.0,
            query_limit: 50,
            fallback_elevation: FALLBACK_ELEVATION_M,
            fallback_low: FALLBACK_BAND_LOW_M,
            fallback_high: FALLBACK_BAND_HIGH_M,
        }
    }
}

/// Pick the elevation to highlight from the sampled contour elevations.
///
/// Near a peak the query returns nested rings; the fire is assumed to sit uphill, so
/// the highest ring wins. Empty input selects the fallback elevation.
pub fn select_elevation(samples: &[f64], settings: &ContourSettings) -> ElevationSelection {
    let mut elevations: Vec<f64> = samples.iter().copied().filter(|e| e.is_finite()).collect();
    elevations.sort_by(|a, b| b.total_cmp(a));
    match elevations.first() {
        Some(&max) => ElevationSelection {
            chosen_elevation: max,
            fallback_used: false,
        },
        None => ElevationSelection {
            chosen_elevation: settings.fallback_elevation,
            fallback_used: true,
        },
    }
}

/// Filter applied to the contour line and label layers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContourFilter {
    ElevationEquals(f64),
    ElevationBetween { low: f64, high: f64 },
}

impl ContourFilter {
    pub fn for_selection(selection: &ElevationSelection, settings: &ContourSettings) -> Self {
        if selection.fallback_used {
            ContourFilter::ElevationBetween {
                low: settings.fallback_low,
                high: settings.fallback_high,
            }
        } else {
            ContourFilter::ElevationEquals(selection.chosen_elevation)
        }
    }

    pub fn matches(&self, elevation: f64) -> bool {
        match *self {
            ContourFilter::ElevationEquals(e) => elevation == e,
            ContourFilter::ElevationBetween { low, high } => elevation >= low && elevation <= high,
        }
    }

    /// Mapbox style expression for this filter.
    pub fn to_expression(&self) -> serde_json::Value {
        let ele = json!(["get", ELEVATION_PROPERTY]);
        match *self {
            ContourFilter::ElevationEquals(e) => json!(["==", ele, e]),
            ContourFilter::ElevationBetween { low, high } => {
                json!(["all", [">=", ele, low], ["<=", ele, high]])
            }
        }
    }
}

impl std::fmt::Display for ContourFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContourFilter::ElevationEquals(e) => write!(f, "{e:.0} m contour"),
            ContourFilter::ElevationBetween { low, high } => {
                write!(f, "{low:.0}-{high:.0} m band")
            }
        }
    }
}

pub fn is_contour_visible(zoom: f64, settings: &ContourSettings) -> bool {
    zoom >= settings.min_zoom
}
