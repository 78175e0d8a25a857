//! Terrain contour lookup around the incident.

use fireline_shared::contour::{self, ContourSettings};
use fireline_shared::models::{ElevationSelection, Incident};
use reqwest::Client;
use serde::Deserialize;

use crate::config::OverlayConfig;
use crate::error::{OverlayError, Result};

const TERRAIN_TILESET: &str = "mapbox.mapbox-terrain-v2";
const CONTOUR_LAYER: &str = "contour";

/// Elevation attributes tried in order.
const ELEVATION_KEYS: [&str; 3] = [contour::ELEVATION_PROPERTY, "elevation", "height"];

/// A contour line near the incident. Not every feature carries an elevation.
#[derive(Debug, Clone, PartialEq)]
pub struct ContourFeature {
    pub elevation: Option<f64>,
}

#[allow(async_fn_in_trait)]
pub trait TerrainSource {
    /// Contour features intersecting a small area around the incident, unordered.
    async fn contour_features(
        &self,
        incident: Incident,
        settings: &ContourSettings,
    ) -> Result<Vec<ContourFeature>>;
}

#[derive(Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct Feature {
    #[serde(default)]
    properties: serde_json::Map<String, serde_json::Value>,
}

impl From<Feature> for ContourFeature {
    fn from(f: Feature) -> Self {
        let elevation = ELEVATION_KEYS
            .iter()
            .find_map(|k| f.properties.get(*k).and_then(|v| v.as_f64()));
        ContourFeature { elevation }
    }
}

/// Mapbox Tilequery against the terrain tileset's contour layer.
pub struct MapboxTerrain {
    http: Client,
    config: OverlayConfig,
}

impl MapboxTerrain {
    pub fn new(config: &OverlayConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(http: Client, config: &OverlayConfig) -> Self {
        MapboxTerrain {
            http,
            config: config.clone(),
        }
    }
}

impl TerrainSource for MapboxTerrain {
    async fn contour_features(
        &self,
        incident: Incident,
        settings: &ContourSettings,
    ) -> Result<Vec<ContourFeature>> {
        let token = self.config.require_mapbox_token()?;
        let url = format!(
            "{}/v4/{}/tilequery/{},{}.json",
            self.config.mapbox_api_url.trim_end_matches('/'),
            TERRAIN_TILESET, incident.longitude, incident.latitude
        );
        let radius = settings.query_radius_m.to_string();
        let limit = settings.query_limit.to_string();

        let resp = self
            .http
            .get(&url)
            .query(&[
                ("layers", CONTOUR_LAYER),
                ("radius", radius.as_str()),
                ("limit", limit.as_str()),
                ("access_token", token),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(OverlayError::Status {
                service: "terrain tilequery",
                status: status.as_u16(),
                body,
            });
        }

        let collection: FeatureCollection = resp
            .json()
            .await
            .map_err(|e| OverlayError::Schema(format!("terrain body: {e}")))?;
        Ok(collection.features.into_iter().map(ContourFeature::from).collect())
    }
}

/// Query the terrain and pick the elevation band to highlight.
///
/// Query failures are logged and handled exactly like an empty result.
pub async fn select_contour<T: TerrainSource>(
    terrain: &T,
    incident: Incident,
    settings: &ContourSettings,
) -> ElevationSelection {
    let samples: Vec<f64> = match terrain.contour_features(incident, settings).await {
        Ok(features) => features.into_iter().filter_map(|f| f.elevation).collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Terrain query failed, using fallback contour band");
            Vec::new()
        }
    };
    let selection = contour::select_elevation(&samples, settings);
    tracing::info!(
        samples = samples.len(),
        elevation = selection.chosen_elevation,
        fallback = selection.fallback_used,
        "Selected contour elevation"
    );
    selection
}
