use fireline_shared::format::ADDRESS_PLACEHOLDER;
use fireline_shared::models::Incident;
use reqwest::Client;
use serde::Deserialize;

use crate::config::OverlayConfig;
use crate::error::{OverlayError, Result};

#[allow(async_fn_in_trait)]
pub trait AddressSource {
    async fn reverse_geocode(&self, incident: Incident) -> Result<String>;
}

#[derive(Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    features: Vec<Place>,
}

#[derive(Deserialize)]
struct Place {
    place_name: String,
}

/// Mapbox Geocoding v5 reverse lookup.
pub struct MapboxGeocoder {
    http: Client,
    config: OverlayConfig,
}

impl MapboxGeocoder {
    pub fn new(config: &OverlayConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(http: Client, config: &OverlayConfig) -> Self {
        MapboxGeocoder {
            http,
            config: config.clone(),
        }
    }
}

impl AddressSource for MapboxGeocoder {
    async fn reverse_geocode(&self, incident: Incident) -> Result<String> {
        let token = self.config.require_mapbox_token()?;
        let url = format!(
            "{}/geocoding/v5/mapbox.places/{},{}.json",
            self.config.mapbox_api_url.trim_end_matches('/'),
            incident.longitude,
            incident.latitude
        );
        let resp = self
            .http
            .get(&url)
            .query(&[("access_token", token)])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(OverlayError::Status {
                service: "geocoding",
                status: status.as_u16(),
                body,
            });
        }

        let geo: GeocodingResponse = resp
            .json()
            .await
            .map_err(|e| OverlayError::Schema(format!("geocoding body: {e}")))?;
        geo.features
            .into_iter()
            .next()
            .map(|p| p.place_name)
            .ok_or_else(|| OverlayError::Schema("no place found".into()))
    }
}

/// Display address for the incident, or the placeholder on any failure.
pub async fn resolve_address<A: AddressSource>(source: &A, incident: Incident) -> String {
    match source.reverse_geocode(incident).await {
        Ok(address) => address,
        Err(e) => {
            tracing::warn!(error = %e, "Reverse geocoding failed");
            ADDRESS_PLACEHOLDER.to_string()
        }
    }
}
