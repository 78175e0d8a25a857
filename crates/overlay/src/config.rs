use fireline_shared::contour::ContourSettings;

use crate::error::{OverlayError, Result};

pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash-latest";
pub const DEFAULT_MAPBOX_API_URL: &str = "https://api.mapbox.com";

/// Runtime settings for the overlay's external services.
///
/// Every value is optional at load time. Only plan acquisition refuses to run without
/// its endpoint and credential; terrain and geocoding degrade to fallbacks.
#[derive(Debug, Clone, Default)]
pub struct OverlayConfig {
    pub backend_url: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_api_url: String,
    pub gemini_model: String,
    pub mapbox_token: Option<String>,
    pub mapbox_api_url: String,
    pub contour: ContourSettings,
}

impl OverlayConfig {
    /// Read settings from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        OverlayConfig {
            backend_url: get("BACKEND_API_URL"),
            gemini_api_key: get("GOOGLE_API_KEY"),
            gemini_api_url: get("GEMINI_API_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_API_URL.to_string()),
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            mapbox_token: get("MAPBOX_TOKEN"),
            mapbox_api_url: get("MAPBOX_API_URL")
                .unwrap_or_else(|| DEFAULT_MAPBOX_API_URL.to_string()),
            contour: ContourSettings::default(),
        }
    }

    pub fn require_backend_url(&self) -> Result<&str> {
        self.backend_url
            .as_deref()
            .ok_or(OverlayError::ConfigurationMissing("BACKEND_API_URL"))
    }

    pub fn require_gemini_key(&self) -> Result<&str> {
        self.gemini_api_key
            .as_deref()
            .ok_or(OverlayError::ConfigurationMissing("GOOGLE_API_KEY"))
    }

    pub fn require_mapbox_token(&self) -> Result<&str> {
        self.mapbox_token
            .as_deref()
            .ok_or(OverlayError::ConfigurationMissing("MAPBOX_TOKEN"))
    }
}
