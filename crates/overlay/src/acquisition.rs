//! Suppression plan acquisition.
//!
//! Two sequential calls: the planning backend produces a free-text report for the
//! incident, then the generative parsing service turns that report into a
//! [`DecisionRecord`]. Either step failing yields no record at all.

use fireline_shared::models::{DecisionRecord, Incident};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::OverlayConfig;
use crate::error::{OverlayError, Result};

/// Anything that can produce a decision record for an incident.
#[allow(async_fn_in_trait)]
pub trait PlanSource {
    /// At most one attempt. `None` covers every failure.
    async fn acquire(&self, incident: Incident) -> Option<DecisionRecord>;
}

#[derive(Debug, Serialize)]
struct PlanRequest {
    lon: f64,
    lat: f64,
}

/// Body returned by the planning backend.
#[derive(Debug, Clone, Deserialize)]
pub struct PlanReport {
    pub output: String,
}

// Gemini generateContent wire format

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<RequestContent>,
}

#[derive(Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

pub struct StrategyClient {
    http: Client,
    config: OverlayConfig,
}

impl StrategyClient {
    pub fn new(config: OverlayConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(http: Client, config: OverlayConfig) -> Self {
        StrategyClient { http, config }
    }

    /// POST the incident to the planning backend.
    pub async fn fetch_plan(&self, incident: Incident) -> Result<PlanReport> {
        let url = self.config.require_backend_url()?;
        tracing::info!(
            url,
            lon = incident.longitude,
            lat = incident.latitude,
            "Requesting suppression plan"
        );

        let resp = self
            .http
            .post(url)
            .json(&PlanRequest {
                lon: incident.longitude,
                lat: incident.latitude,
            })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(OverlayError::Status {
                service: "planning backend",
                status: status.as_u16(),
                body,
            });
        }

        let report: PlanReport = resp
            .json()
            .await
            .map_err(|e| OverlayError::Schema(format!("planning backend body: {e}")))?;
        tracing::debug!(chars = report.output.len(), "Received plan report");
        Ok(report)
    }

    /// Ask the parsing service to normalize a plan report into a decision record.
    pub async fn parse_plan(&self, report_text: &str) -> Result<DecisionRecord> {
        let key = self.config.require_gemini_key()?;
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.gemini_api_url.trim_end_matches('/'),
            self.config.gemini_model
        );

        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart {
                    text: build_parse_prompt(report_text),
                }],
            }],
        };

        let resp = self
            .http
            .post(&url)
            .query(&[("key", key)])
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(OverlayError::Status {
                service: "parsing service",
                status: status.as_u16(),
                body,
            });
        }

        let generated: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| OverlayError::Schema(format!("parsing service body: {e}")))?;
        let text = generated
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or_else(|| OverlayError::Schema("parsing service returned no text".into()))?;

        let record: DecisionRecord = serde_json::from_str(extract_json_block(&text))?;
        Ok(record)
    }

    /// Full pipeline. The parsing service is only called when the backend succeeded.
    pub async fn get_fire_suppression_data(&self, incident: Incident) -> Option<DecisionRecord> {
        // Both stages need their settings before anything goes on the wire.
        if let Err(e) = self
            .config
            .require_backend_url()
            .and(self.config.require_gemini_key())
        {
            tracing::warn!(error = %e, "Plan acquisition not configured");
            return None;
        }
        let report = match self.fetch_plan(incident).await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch suppression plan");
                return None;
            }
        };
        match self.parse_plan(&report.output).await {
            Ok(record) => {
                tracing::info!(
                    entry_points = record.strategy_data.entry_points.len(),
                    helicopter = record.strategy_data.helicopter_deployed,
                    "Parsed suppression plan"
                );
                Some(record)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to parse suppression plan");
                None
            }
        }
    }
}

impl PlanSource for StrategyClient {
    async fn acquire(&self, incident: Incident) -> Option<DecisionRecord> {
        self.get_fire_suppression_data(incident).await
    }
}

/// Return the body of the first ```` ```json ```` fence, or the whole text trimmed when
/// there is none.
pub fn extract_json_block(text: &str) -> &str {
    const FENCE: &str = "```json";
    if let Some(start) = text.find(FENCE) {
        let body = &text[start + FENCE.len()..];
        if let Some(end) = body.find("```") {
            return body[..end].trim();
        }
    }
    text.trim()
}

pub fn build_parse_prompt(report_text: &str) -> String {
    format!("{PARSE_PROMPT_HEAD}\n\n{report_text}\n\n{PARSE_PROMPT_SCHEMA}")
}

const PARSE_PROMPT_HEAD: &str =
    "Analyze the following wildfire suppression plan report and convert it into structured data:";

const PARSE_PROMPT_SCHEMA: &str = r#"Respond with JSON only, optionally inside a ```json fence, in exactly this shape:
{
  "strategyData": {
    "helicopterDeployed": boolean,
    "slope": number,
    "elevation": number,
    "windSpeed": number,
    "windDirection": number,
    "entryPoints": [string],
    "strategyText": string
  },
  "weatherData": {
    "windDirection": number,
    "windSpeed": number,
    "humidity": number
  }
}

Requirements:
1. slope is in degrees, elevation in meters, windSpeed in m/s, windDirection in compass degrees (0 = north).
2. Every entryPoints item starts with its compass direction, e.g. "East Point 1" or "Northwest Ridge".
3. strategyText is a detailed, professional English briefing covering the helicopter decision, terrain, entry points and wind analysis.
4. Use real numbers for numbers, true/false for booleans and plain text for strings."#;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Json, RawQuery};
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::Router;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const RECORD_JSON: &str = r#"{
  "strategyData": {
    "helicopterDeployed": true,
    "slope": 4.5,
    "elevation": 573.0,
    "windSpeed": 2.3,
    "windDirection": 180,
    "entryPoints": ["East Point 1", "West Point 2", "North Point 3"],
    "strategyText": "Enter from south to north."
  },
  "weatherData": { "windDirection": 180, "windSpeed": 2.3, "humidity": 32 }
}"#;

    async fn spawn(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn gemini_reply(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": text }] } }]
        })
    }

    fn config(backend: Option<String>, gemini: String) -> OverlayConfig {
        OverlayConfig {
            backend_url: backend,
            gemini_api_key: Some("test-key".to_string()),
            gemini_api_url: gemini,
            gemini_model: "gemini-test".to_string(),
            ..OverlayConfig::default()
        }
    }

    /// Fake parsing service that counts calls and replies with `reply`.
    async fn spawn_gemini(reply: String, calls: Arc<AtomicUsize>) -> String {
        let app = Router::new().fallback(move |RawQuery(q): RawQuery, Json(body): Json<serde_json::Value>| {
            let calls = calls.clone();
            let reply = reply.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                assert_eq!(q.as_deref(), Some("key=test-key"));
                let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap_or_default();
                assert!(prompt.contains("strategyData"));
                Json(gemini_reply(&reply))
            }
        });
        spawn(app).await
    }

    #[test]
    fn test_extract_fenced_block() {
        let text = "Here you go:\n```json\n{\"a\": 1}\n```\nDone.";
        assert_eq!(extract_json_block(text), "{\"a\": 1}");
    }

    #[test]
    fn test_extract_without_fence_returns_raw() {
        assert_eq!(extract_json_block("  {\"a\": 1}\n"), "{\"a\": 1}");
    }

    #[test]
    fn test_extract_unterminated_fence_returns_raw() {
        let text = "```json\n{\"a\": 1}";
        assert_eq!(extract_json_block(text), text);
    }

    #[test]
    fn test_prompt_embeds_report() {
        let prompt = build_parse_prompt("Slope 4.5 degrees, wind from south");
        assert!(prompt.contains("Slope 4.5 degrees, wind from south"));
        assert!(prompt.contains("\"helicopterDeployed\": boolean"));
        assert!(prompt.contains("\"humidity\": number"));
    }

    #[tokio::test]
    async fn test_end_to_end_with_fenced_reply() {
        let backend = Router::new().route(
            "/plan",
            post(|Json(body): Json<serde_json::Value>| async move {
                assert_eq!(body["lon"], 129.2);
                assert_eq!(body["lat"], 35.8);
                Json(serde_json::json!({ "output": "Slope 4.5, elevation 573 m" }))
            }),
        );
        let backend_url = format!("{}/plan", spawn(backend).await);
        let calls = Arc::new(AtomicUsize::new(0));
        let gemini_url =
            spawn_gemini(format!("```json\n{RECORD_JSON}\n```"), calls.clone()).await;

        let client = StrategyClient::new(config(Some(backend_url), gemini_url));
        let record = client
            .get_fire_suppression_data(Incident::new(129.2, 35.8))
            .await
            .expect("record");

        assert!(record.strategy_data.helicopter_deployed);
        assert_eq!(record.strategy_data.entry_points.len(), 3);
        assert_eq!(record.weather_data.humidity, Some(32.0));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unfenced_reply_is_parsed() {
        let backend = Router::new().route(
            "/plan",
            post(|| async { Json(serde_json::json!({ "output": "report" })) }),
        );
        let backend_url = format!("{}/plan", spawn(backend).await);
        let calls = Arc::new(AtomicUsize::new(0));
        let gemini_url = spawn_gemini(RECORD_JSON.to_string(), calls).await;

        let client = StrategyClient::new(config(Some(backend_url), gemini_url));
        assert!(client
            .get_fire_suppression_data(Incident::new(129.2, 35.8))
            .await
            .is_some());
    }

    #[tokio::test]
    async fn test_backend_failure_skips_parsing_service() {
        let backend = Router::new().route(
            "/plan",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let backend_url = format!("{}/plan", spawn(backend).await);
        let calls = Arc::new(AtomicUsize::new(0));
        let gemini_url = spawn_gemini(RECORD_JSON.to_string(), calls.clone()).await;

        let client = StrategyClient::new(config(Some(backend_url), gemini_url));
        let err = client.fetch_plan(Incident::new(129.2, 35.8)).await.unwrap_err();
        assert!(matches!(err, OverlayError::Status { status: 500, .. }));
        assert!(client
            .get_fire_suppression_data(Incident::new(129.2, 35.8))
            .await
            .is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_backend_wrong_shape_is_failure() {
        let backend = Router::new().route(
            "/plan",
            post(|| async { Json(serde_json::json!({ "result": "no output field" })) }),
        );
        let backend_url = format!("{}/plan", spawn(backend).await);
        let calls = Arc::new(AtomicUsize::new(0));
        let gemini_url = spawn_gemini(RECORD_JSON.to_string(), calls.clone()).await;

        let client = StrategyClient::new(config(Some(backend_url), gemini_url));
        assert!(client
            .get_fire_suppression_data(Incident::new(129.2, 35.8))
            .await
            .is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_backend_url_short_circuits() {
        let calls = Arc::new(AtomicUsize::new(0));
        let gemini_url = spawn_gemini(RECORD_JSON.to_string(), calls.clone()).await;
        let client = StrategyClient::new(config(None, gemini_url));

        let err = client.fetch_plan(Incident::new(129.2, 35.8)).await.unwrap_err();
        assert!(matches!(err, OverlayError::ConfigurationMissing(_)));
        assert!(client.acquire(Incident::new(129.2, 35.8)).await.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_gemini_key_skips_backend() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let backend = Router::new().route(
            "/plan",
            post(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Json(serde_json::json!({ "output": "report" }))
                }
            }),
        );
        let backend_url = format!("{}/plan", spawn(backend).await);
        let calls = Arc::new(AtomicUsize::new(0));
        let gemini_url = spawn_gemini(RECORD_JSON.to_string(), calls.clone()).await;

        let mut cfg = config(Some(backend_url), gemini_url);
        cfg.gemini_api_key = None;
        let client = StrategyClient::new(cfg);

        assert!(client
            .get_fire_suppression_data(Incident::new(129.2, 35.8))
            .await
            .is_none());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_fields_is_schema_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let partial = r#"```json
{ "strategyData": { "helicopterDeployed": true }, "weatherData": { "windSpeed": 1 } }
```"#;
        let gemini_url = spawn_gemini(partial.to_string(), calls).await;
        let client = StrategyClient::new(config(None, gemini_url));

        let err = client.parse_plan("report").await.unwrap_err();
        assert!(matches!(err, OverlayError::Schema(_)));
    }

    #[tokio::test]
    async fn test_parsing_service_error_status() {
        let app = Router::new().fallback(|| async { (StatusCode::TOO_MANY_REQUESTS, "quota") });
        let gemini_url = spawn(app).await;
        let client = StrategyClient::new(config(None, gemini_url));

        let err = client.parse_plan("report").await.unwrap_err();
        assert!(matches!(err, OverlayError::Status { status: 429, .. }));
    }

    #[tokio::test]
    async fn test_empty_candidates_is_schema_failure() {
        let app = Router::new()
            .fallback(|| async { Json(serde_json::json!({ "candidates": [] })) });
        let gemini_url = spawn(app).await;
        let client = StrategyClient::new(config(None, gemini_url));

        let err = client.parse_plan("report").await.unwrap_err();
        assert!(matches!(err, OverlayError::Schema(_)));
    }
}
