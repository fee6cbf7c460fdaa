//! Detection service HTTP client.

use std::time::{Duration, Instant};

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use stitch_models::Detection;
use tracing::{debug, info, warn};

use crate::error::{DetectError, DetectResult};
use crate::types::PredictionResponse;

const DEFAULT_BASE_URL: &str = "https://detect.roboflow.com";
const DEFAULT_MODEL: &str = "crochet-stitch-detector";
const DEFAULT_VERSION: &str = "9";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Configuration for the detection client.
#[derive(Clone)]
pub struct DetectionClientConfig {
    /// Base URL of the detection service
    pub base_url: String,
    /// Credential sent as the `api_key` query parameter
    pub api_key: String,
    /// Model identifier
    pub model: String,
    /// Model version
    pub version: String,
    /// Request timeout
    pub timeout: Duration,
}

// The API key stays out of Debug output so configs can be logged.
impl std::fmt::Debug for DetectionClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectionClientConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("version", &self.version)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for DetectionClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            version: DEFAULT_VERSION.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl DetectionClientConfig {
    /// Create config from environment variables.
    ///
    /// `ROBOFLOW_API_KEY` is required; everything else has a default.
    pub fn from_env() -> DetectResult<Self> {
        let api_key = std::env::var("ROBOFLOW_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(DetectError::MissingApiKey)?;

        Ok(Self {
            base_url: std::env::var("ROBOFLOW_API_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            api_key,
            model: std::env::var("ROBOFLOW_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            version: std::env::var("ROBOFLOW_VERSION")
                .unwrap_or_else(|_| DEFAULT_VERSION.to_string()),
            timeout: Duration::from_secs(
                std::env::var("DETECTION_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
        })
    }

    /// Endpoint URL without credentials.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.model,
            self.version
        )
    }
}

/// Client for the hosted stitch detection model.
///
/// One request per call, no retries. A slow or failing service surfaces as an
/// error for the caller to report.
pub struct DetectionClient {
    http: Client,
    config: DetectionClientConfig,
}

impl DetectionClient {
    /// Create a new detection client.
    pub fn new(config: DetectionClientConfig) -> DetectResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(DetectError::MissingApiKey);
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(DetectError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> DetectResult<Self> {
        Self::new(DetectionClientConfig::from_env()?)
    }

    pub fn config(&self) -> &DetectionClientConfig {
        &self.config
    }

    /// Send one JPEG to the detection service and return its predictions.
    ///
    /// An empty prediction list is reported as
    /// [`DetectError::NoStitchesDetected`].
    pub async fn detect_stitches(&self, jpeg: &[u8]) -> DetectResult<Vec<Detection>> {
        let url = self.config.endpoint();
        let started = Instant::now();

        debug!(url = %url, bytes = jpeg.len(), "Sending detection request");

        let part = Part::bytes(jpeg.to_vec())
            .file_name("image.jpg")
            .mime_str("image/jpeg")
            .map_err(DetectError::Network)?;
        let form = Form::new().part("file", part);

        let response = self
            .http
            .post(&url)
            .query(&[("api_key", self.config.api_key.as_str())])
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Detection service returned an error");
            return Err(DetectError::from_http_status(status.as_u16(), body));
        }

        let body = response.text().await.map_err(|e| self.map_send_error(e))?;
        if body.trim().is_empty() {
            return Err(DetectError::InvalidResponse("empty response body".to_string()));
        }
        let parsed: PredictionResponse = serde_json::from_str(&body)?;

        if parsed.predictions.is_empty() {
            info!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Detection service found no stitches"
            );
            return Err(DetectError::NoStitchesDetected);
        }

        info!(
            predictions = parsed.predictions.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Detection complete"
        );

        Ok(parsed.predictions)
    }

    fn map_send_error(&self, e: reqwest::Error) -> DetectError {
        if e.is_timeout() {
            warn!(timeout = ?self.config.timeout, "Detection request timed out");
            DetectError::Timeout(self.config.timeout)
        } else {
            // reqwest includes the URL in its message; strip it so the key
            // never reaches logs or error strings.
            DetectError::Network(e.without_url())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = DetectionClientConfig::default();
        assert_eq!(config.base_url, "https://detect.roboflow.com");
        assert_eq!(config.model, "crochet-stitch-detector");
        assert_eq!(config.version, "9");
        assert_eq!(config.timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_endpoint_has_no_credentials() {
        let config = DetectionClientConfig {
            base_url: "http://localhost:9000/".to_string(),
            api_key: "secret".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.endpoint(),
            "http://localhost:9000/crochet-stitch-detector/9"
        );
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = DetectionClientConfig {
            api_key: "secret".to_string(),
            ..Default::default()
        };
        assert!(!format!("{config:?}").contains("secret"));
    }

    #[test]
    fn test_new_requires_api_key() {
        let err = DetectionClient::new(DetectionClientConfig::default()).err();
        assert!(matches!(err, Some(DetectError::MissingApiKey)));
    }
}
