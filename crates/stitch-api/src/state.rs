//! Application state.

use std::sync::Arc;

use stitch_client::{DetectError, DetectionClient, StitchDetector};
use stitch_media::{AnnotationConfig, Annotator};
use stitch_models::YarnEstimator;
use tracing::info;

use crate::config::ApiConfig;
use crate::services::YarnPipeline;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub pipeline: Arc<YarnPipeline>,
}

impl AppState {
    pub fn new(config: ApiConfig, pipeline: YarnPipeline) -> Self {
        Self {
            config,
            pipeline: Arc::new(pipeline),
        }
    }

    /// Build state from environment variables, connecting the pipeline to
    /// the hosted detection service.
    ///
    /// Fails when the detection service credentials are missing.
    pub fn from_env(config: ApiConfig) -> Result<Self, DetectError> {
        let client = DetectionClient::from_env()?;
        info!(
            endpoint = %client.config().endpoint(),
            timeout = ?client.config().timeout,
            "Detection client ready"
        );

        let detector: Arc<dyn StitchDetector> = Arc::new(client);
        let annotator = Annotator::new(&AnnotationConfig::from_env());
        let pipeline = YarnPipeline::new(detector, YarnEstimator::default(), annotator);

        Ok(Self::new(config, pipeline))
    }
}
