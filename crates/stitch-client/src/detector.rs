//! Detector abstraction used by the estimation pipeline.

use async_trait::async_trait;
use stitch_models::Detection;

use crate::client::DetectionClient;
use crate::error::DetectResult;

/// Something that finds stitches in a JPEG.
///
/// Implementations return [`crate::DetectError::NoStitchesDetected`] rather
/// than an empty list.
#[async_trait]
pub trait StitchDetector: Send + Sync {
    async fn detect(&self, jpeg: &[u8]) -> DetectResult<Vec<Detection>>;
}

#[async_trait]
impl StitchDetector for DetectionClient {
    async fn detect(&self, jpeg: &[u8]) -> DetectResult<Vec<Detection>> {
        self.detect_stitches(jpeg).await
    }
}
