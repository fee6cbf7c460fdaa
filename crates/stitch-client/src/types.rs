//! Detection service response types.

use serde::{Deserialize, Serialize};
use stitch_models::Detection;

/// Response body from the detection endpoint.
///
/// Only `predictions` is required for estimation. A body without it is read as
/// an empty prediction list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    #[serde(default)]
    pub predictions: Vec<Detection>,
    /// Server-side inference time in seconds, when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
}
