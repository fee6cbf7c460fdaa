//! Serializable estimation report.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;

use crate::estimate::{EstimationResult, StitchCounts};

/// Round to one decimal place. Used only at the serialization boundary.
///
/// Rounds the exact binary value, so 4.05 (stored as 4.0499...) becomes 4.0.
/// Scaling by 10 first would round that product up to a tie.
pub fn round_to_tenth(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{value:.1}").parse().unwrap_or(value)
}

/// Final result of one estimation request, shaped for the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct YarnReport {
    /// Base64 of the normalized JPEG that was sent for detection
    pub original: String,
    /// Base64 of the annotated PNG
    pub processed: String,
    /// Thickness category as submitted
    pub thickness: String,
    pub stitch_counts: StitchCounts,
    pub base_yarn_estimate: f64,
    pub yarn_estimate: f64,
    pub yarn_range: [f64; 2],
}

impl YarnReport {
    /// Assemble a report, rounding every length to one decimal.
    pub fn new(
        original_jpeg: &[u8],
        processed_png: &[u8],
        thickness: impl Into<String>,
        estimate: EstimationResult,
    ) -> Self {
        let (low, high) = estimate.yarn_range;
        Self {
            original: STANDARD.encode(original_jpeg),
            processed: STANDARD.encode(processed_png),
            thickness: thickness.into(),
            stitch_counts: estimate.stitch_counts,
            base_yarn_estimate: round_to_tenth(estimate.base_yarn_cm),
            yarn_estimate: round_to_tenth(estimate.total_yarn_cm),
            yarn_range: [round_to_tenth(low), round_to_tenth(high)],
        }
    }
}
