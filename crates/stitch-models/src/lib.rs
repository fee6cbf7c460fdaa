//! Shared data models for the stitch estimator.
//!
//! This crate provides Serde-serializable types for:
//! - Stitch detections as returned by the detection service
//! - Yarn usage and thickness lookup tables
//! - The yarn estimator and its ordered per-class tally
//! - The report handed back to the presentation layer

pub mod detection;
pub mod estimate;
pub mod report;
pub mod tables;

// Re-export common types
pub use detection::{first_seen_classes, Detection, PixelRect};
pub use estimate::{EstimationResult, StitchCount, StitchCounts, YarnEstimator};
pub use report::{round_to_tenth, YarnReport};
pub use tables::{
    StitchUsageTable, ThicknessMultiplierTable, DEFAULT_STITCH_CM, DEFAULT_THICKNESS,
    ERROR_MARGIN, FALLBACK_MULTIPLIER, STITCH_USAGE_CM, THICKNESS_MULTIPLIERS,
};
