//! Yarn length estimation from stitch detections.
//!
//! The estimator is a pure function over a detection list and a thickness
//! category:
//!
//! 1. Every detection contributes its class usage (or the default) to the
//!    base length and bumps its class count.
//! 2. The base length is scaled by the thickness multiplier.
//! 3. A fixed symmetric margin produces the low/high range.
//!
//! Everything is kept at full precision here. Rounding happens only when a
//! [`crate::YarnReport`] is built.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::detection::Detection;
use crate::tables::{StitchUsageTable, ThicknessMultiplierTable, ERROR_MARGIN};

// =============================================================================
// Ordered stitch tally
// =============================================================================

/// Count for one stitch class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StitchCount {
    pub class_label: String,
    pub count: u32,
}

/// Per-class stitch counts in first-seen order.
///
/// Serializes as a JSON object whose keys keep that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StitchCounts(Vec<StitchCount>);

impl StitchCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the count for `class_label`, appending it if unseen.
    pub fn record(&mut self, class_label: &str) {
        match self.0.iter_mut().find(|c| c.class_label == class_label) {
            Some(entry) => entry.count += 1,
            None => self.0.push(StitchCount {
                class_label: class_label.to_string(),
                count: 1,
            }),
        }
    }

    pub fn get(&self, class_label: &str) -> Option<u32> {
        self.0
            .iter()
            .find(|c| c.class_label == class_label)
            .map(|c| c.count)
    }

    /// Total number of stitches across all classes.
    pub fn total(&self) -> u32 {
        self.0.iter().map(|c| c.count).sum()
    }
}

impl Serialize for StitchCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for entry in &self.0 {
            map.serialize_entry(&entry.class_label, &entry.count)?;
        }
        map.end()
    }
}

// =============================================================================
// Estimation
// =============================================================================

/// Unrounded estimate for one detection list.
#[derive(Debug, Clone, PartialEq)]
pub struct EstimationResult {
    pub stitch_counts: StitchCounts,
    /// Sum of per-stitch usage before thickness adjustment, in cm
    pub base_yarn_cm: f64,
    /// Thickness multiplier that was applied
    pub multiplier: f64,
    /// `base_yarn_cm * multiplier`
    pub total_yarn_cm: f64,
    /// `[total * (1 - margin), total * (1 + margin)]`
    pub yarn_range: (f64, f64),
}

impl EstimationResult {
    pub fn total_stitches(&self) -> u32 {
        self.stitch_counts.total()
    }
}

/// Converts stitch detections into a yarn length estimate.
#[derive(Debug, Clone)]
pub struct YarnEstimator {
    usage: StitchUsageTable,
    thickness: ThicknessMultiplierTable,
}

impl Default for YarnEstimator {
    fn default() -> Self {
        Self::new(
            StitchUsageTable::default(),
            ThicknessMultiplierTable::default(),
        )
    }
}

impl YarnEstimator {
    pub fn new(usage: StitchUsageTable, thickness: ThicknessMultiplierTable) -> Self {
        Self { usage, thickness }
    }

    /// Estimate yarn consumption for `detections` at `thickness_category`.
    ///
    /// An empty list yields zeros; callers reject that case before getting here.
    pub fn estimate(&self, detections: &[Detection], thickness_category: &str) -> EstimationResult {
        let mut stitch_counts = StitchCounts::new();
        let mut base_yarn_cm = 0.0;

        for detection in detections {
            stitch_counts.record(&detection.class_label);
            base_yarn_cm += self.usage.usage_cm(&detection.class_label);
        }

        let multiplier = self.thickness.multiplier(thickness_category);
        let total_yarn_cm = base_yarn_cm * multiplier;
        let yarn_range = (
            total_yarn_cm * (1.0 - ERROR_MARGIN),
            total_yarn_cm * (1.0 + ERROR_MARGIN),
        );

        EstimationResult {
            stitch_counts,
            base_yarn_cm,
            multiplier,
            total_yarn_cm,
            yarn_range,
        }
    }
}
