//! Yarn usage and thickness lookup tables.
//!
//! These are policy data rather than logic. The defaults are built from the
//! named constants below and are never mutated after construction, so a single
//! instance can be shared read-only across requests.

use std::collections::HashMap;

/// Centimeters of medium-thickness yarn consumed by one stitch, per class.
pub const STITCH_USAGE_CM: &[(&str, f64)] = &[
    ("sc", 1.2),   // single crochet
    ("dc", 2.0),   // double crochet
    ("hdc", 1.5),  // half double crochet
    ("tr", 3.0),   // treble crochet
    ("ch", 0.8),   // chain
    ("slst", 0.5), // slip stitch
    ("mr", 1.5),   // magic ring
];

/// Usage charged for a stitch class the table does not know.
pub const DEFAULT_STITCH_CM: f64 = 1.5;

/// Per-stitch usage multipliers by yarn thickness category.
pub const THICKNESS_MULTIPLIERS: &[(&str, f64)] = &[
    ("Thin", 0.8),
    ("Medium", 1.0),
    ("Thick", 1.3),
];

/// Multiplier for an unrecognized thickness category (same as Medium).
pub const FALLBACK_MULTIPLIER: f64 = 1.0;

/// Thickness assumed when the caller does not supply one.
pub const DEFAULT_THICKNESS: &str = "Medium";

/// Fixed symmetric margin applied to the final estimate.
pub const ERROR_MARGIN: f64 = 0.10;

// =============================================================================
// Stitch usage
// =============================================================================

/// Mapping from stitch class to centimeters of yarn per stitch.
#[derive(Debug, Clone)]
pub struct StitchUsageTable {
    usage_cm: HashMap<String, f64>,
    default_cm: f64,
}

impl StitchUsageTable {
    /// Build a table from explicit entries and a fallback for unknown classes.
    pub fn new<I, S>(entries: I, default_cm: f64) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            usage_cm: entries
                .into_iter()
                .map(|(class, cm)| (class.into(), cm))
                .collect(),
            default_cm,
        }
    }

    /// Centimeters for one stitch of `class_label`, or the default when unknown.
    pub fn usage_cm(&self, class_label: &str) -> f64 {
        self.usage_cm
            .get(class_label)
            .copied()
            .unwrap_or(self.default_cm)
    }
}

impl Default for StitchUsageTable {
    fn default() -> Self {
        Self::new(STITCH_USAGE_CM.iter().copied(), DEFAULT_STITCH_CM)
    }
}

// =============================================================================
// Thickness multipliers
// =============================================================================

/// Mapping from thickness category to a per-stitch multiplier.
///
/// Lookups are exact and case-sensitive; anything unrecognized is priced with
/// [`FALLBACK_MULTIPLIER`].
#[derive(Debug, Clone)]
pub struct ThicknessMultiplierTable {
    multipliers: HashMap<String, f64>,
}

impl ThicknessMultiplierTable {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            multipliers: entries
                .into_iter()
                .map(|(category, m)| (category.into(), m))
                .collect(),
        }
    }

    pub fn multiplier(&self, category: &str) -> f64 {
        self.multipliers
            .get(category)
            .copied()
            .unwrap_or(FALLBACK_MULTIPLIER)
    }
}

impl Default for ThicknessMultiplierTable {
    fn default() -> Self {
        Self::new(THICKNESS_MULTIPLIERS.iter().copied())
    }
}
