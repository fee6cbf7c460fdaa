//! Stitch detections reported by the remote classifier.

use serde::{Deserialize, Serialize};

/// One recognized stitch instance.
///
/// Field names on the wire follow the detection service's prediction records
/// (`class`, `x`, `y`, `width`, `height`, `confidence`). Coordinates are in
/// pixels of the image that was sent for detection, with `x`/`y` being the
/// box center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Stitch class label (e.g. `sc`, `dc`), possibly one we have no usage for
    #[serde(rename = "class")]
    pub class_label: String,
    /// Box center, horizontal
    #[serde(rename = "x")]
    pub center_x: f64,
    /// Box center, vertical
    #[serde(rename = "y")]
    pub center_y: f64,
    /// Box width
    pub width: f64,
    /// Box height
    pub height: f64,
    /// Classifier confidence. Carried through but not used for estimation.
    #[serde(default)]
    pub confidence: f64,
}

impl Detection {
    /// Create a detection with full confidence.
    pub fn new(
        class_label: impl Into<String>,
        center_x: f64,
        center_y: f64,
        width: f64,
        height: f64,
    ) -> Self {
        Self {
            class_label: class_label.into(),
            center_x,
            center_y,
            width,
            height,
            confidence: 1.0,
        }
    }

    /// Convert center + size into edge coordinates.
    pub fn bounds(&self) -> PixelRect {
        let half_w = self.width / 2.0;
        let half_h = self.height / 2.0;
        PixelRect {
            left: self.center_x - half_w,
            top: self.center_y - half_h,
            right: self.center_x + half_w,
            bottom: self.center_y + half_h,
        }
    }
}

/// Axis-aligned rectangle in source pixel space, given by its edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

/// Distinct class labels in the order they first appear.
///
/// The position of a label in this list is its first-seen index, which drives
/// both report ordering and annotation color assignment.
pub fn first_seen_classes(detections: &[Detection]) -> Vec<&str> {
    let mut classes: Vec<&str> = Vec::new();
    for detection in detections {
        let label = detection.class_label.as_str();
        if !classes.contains(&label) {
            classes.push(label);
        }
    }
    classes
}
