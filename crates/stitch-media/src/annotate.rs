//! Annotation renderer.
//!
//! Draws one class-colored outline and class label per detection onto a copy
//! of the source image. Colors are assigned by first-seen class order via
//! [`color_for`], so the same class always gets the same color within one
//! image.

use std::path::PathBuf;

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use stitch_models::{first_seen_classes, Detection};
use tracing::debug;

use crate::error::{MediaError, MediaResult};
use crate::font::LabelFont;
use crate::palette::color_for;

/// Configuration for the annotation renderer.
#[derive(Debug, Clone)]
pub struct AnnotationConfig {
    /// TrueType font for labels; `None` goes straight to the bitmap font
    pub font_path: Option<PathBuf>,
    /// Label font size in pixels
    pub font_size: f32,
    /// Distance of the label's top edge above the box's top edge
    pub label_offset: i32,
    /// Outline thickness in pixels, drawn inward from the box edge
    pub outline_width: u32,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            font_path: Some(PathBuf::from("arial.ttf")),
            font_size: 12.0,
            label_offset: 14,
            outline_width: 2,
        }
    }
}

impl AnnotationConfig {
    /// Create config from environment variables.
    ///
    /// `ANNOTATION_FONT_PATH` set to an empty string disables the TrueType
    /// attempt entirely.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            font_path: match std::env::var("ANNOTATION_FONT_PATH") {
                Ok(path) if path.trim().is_empty() => None,
                Ok(path) => Some(PathBuf::from(path)),
                Err(_) => defaults.font_path,
            },
            font_size: std::env::var("ANNOTATION_FONT_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.font_size),
            ..defaults
        }
    }
}

/// Draws detections onto images. Holds the loaded label font, so build it once
/// and share it.
#[derive(Debug)]
pub struct Annotator {
    font: LabelFont,
    label_offset: i32,
    outline_width: u32,
}

impl Annotator {
    pub fn new(config: &AnnotationConfig) -> Self {
        let font = LabelFont::load(config.font_path.as_deref(), config.font_size);
        debug!(
            scalable_font = font.is_scalable(),
            outline_width = config.outline_width,
            "Annotator ready"
        );
        Self {
            font,
            label_offset: config.label_offset,
            outline_width: config.outline_width,
        }
    }

    /// Return an annotated copy of `original`. The input is left untouched.
    ///
    /// Fails if any detection has non-finite geometry.
    pub fn annotate(&self, original: &RgbImage, detections: &[Detection]) -> MediaResult<RgbImage> {
        let mut canvas = original.clone();
        let classes = first_seen_classes(detections);

        for detection in detections {
            let index = classes
                .iter()
                .position(|c| *c == detection.class_label)
                .ok_or_else(|| {
                    MediaError::internal(format!(
                        "class '{}' missing from first-seen order",
                        detection.class_label
                    ))
                })?;
            let color = color_for(index).rgb;
            self.draw_detection(&mut canvas, detection, color)?;
        }

        debug!(
            detections = detections.len(),
            classes = classes.len(),
            "Annotated image"
        );

        Ok(canvas)
    }

    fn draw_detection(
        &self,
        canvas: &mut RgbImage,
        detection: &Detection,
        color: Rgb<u8>,
    ) -> MediaResult<()> {
        let bounds = detection.bounds();
        let edges = [bounds.left, bounds.top, bounds.right, bounds.bottom];
        if edges.iter().any(|v| !v.is_finite()) {
            return Err(MediaError::invalid_geometry(format!(
                "'{}' at ({}, {}) size {}x{}",
                detection.class_label,
                detection.center_x,
                detection.center_y,
                detection.width,
                detection.height
            )));
        }

        // Edges are pinned just far enough outside the canvas that every
        // inset of an off-canvas edge stays off-canvas too. Keeps all
        // arithmetic in i32 range.
        let (width, height) = (canvas.width() as f64, canvas.height() as f64);
        let margin = f64::from(self.outline_width) + 1.0;
        let left = bounds.left.round().clamp(-margin, width + margin) as i32;
        let right = bounds.right.round().clamp(-margin, width + margin) as i32;
        let top = bounds.top.round().clamp(-margin, height + margin) as i32;
        let bottom = bounds.bottom.round().clamp(-margin, height + margin) as i32;

        for inset in 0..self.outline_width as i32 {
            let w = right - left + 1 - 2 * inset;
            let h = bottom - top + 1 - 2 * inset;
            if w <= 0 || h <= 0 {
                break;
            }
            let rect = Rect::at(left + inset, top + inset).of_size(w as u32, h as u32);
            draw_hollow_rect_mut(canvas, rect, color);
        }

        let label_x = bounds.left.round().clamp(-width, width) as i32;
        let label_y = (bounds.top.round() - self.label_offset as f64).clamp(-height, height) as i32;
        self.font
            .draw(canvas, label_x, label_y, &detection.class_label, color);

        Ok(())
    }
}
