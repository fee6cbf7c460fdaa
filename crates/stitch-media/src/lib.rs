//! Image handling for the stitch estimator.
//!
//! This crate provides:
//! - Upload decoding and JPEG/PNG encoding
//! - The fixed class color palette
//! - Label fonts (TrueType with a built-in bitmap fallback)
//! - The annotation renderer that draws detections onto a copy of the image

pub mod annotate;
pub mod codec;
pub mod error;
pub mod font;
pub mod palette;

pub use annotate::{AnnotationConfig, Annotator};
pub use codec::{decode_rgb, encode_jpeg, encode_png, JPEG_QUALITY};
pub use error::{MediaError, MediaResult};
pub use font::LabelFont;
pub use palette::{color_for, PaletteColor, PALETTE};

/// The RGB raster type every stage works with.
pub use image::{Rgb, RgbImage};
