//! Upload decoding and transport encoding.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage};
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// JPEG quality used when normalizing uploads for detection.
pub const JPEG_QUALITY: u8 = 90;

/// Decode PNG or JPEG bytes and drop any alpha channel.
pub fn decode_rgb(bytes: &[u8]) -> MediaResult<RgbImage> {
    let decoded = image::load_from_memory(bytes).map_err(MediaError::Decode)?;
    debug!(
        width = decoded.width(),
        height = decoded.height(),
        color = ?decoded.color(),
        "Decoded upload"
    );
    Ok(decoded.to_rgb8())
}

/// Encode as baseline JPEG. `quality` is clamped to 1..=100.
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> MediaResult<Vec<u8>> {
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
        .encode_image(image)
        .map_err(|e| MediaError::encode("JPEG", e))?;
    Ok(buffer)
}

pub fn encode_png(image: &RgbImage) -> MediaResult<Vec<u8>> {
    let mut buffer = Vec::new();
    PngEncoder::new(&mut buffer)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| MediaError::encode("PNG", e))?;
    Ok(buffer)
}
