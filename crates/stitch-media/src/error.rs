//! Error types for image operations.

use thiserror::Error;

/// Result type for image operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while decoding, drawing or encoding images.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Failed to encode image as {format}: {source}")]
    Encode {
        format: &'static str,
        #[source]
        source: image::ImageError,
    },

    #[error("Invalid detection geometry: {0}")]
    InvalidGeometry(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    pub fn encode(format: &'static str, source: image::ImageError) -> Self {
        Self::Encode { format, source }
    }

    pub fn invalid_geometry(message: impl Into<String>) -> Self {
        Self::InvalidGeometry(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// True when the input bytes themselves were the problem.
    pub fn is_decode(&self) -> bool {
        matches!(self, MediaError::Decode(_))
    }
}
