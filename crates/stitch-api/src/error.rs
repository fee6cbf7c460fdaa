//! API and pipeline error types.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use stitch_client::DetectError;
use stitch_media::MediaError;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;
pub type PipelineResult<T> = Result<T, PipelineError>;

const SERVICE_FAILURE_MESSAGE: &str =
    "The stitch detection service is currently unavailable. Please try again later.";
const INTERNAL_MESSAGE: &str = "An internal error occurred";

/// Coarse classification of a failed estimate, used for status codes and
/// metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The upload itself was the problem
    BadInput,
    /// The detection service failed
    ServiceFailure,
    Internal,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::BadInput => "bad_input",
            ErrorCategory::ServiceFailure => "service_failure",
            ErrorCategory::Internal => "internal",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCategory::BadInput => StatusCode::BAD_REQUEST,
            ErrorCategory::ServiceFailure => StatusCode::BAD_GATEWAY,
            ErrorCategory::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Everything that can end an estimate early.
///
/// The display text of the input-class variants is the exact message shown to
/// the user.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("No image uploaded")]
    MissingInput,

    #[error("Only PNG and JPG images are allowed")]
    UnsupportedFormat(String),

    #[error("Invalid or corrupted image file")]
    CorruptImage(#[source] MediaError),

    #[error("No stitches detected in the image. Please upload a clear image of your crochet work.")]
    NoStitchesDetected,

    #[error("Detection service error: {0}")]
    DetectionService(#[source] DetectError),

    #[error("Image processing failed: {0}")]
    ImageProcessing(#[source] MediaError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PipelineError::MissingInput
            | PipelineError::UnsupportedFormat(_)
            | PipelineError::CorruptImage(_)
            | PipelineError::NoStitchesDetected => ErrorCategory::BadInput,
            PipelineError::DetectionService(_) => ErrorCategory::ServiceFailure,
            PipelineError::ImageProcessing(_) | PipelineError::Internal(_) => {
                ErrorCategory::Internal
            }
        }
    }

    /// Message safe to show the caller. Service and internal failures never
    /// leak their detail.
    pub fn public_message(&self) -> String {
        match self.category() {
            ErrorCategory::BadInput => self.to_string(),
            ErrorCategory::ServiceFailure => SERVICE_FAILURE_MESSAGE.to_string(),
            ErrorCategory::Internal => INTERNAL_MESSAGE.to_string(),
        }
    }
}

impl From<DetectError> for PipelineError {
    fn from(err: DetectError) -> Self {
        if err.is_no_stitches() {
            PipelineError::NoStitchesDetected
        } else {
            PipelineError::DetectionService(err)
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl ApiError {
    /// Map a failure while reading the multipart body.
    pub fn from_multipart(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge(err.body_text())
        } else {
            Self::BadRequest(err.body_text())
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Pipeline(e) => e.category().status_code(),
        }
    }

    fn public_message(&self) -> String {
        match self {
            ApiError::BadRequest(_) | ApiError::PayloadTooLarge(_) => self.to_string(),
            ApiError::Pipeline(e) => e.public_message(),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.public_message(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
