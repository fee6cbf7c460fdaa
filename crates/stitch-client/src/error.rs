//! Detection client error types.

use std::time::Duration;

use thiserror::Error;

pub type DetectResult<T> = Result<T, DetectError>;

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("Detection service API key not configured (set ROBOFLOW_API_KEY)")]
    MissingApiKey,

    #[error("Detection service returned {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("No stitches detected")]
    NoStitchesDetected,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DetectError {
    /// Build an error from a non-success HTTP status and response body.
    pub fn from_http_status(status: u16, body: impl Into<String>) -> Self {
        Self::RequestFailed {
            status,
            body: body.into(),
        }
    }

    /// The service answered fine but found nothing. This is an input-quality
    /// problem, not a service failure.
    pub fn is_no_stitches(&self) -> bool {
        matches!(self, DetectError::NoStitchesDetected)
    }

    /// HTTP status returned by the service, if it got that far.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            DetectError::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_http_status() {
        let err = DetectError::from_http_status(403, "forbidden");
        assert_eq!(err.http_status(), Some(403));
        assert!(!err.is_no_stitches());
        assert_eq!(err.to_string(), "Detection service returned 403: forbidden");
    }

    #[test]
    fn test_no_stitches() {
        assert!(DetectError::NoStitchesDetected.is_no_stitches());
        assert_eq!(DetectError::NoStitchesDetected.http_status(), None);
    }
}
