//! Client for the remote stitch detection service.
//!
//! The service is an opaque hosted classifier: it takes one JPEG and answers
//! with a list of predictions (class label, center, size, confidence). This
//! crate posts the image, enforces the request timeout and turns the response
//! into [`stitch_models::Detection`] values.
//!
//! [`StitchDetector`] is the seam the estimation pipeline depends on, so the
//! pipeline can run against something other than the HTTP client.

pub mod client;
pub mod detector;
pub mod error;
pub mod types;

pub use client::{DetectionClient, DetectionClientConfig};
pub use detector::StitchDetector;
pub use error::{DetectError, DetectResult};
pub use types::PredictionResponse;
