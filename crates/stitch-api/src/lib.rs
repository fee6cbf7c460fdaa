//! Axum HTTP API for crochet yarn estimates.
//!
//! This crate provides:
//! - The estimation pipeline wiring detection, estimation and annotation
//! - Multipart upload handling and JSON error responses
//! - Security headers, request IDs and request logging
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorCategory, PipelineError, PipelineResult};
pub use routes::create_router;
pub use services::{ImageUpload, YarnPipeline};
pub use state::AppState;
