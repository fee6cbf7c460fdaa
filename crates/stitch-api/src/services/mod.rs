//! Business logic services.

pub mod pipeline;

pub use pipeline::{ImageUpload, YarnPipeline, ALLOWED_EXTENSIONS};
