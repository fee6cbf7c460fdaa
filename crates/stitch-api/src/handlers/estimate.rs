//! Yarn estimate handler.

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::Json;
use stitch_models::{YarnReport, DEFAULT_THICKNESS};
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::services::ImageUpload;
use crate::state::AppState;

/// Form field carrying the thickness category.
pub const THICKNESS_FIELD: &str = "thickness";
/// Form field carrying the image file.
pub const IMAGE_FIELD: &str = "image";

/// Estimate yarn for one uploaded image.
///
/// A request that is not a multipart form is treated like a form without an
/// image.
pub async fn estimate(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<YarnReport>> {
    let mut thickness: Option<String> = None;
    let mut upload: Option<ImageUpload> = None;

    match multipart {
        Ok(mut multipart) => {
            while let Some(field) = multipart
                .next_field()
                .await
                .map_err(ApiError::from_multipart)?
            {
                let name = field.name().map(str::to_owned);
                match name.as_deref() {
                    Some(THICKNESS_FIELD) => {
                        thickness = Some(field.text().await.map_err(ApiError::from_multipart)?);
                    }
                    Some(IMAGE_FIELD) => {
                        let filename = field.file_name().unwrap_or_default().to_string();
                        let bytes = field.bytes().await.map_err(ApiError::from_multipart)?;
                        upload = Some(ImageUpload::new(filename, bytes.to_vec()));
                    }
                    other => debug!(field = ?other, "Ignoring form field"),
                }
            }
        }
        Err(rejection) => debug!(reason = %rejection.body_text(), "Request is not a multipart form"),
    }

    let thickness = thickness.unwrap_or_else(|| DEFAULT_THICKNESS.to_string());
    let report = state.pipeline.process(upload, &thickness).await?;

    Ok(Json(report))
}
