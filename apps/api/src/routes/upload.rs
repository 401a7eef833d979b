//! Resume upload: turns an uploaded PDF into plain text the client can score.

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart,
    },
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;

const RESUME_FIELD: &str = "resume";
/// Request body limit for the upload route.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub text: String,
}

/// POST /upload/resume
///
/// Expects a multipart form with a `resume` file field ending in `.pdf`.
pub async fn handle_upload_resume(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, AppError> {
    let mut multipart = multipart.map_err(|e| AppError::Validation(e.body_text()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(multipart_error)?
    {
        if field.name() != Some(RESUME_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        if !is_pdf_name(&file_name) {
            return Err(AppError::Validation(
                "Please upload a valid PDF resume".to_string(),
            ));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(multipart_error)?;

        // pdf-extract is CPU-bound and synchronous
        let text = tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem(&bytes).map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .map_err(|e| AppError::UnprocessableEntity(format!("Could not read PDF: {e}")))?;

        info!(file_name = %file_name, chars = text.chars().count(), "Resume PDF parsed");
        return Ok(Json(UploadResponse { text }));
    }

    Err(AppError::Validation(format!(
        "Missing '{RESUME_FIELD}' file field"
    )))
}

fn multipart_error(error: MultipartError) -> AppError {
    AppError::from_body_status(error.status(), error.body_text())
}

fn is_pdf_name(file_name: &str) -> bool {
    file_name.to_lowercase().ends_with(".pdf")
}
