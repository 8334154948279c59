use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{error::AppError, AppState};

pub const UPLOAD_FIELD: &str = "spreadsheet";
pub const XLSX_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn routes(max_file_size: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/upload", post(upload_spreadsheet))
        .layer(DefaultBodyLimit::max(max_file_size + MULTIPART_OVERHEAD))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadAccepted {
    job_id: Uuid,
}

#[axum::debug_handler]
async fn upload_spreadsheet(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadAccepted>), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Malformed upload: {}", e)))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        validate_upload(&file_name, &content_type)?;

        let buffer = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidInput(format!("Failed to read upload: {}", e)))?;
        check_size(buffer.len(), state.config.max_file_size)?;

        tracing::info!("Received {} ({}KB)", file_name, buffer.len() / 1024);
        let job_id = state.queue.enqueue(file_name, buffer)?;

        return Ok((StatusCode::ACCEPTED, Json(UploadAccepted { job_id })));
    }

    Err(AppError::InvalidInput("No file uploaded".to_string()))
}

/// Only .xlsx uploads with the open-XML spreadsheet MIME type are accepted.
pub fn validate_upload(file_name: &str, content_type: &str) -> Result<(), AppError> {
    if content_type == XLSX_MIME_TYPE && file_name.ends_with(".xlsx") {
        Ok(())
    } else {
        tracing::warn!("Rejected upload {:?} with type {:?}", file_name, content_type);
        Err(AppError::InvalidInput(
            "Invalid file type. Only .xlsx files are allowed.".to_string(),
        ))
    }
}

fn check_size(len: usize, max_file_size: usize) -> Result<(), AppError> {
    if len > max_file_size {
        return Err(AppError::InvalidInput(format!(
            "File too large: {} bytes exceeds the {} byte limit",
            len, max_file_size
        )));
    }
    Ok(())
}
