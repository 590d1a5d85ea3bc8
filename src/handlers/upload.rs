use axum::{
    extract::{Multipart, State},
    response::Json,
};
use std::time::Instant;
use tracing::{debug, info, warn};

use super::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::current_request_id;
use crate::models::{ChatForm, UploadResponse, UploadedFile};

/// Validates and extracts the uploaded files without calling the provider.
/// The browser uses this to preview documents before asking a question.
pub async fn upload_handler(State(state): State<AppState>, multipart: Multipart) -> AppResult<Json<UploadResponse>> {
    let start = Instant::now();
    let request_id = current_request_id();

    info!(request_id = %request_id, "Starting upload request");

    let intake = state.intake();
    let form = read_form(multipart, intake.max_total_bytes()).await?;

    if form.files.is_empty() {
        warn!(request_id = %request_id, "Upload request carried no files");
        return Err(AppError::MissingFile);
    }

    let kinds = intake.validate_all(&form.files)?;
    let documents = state.extractor.extract_all(form.files, kinds).await;

    let total_time = start.elapsed().as_millis() as u64;
    info!(
        request_id = %request_id,
        documents = documents.len(),
        total_time_ms = total_time,
        "Upload request completed successfully"
    );

    Ok(Json(UploadResponse::new(&documents, total_time)))
}

/// Reads a multipart body into text fields and files. Any part carrying a
/// file name counts as a file; `message` and `model` are text fields and
/// everything else is ignored.
pub(crate) async fn read_form(mut multipart: Multipart, body_limit: usize) -> AppResult<ChatForm> {
    let mut form = ChatForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::from_multipart(e, body_limit))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        if let Some(file_name) = field.file_name().map(str::to_string) {
            if file_name.is_empty() {
                continue;
            }
            let content_type = field.content_type().map(|ct| ct.to_string());
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::from_multipart(e, body_limit))?;

            let mut file = UploadedFile::new(file_name, data);
            if let Some(mime_type) = content_type {
                file = file.with_mime_type(mime_type);
            }

            debug!(
                "Extracted file: {} ({} bytes, type: {:?})",
                file.name,
                file.size,
                file.mime_type
            );
            form.files.push(file);
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| AppError::from_multipart(e, body_limit))?;

        match field_name.as_str() {
            "message" => form.message = value,
            "model" => form.model = Some(value).filter(|m| !m.trim().is_empty()),
            other => debug!(field = other, "Ignoring unknown form field"),
        }
    }

    Ok(form)
}
