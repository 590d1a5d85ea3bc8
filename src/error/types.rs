use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::middleware::current_request_id;
use crate::services::llm_client::LlmError;

pub type AppResult<T> = Result<T, AppError>;

/// Message shown to the user for any failure on the provider side.
pub const GENERIC_UPSTREAM_MESSAGE: &str =
    "The model provider could not answer right now. Please try again in a moment.";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unsupported file type '{extension}' for {file_name}")]
    UnsupportedFileType { file_name: String, extension: String },

    #[error("File too large: {file_name} is {size} bytes, limit is {limit} bytes")]
    FileTooLarge { file_name: String, size: usize, limit: usize },

    #[error("Upload too large: combined files exceed the limit of {limit} bytes")]
    UploadTooLarge { limit: usize },

    #[error("Invalid file: {message}")]
    InvalidFile { message: String },

    #[error("Missing file in request")]
    MissingFile,

    #[error("No message or files provided")]
    EmptyRequest,

    #[error("Unknown model: {model}")]
    UnknownModel { model: String },

    #[error("Model provider request failed: {message}")]
    UpstreamError { message: String },

    #[error("Request timeout")]
    Timeout,

    #[error("Internal server error: {message}")]
    Internal { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

impl AppError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::UnsupportedFileType { .. } => "UNSUPPORTED_FILE_TYPE",
            AppError::FileTooLarge { .. } => "FILE_TOO_LARGE",
            AppError::UploadTooLarge { .. } => "UPLOAD_TOO_LARGE",
            AppError::InvalidFile { .. } => "INVALID_FILE",
            AppError::MissingFile => "MISSING_FILE",
            AppError::EmptyRequest => "EMPTY_REQUEST",
            AppError::UnknownModel { .. } => "UNKNOWN_MODEL",
            AppError::UpstreamError { .. } => "UPSTREAM_ERROR",
            AppError::Timeout => "REQUEST_TIMEOUT",
            AppError::Internal { .. } => "INTERNAL_ERROR",
            AppError::ValidationError { .. } => "VALIDATION_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::UnsupportedFileType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::UploadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::InvalidFile { .. } => StatusCode::BAD_REQUEST,
            AppError::MissingFile => StatusCode::BAD_REQUEST,
            AppError::EmptyRequest => StatusCode::BAD_REQUEST,
            AppError::UnknownModel { .. } => StatusCode::BAD_REQUEST,
            AppError::UpstreamError { .. } => StatusCode::BAD_GATEWAY,
            AppError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ValidationError { .. } => StatusCode::BAD_REQUEST,
        }
    }

    /// Text safe to show in the browser. Provider failures collapse into one
    /// generic message; everything else is already user-facing.
    pub fn user_message(&self) -> String {
        match self {
            AppError::UpstreamError { .. } | AppError::Timeout => GENERIC_UPSTREAM_MESSAGE.to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.user_message();
        let request_id = current_request_id();
        let timestamp = chrono::Utc::now().to_rfc3339();

        if status.is_server_error() {
            tracing::error!(
                error_code = error_code,
                status_code = %status,
                request_id = %request_id,
                error_message = %self,
                "API error occurred"
            );
        } else {
            tracing::warn!(
                error_code = error_code,
                status_code = %status,
                request_id = %request_id,
                error_message = %self,
                "Request rejected"
            );
        }

        let body = Json(json!({
            "success": false,
            "error": {
                "code": error_code,
                "message": message,
                "request_id": request_id,
                "timestamp": timestamp
            },
            "data": null
        }));

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal {
            message: format!("IO error: {}", err),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::ValidationError {
            message: format!("JSON parsing error: {}", err),
        }
    }
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Timeout => AppError::Timeout,
            other => AppError::UpstreamError {
                message: other.to_string(),
            },
        }
    }
}

impl AppError {
    /// Maps a multipart read failure; a body over `limit` becomes `UploadTooLarge`.
    pub fn from_multipart(err: MultipartError, limit: usize) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::UploadTooLarge { limit }
        } else {
            AppError::InvalidFile {
                message: format!("Failed to read multipart field: {}", err.body_text()),
            }
        }
    }
}
