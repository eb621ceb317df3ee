//! Error types for checkin-server
//!
//! Business outcomes (unknown participant, invalid participant, already
//! checked in) are not errors; they are 200 responses with a message.

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::export::ExportError;
use crate::roster::ImportError;
use crate::store::StoreError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Multipart body could not be read (status chosen by axum, e.g. 413)
    #[error("Malformed upload: {0}")]
    Multipart(#[from] MultipartError),

    /// Upload of the wrong kind (415)
    #[error("Unsupported upload: {0}")]
    UnsupportedMedia(String),

    /// Roster could not be imported (500)
    #[error("Error processing file: {0}")]
    Import(#[from] ImportError),

    /// Spreadsheet could not be produced (500)
    #[error("Error exporting check-ins: {0}")]
    Export(#[from] ExportError),

    /// Participant document could not be written (500)
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// checkin-common error
    #[error("Common error: {0}")]
    Common(#[from] checkin_common::Error),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Multipart(e) => (e.status(), "BAD_UPLOAD"),
            ApiError::UnsupportedMedia(_) => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, "UNSUPPORTED_MEDIA_TYPE")
            }
            ApiError::Import(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IMPORT_FAILED"),
            ApiError::Export(_) => (StatusCode::INTERNAL_SERVER_ERROR, "EXPORT_FAILED"),
            ApiError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Common(checkin_common::Error::InvalidInput(_)) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST")
            }
            ApiError::Common(_) => (StatusCode::INTERNAL_SERVER_ERROR, "COMMON_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            error!("{}", self);
        }

        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
