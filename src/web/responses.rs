//! Error-to-response mapping
//!
//! Every endpoint converts its [`AppError`] here, once, at the boundary.
//! JSON endpoints answer `{ok:false, error}`; the download endpoint answers
//! with plain text because its success body is binary.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::{error, warn};

use crate::errors::AppError;

/// Failure body shared by the JSON endpoints
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub ok: bool,
    pub error: String,
}

impl ErrorBody {
    pub fn new<S: Into<String>>(error: S) -> Self {
        Self {
            ok: false,
            error: error.into(),
        }
    }
}

/// Status and client-facing message for an error.
///
/// Network, configuration and internal details are logged, never returned.
pub fn error_status(error: &AppError) -> (StatusCode, String) {
    match error {
        AppError::InvalidInput { .. } => (StatusCode::BAD_REQUEST, error.to_string()),
        AppError::Upstream { .. } => (StatusCode::BAD_REQUEST, error.to_string()),
        AppError::NoMediaFound { message } => (StatusCode::OK, message.clone()),
        AppError::UnsupportedContentType { .. } => {
            (StatusCode::UNSUPPORTED_MEDIA_TYPE, error.to_string())
        }
        AppError::Network(e) => {
            warn!(error = %e, "Upstream request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to reach upstream".to_string(),
            )
        }
        AppError::Configuration { .. } | AppError::Internal { .. } => {
            error!(error = %error, "Request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    }
}

/// Convert an error from a JSON endpoint
pub fn handle_error(error: AppError) -> Response {
    let (status, message) = error_status(&error);
    (status, Json(ErrorBody::new(message))).into_response()
}

/// Convert an error from the download endpoint
pub fn handle_text_error(error: AppError) -> Response {
    let (status, message) = error_status(&error);
    (status, message).into_response()
}
