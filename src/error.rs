//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::token::AuthError;
use crate::upstream::UpstreamError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    // Server errors (5xx)
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    pub error_code: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            // 400 Bad Request
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg.clone()),

            // 404 Not Found
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),

            // 500 Internal Server Error; details stay in the logs
            AppError::Auth(e) => {
                tracing::error!("Upstream authentication error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "upstream_auth_error",
                    "Authentication with upstream failed".to_string(),
                )
            }
            AppError::Upstream(e) => {
                tracing::error!("Upstream error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "upstream_error",
                    "Upstream request failed".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error".to_string(),
                )
            }
        };

        let body = ErrorResponse {
            message,
            error_code: error_code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
