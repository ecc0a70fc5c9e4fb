//! # Error Types Module
//!
//! This module defines the error type returned at the HTTP boundary. Library
//! code propagates `anyhow::Error` with context; handlers convert into
//! [`AppError`], which knows its HTTP status and JSON shape.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

/// Errors surfaced to API clients
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Rejected input
    Validation(String),
    /// Missing user, recipe, item...
    NotFound(String),
    /// The resource exists but belongs to someone else
    Forbidden(String),
    /// A dependency is switched off or its circuit breaker is open
    Unavailable(String),
    /// An upstream service answered with an error or an unreadable reply
    Upstream(String),
    /// An upstream call did not finish in time
    Timeout(String),
    /// Anything else; the message is logged, never sent to clients
    Internal(String),
}

/// Result alias for request handlers
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::NotFound(_) => "not_found",
            AppError::Forbidden(_) => "forbidden",
            AppError::Unavailable(_) => "service_unavailable",
            AppError::Upstream(_) => "upstream_error",
            AppError::Timeout(_) => "timeout",
            AppError::Internal(_) => "internal_error",
        }
    }

    /// Message safe to show to clients
    pub fn public_message(&self) -> String {
        match self {
            AppError::Internal(_) => "Internal server error".to_string(),
            AppError::Validation(msg)
            | AppError::NotFound(msg)
            | AppError::Forbidden(msg)
            | AppError::Unavailable(msg)
            | AppError::Upstream(msg)
            | AppError::Timeout(msg) => msg.clone(),
        }
    }

    /// Whether retrying the same call later can succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AppError::Upstream(_) | AppError::Timeout(_) | AppError::Unavailable(_)
        )
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Validation(msg) => write!(f, "Validation error: {msg}"),
            AppError::NotFound(msg) => write!(f, "Not found: {msg}"),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {msg}"),
            AppError::Unavailable(msg) => write!(f, "Service unavailable: {msg}"),
            AppError::Upstream(msg) => write!(f, "Upstream error: {msg}"),
            AppError::Timeout(msg) => write!(f, "Timeout error: {msg}"),
            AppError::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        // Keep typed errors that were wrapped with context on the way up
        match err.downcast::<AppError>() {
            Ok(app_error) => app_error,
            Err(err) => AppError::Internal(format!("{err:#}")),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Internal(format!("Database error: {err}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(status = %status, error = %self, "Request failed");
        }

        let body = json!({
            "error": {
                "code": self.code(),
                "message": self.public_message(),
            }
        });

        (status, Json(body)).into_response()
    }
}
