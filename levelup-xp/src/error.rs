//! Error types for levelup-xp
//!
//! Module-specific errors using thiserror, mapped onto HTTP status codes at
//! the API boundary.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Main error type for levelup-xp
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Level or session catalog failure
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// Rejected request value (e.g. non-positive fixed XP)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Unknown audio trigger type
    #[error("Invalid trigger type: {0}")]
    InvalidTrigger(String),

    /// Stop requested with no live session running
    #[error("No active session")]
    NoActiveSession,

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Shared library errors
    #[error(transparent)]
    Common(#[from] levelup_common::Error),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using levelup-xp Error
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidInput(_) | Error::InvalidTrigger(_) => StatusCode::BAD_REQUEST,
            Error::NoActiveSession => StatusCode::CONFLICT,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Common(levelup_common::Error::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            Error::Common(levelup_common::Error::NotFound(_)) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
