//! services/api/src/web/error.rs
//!
//! The error type returned by every request handler, and its mapping onto
//! HTTP status codes and the `{"detail": ...}` body the clients read.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use campus_safety_core::ports::PortError;
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

/// Errors surfaced to API clients.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed or out-of-domain input.
    #[error("{0}")]
    Validation(String),

    /// Missing, invalid or expired credentials.
    #[error("{0}")]
    Unauthenticated(String),

    /// The resource does not exist or is not owned by the caller.
    #[error("{0}")]
    NotFound(String),

    /// Duplicate registration or a second active record.
    #[error("{0}")]
    Conflict(String),

    /// Details are logged, never returned.
    #[error("Internal server error")]
    Internal(String),
}

/// The JSON body of every error response.
#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    pub detail: String,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Conflict(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Internal(details) = &self {
            error!("Internal error while handling request: {}", details);
        }
        let body = ErrorBody {
            detail: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

impl From<PortError> for AppError {
    fn from(err: PortError) -> Self {
        match err {
            // Store messages name internal ids; clients get a generic one per handler.
            PortError::NotFound(_) => AppError::NotFound("Not found".to_string()),
            PortError::Conflict(message) => AppError::Conflict(message),
            PortError::Unexpected(details) => AppError::Internal(details),
        }
    }
}

/// Maps a store "not found" to a handler-specific message, keeping other errors.
pub fn not_found_as(message: &'static str) -> impl Fn(PortError) -> AppError {
    move |err| match err {
        PortError::NotFound(_) => AppError::NotFound(message.to_string()),
        other => AppError::from(other),
    }
}
