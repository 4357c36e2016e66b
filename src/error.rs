//! Ranking service error types with HTTP status code mapping.
//!
//! [`RankingError`] is the central error type. Each variant maps to a
//! specific HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::LockName;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1001,
///     "message": "unknown lock name: rebuild-index"
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                    |
/// |-----------|-----------------|--------------------------------|
/// | 1000–1999 | Request         | 400 Bad Request                |
/// | 2000–2999 | State           | 404 Not Found / 503 Unavailable|
/// | 3000–3999 | Server          | 500 Internal Server Error      |
#[derive(Debug, thiserror::Error)]
pub enum RankingError {
    /// The lock name is not one of the known job locks.
    #[error("unknown lock name: {0}")]
    UnknownLock(String),

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The action surface only understands GET, POST and DELETE.
    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),

    /// A game named the same competitor as winner and loser.
    #[error("competitor cannot battle itself: {0}")]
    SelfPlay(String),

    /// No rating or game history exists for the competitor.
    #[error("competitor not found: {0}")]
    CompetitorNotFound(String),

    /// Another job already holds the named lock.
    #[error("failed to take out lock: {0}")]
    LockContended(LockName),

    /// The character catalog could not be loaded or is unusable.
    #[error("catalog error: {0}")]
    Catalog(String),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RankingError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::UnknownLock(_) => 1001,
            Self::InvalidRequest(_) => 1002,
            Self::UnsupportedMethod(_) => 1003,
            Self::SelfPlay(_) => 1004,
            Self::CompetitorNotFound(_) => 2001,
            Self::LockContended(_) => 2002,
            Self::Internal(_) => 3000,
            Self::Persistence(_) => 3001,
            Self::Catalog(_) => 3002,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::UnknownLock(_)
            | Self::InvalidRequest(_)
            | Self::UnsupportedMethod(_)
            | Self::SelfPlay(_) => StatusCode::BAD_REQUEST,
            Self::CompetitorNotFound(_) => StatusCode::NOT_FOUND,
            Self::LockContended(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Catalog(_) | Self::Persistence(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<sqlx::Error> for RankingError {
    fn from(err: sqlx::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl IntoResponse for RankingError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() && !matches!(self, Self::LockContended(_)) {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
