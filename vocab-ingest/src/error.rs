//! Error types for vocab-ingest
//!
//! Only `ValidationError` ever escapes a pipeline run. Collaborator failures
//! (`RemoteError`) are retried where appropriate and then recorded as data in
//! the run summary. `ApiError` maps everything onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failure reported by an external collaborator (store, translator, image
/// generator)
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    /// Connection could not be established or was reset
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded the collaborator timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Collaborator answered with a non-success HTTP status
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Backing store temporarily unavailable (locked, pool exhausted)
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Collaborator answered successfully but refused to produce a value
    #[error("Rejected: {0}")]
    Rejected(String),

    /// Response body could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// Permanent storage failure (constraint violation, corrupt row)
    #[error("Storage error: {0}")]
    Storage(String),
}

impl RemoteError {
    /// Transient failures are worth retrying: network, timeout, store
    /// contention, HTTP 5xx and 429. Everything else is permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            RemoteError::Network(_) | RemoteError::Timeout(_) | RemoteError::Unavailable(_) => {
                true
            }
            RemoteError::Status { status, .. } => *status >= 500 || *status == 429,
            RemoteError::Rejected(_) | RemoteError::Parse(_) | RemoteError::Storage(_) => false,
        }
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        RemoteError::Status {
            status,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RemoteError::Timeout(err.to_string())
        } else if let Some(status) = err.status() {
            RemoteError::status(status.as_u16(), err.to_string())
        } else if err.is_decode() {
            RemoteError::Parse(err.to_string())
        } else {
            RemoteError::Network(err.to_string())
        }
    }
}

impl From<sqlx::Error> for RemoteError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::PoolTimedOut => RemoteError::Unavailable(err.to_string()),
            sqlx::Error::Io(_) => RemoteError::Network(err.to_string()),
            sqlx::Error::Database(db_err)
                if db_err.message().contains("database is locked")
                    || db_err.message().contains("database is busy") =>
            {
                RemoteError::Unavailable(err.to_string())
            }
            _ => RemoteError::Storage(err.to_string()),
        }
    }
}

impl From<vocab_common::Error> for RemoteError {
    fn from(err: vocab_common::Error) -> Self {
        match err {
            vocab_common::Error::Database(db_err) => RemoteError::from(db_err),
            vocab_common::Error::Io(io_err) => RemoteError::Network(io_err.to_string()),
            other => RemoteError::Storage(other.to_string()),
        }
    }
}

/// Bulk add request rejected before any collaborator call
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("At least {min} words are required, got {count}")]
    TooFewWords { count: usize, min: usize },

    #[error("At most {max} words are allowed, got {count}")]
    TooManyWords { count: usize, max: usize },

    #[error("Unsupported card type for bulk add: {0}")]
    UnsupportedCardType(String),
}

/// Review tag could not be found or created
#[derive(Debug, Clone, Error)]
pub enum TagCreationError {
    #[error("Failed to list tags: {0}")]
    Lookup(RemoteError),

    #[error("Failed to create tag '{name}': {source}")]
    Create { name: String, source: RemoteError },
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Conflict (409) - e.g., backfill already running
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Upstream collaborator unavailable (503)
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Request rejected by the normalizer
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// vocab-common error
    #[error("Common error: {0}")]
    Common(#[from] vocab_common::Error),
}

impl From<RemoteError> for ApiError {
    fn from(err: RemoteError) -> Self {
        if err.is_transient() {
            ApiError::Unavailable(err.to_string())
        } else {
            ApiError::Internal(err.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::Unavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE", msg)
            }
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
            ApiError::Validation(ref err) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", err.to_string())
            }
            ApiError::Common(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "COMMON_ERROR",
                err.to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
