use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::error::Error;
use std::fmt;

/// The primary error type for the application.
///
/// Consolidates all failures that can surface at the HTTP boundary. Every
/// variant renders as a `{"error": message}` JSON body; storage failures are
/// logged and replaced with a generic message so internals never leak.
#[derive(Debug)]
pub enum AppError {
    /// Internal server errors that the client cannot act on.
    Internal(anyhow::Error),
    /// Client errors due to invalid requests (malformed ids, empty bodies).
    BadRequest(String),
    /// A requested entry, attachment or route does not resolve.
    NotFound(String),
    /// Missing or mismatching shared secret.
    Unauthorized(String),
    /// An attachment payload above the configured size bound.
    PayloadTooLarge(String),
    /// Persistence layer failure.
    Database(String),
    /// The connection pool is exhausted or timed out.
    ServiceUnavailable(String),
    /// A specific request field failed validation.
    ValidationError {
        /// The name of the field that failed validation.
        field: String,
        /// A message describing the validation error.
        message: String,
    },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Internal(e) => write!(f, "Internal error: {}", e),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::PayloadTooLarge(msg) => write!(f, "Payload too large: {}", msg),
            AppError::Database(msg) => write!(f, "Database error: {}", msg),
            AppError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
            AppError::ValidationError { field, message } => {
                write!(f, "Validation error on field '{}': {}", field, message)
            }
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AppError::Internal(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "An internal server error occurred".to_string())
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            // The public interface reports oversize uploads as a plain 400.
            AppError::PayloadTooLarge(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Database(msg) => {
                tracing::error!("Database error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "A database error occurred".to_string())
            }
            AppError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::ValidationError { field, message } => {
                (StatusCode::BAD_REQUEST, format!("Validation failed for field '{}': {}", field, message))
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".to_string()),
            sqlx::Error::Database(db_err) => {
                AppError::Database(format!("Database error: {}", db_err.message()))
            }
            sqlx::Error::PoolTimedOut => {
                AppError::ServiceUnavailable("Database connection pool timed out".to_string())
            }
            _ => AppError::Database(format!("Database error: {}", err)),
        }
    }
}

/// A type alias for `Result<T, AppError>`, used throughout the application.
pub type AppResult<T> = Result<T, AppError>;

/// An extension trait for `Option` that provides a convenient way to convert
/// an `Option` to a `Result` with a `NotFound` error.
pub trait OptionExt<T> {
    /// Converts an `Option<T>` to `Ok(T)` or `Err(AppError::NotFound)`,
    /// naming the entity that was not found.
    fn ok_or_not_found(self, entity: &str) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, entity: &str) -> AppResult<T> {
        self.ok_or_else(|| AppError::NotFound(format!("{} not found", entity)))
    }
}

/// Helper functions for request validation.
pub mod validation {
    use super::*;

    /// Requires a field to be present and non-empty, returning its value.
    pub fn require_non_empty<'a>(value: Option<&'a str>, field: &str) -> AppResult<&'a str> {
        match value {
            Some(v) if !v.is_empty() => Ok(v),
            _ => Err(AppError::ValidationError {
                field: field.to_string(),
                message: "must be present and non-empty".to_string(),
            }),
        }
    }

    /// Requires a MIME content type to carry the expected prefix
    /// ("image/" or "audio/").
    pub fn require_content_type_prefix(content_type: &str, prefix: &str, field: &str) -> AppResult<()> {
        if content_type.starts_with(prefix) {
            Ok(())
        } else {
            Err(AppError::ValidationError {
                field: field.to_string(),
                message: format!("content type '{}' must start with '{}'", content_type, prefix),
            })
        }
    }
}
