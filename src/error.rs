//! Application error type shared by the storage, service and HTTP layers.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Machine-readable error payload returned by the API.
#[derive(Debug, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

/// Errors surfaced by the link store and its callers.
///
/// `AlreadyExists` is an alternate success: the long URL was already shortened
/// and `existing` carries the token (or short URL, once the service has composed
/// it) of the active mapping.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Validation { message: String, details: Value },

    #[error("Link already exists: {existing}")]
    AlreadyExists { existing: String },

    #[error("{message}")]
    NotFound { message: String, details: Value },

    #[error("Link has been deleted: {token}")]
    Deleted { token: String },

    #[error("{message}")]
    Forbidden { message: String },

    #[error("{message}")]
    Conflict { message: String, details: Value },

    #[error("Storage backend unavailable: {message}")]
    BackendUnavailable { message: String },

    #[error("{message}")]
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }

    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }

    pub fn conflict(message: impl Into<String>, details: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    /// HTTP status code and stable error code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Validation { .. } => (StatusCode::BAD_REQUEST, "validation_error"),
            AppError::AlreadyExists { .. } => (StatusCode::CONFLICT, "already_exists"),
            AppError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Deleted { .. } => (StatusCode::GONE, "deleted"),
            AppError::Forbidden { .. } => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::Conflict { .. } => (StatusCode::CONFLICT, "conflict"),
            AppError::BackendUnavailable { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "backend_unavailable")
            }
            AppError::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }

    /// Converts the error into the serializable payload used in responses.
    pub fn to_error_info(&self) -> ErrorInfo {
        let (_, code) = self.status_and_code();
        let details = match self {
            AppError::Validation { details, .. }
            | AppError::NotFound { details, .. }
            | AppError::Conflict { details, .. }
            | AppError::Internal { details, .. } => details.clone(),
            AppError::AlreadyExists { existing } => json!({ "short_url": existing }),
            AppError::Deleted { token } => json!({ "token": token }),
            AppError::Forbidden { .. } | AppError::BackendUnavailable { .. } => json!({}),
        };

        ErrorInfo {
            code,
            message: self.to_string(),
            details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, _) = self.status_and_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = ErrorBody {
            error: self.to_error_info(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => AppError::unavailable(e.to_string()),
            other => {
                tracing::error!(error = %other, "Database error");
                AppError::internal("Database error", json!({}))
            }
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::bad_request("Validation failed", json!(e))
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::unavailable(format!("Storage file error: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::bad_request("bad", json!({})), StatusCode::BAD_REQUEST),
            (
                AppError::AlreadyExists {
                    existing: "abc".to_string(),
                },
                StatusCode::CONFLICT,
            ),
            (AppError::not_found("missing", json!({})), StatusCode::NOT_FOUND),
            (
                AppError::Deleted {
                    token: "abc".to_string(),
                },
                StatusCode::GONE,
            ),
            (AppError::forbidden("nope"), StatusCode::FORBIDDEN),
            (
                AppError::unavailable("down"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.status_and_code().0, status, "{err:?}");
        }
    }

    #[test]
    fn test_already_exists_info_carries_short_url() {
        let err = AppError::AlreadyExists {
            existing: "http://localhost:8080/abcdefghij".to_string(),
        };

        let info = err.to_error_info();
        assert_eq!(info.code, "already_exists");
        assert_eq!(
            info.details["short_url"],
            "http://localhost:8080/abcdefghij"
        );
    }

    #[test]
    fn test_pool_timeout_is_backend_unavailable() {
        let err: AppError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, AppError::BackendUnavailable { .. }));
    }

    #[test]
    fn test_row_not_found_is_internal() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, AppError::Internal { .. }));
    }
}
