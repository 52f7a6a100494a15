//! Error types for the ticketing server

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Machine-readable error codes carried in the error envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    Conflict,
    Validation,
    Unauthorized,
    Forbidden,
    DbFailure,
    Internal,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::Authorization(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Reclassify a unique-key violation as `Conflict`, leaving other errors untouched
    pub fn on_unique_violation(self, message: &str) -> Self {
        match self {
            AppError::Database(ref e) if is_unique_violation(e) => AppError::Conflict(message.to_string()),
            other => other,
        }
    }

    /// Reclassify a foreign-key violation as `Conflict`
    pub fn on_foreign_key_violation(self, message: &str) -> Self {
        match self {
            AppError::Database(ref e) if is_foreign_key_violation(e) => {
                AppError::Conflict(message.to_string())
            }
            other => other,
        }
    }
}

/// True when the database rejected a write because of a unique constraint
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some("23505"),
        _ => false,
    }
}

/// True when a write referenced a missing row or deleted a referenced one
pub fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some("23503"),
        _ => false,
    }
}

/// Error details inside the response envelope
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

/// Error response body: `{"data": null, "errors": {...}}`
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub data: Option<String>,
    pub errors: ErrorBody,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (code, message) = match self {
            AppError::Authentication(msg) => (ErrorCode::Unauthorized, msg),
            AppError::Authorization(msg) => (ErrorCode::Forbidden, msg),
            AppError::NotFound(msg) => (ErrorCode::NotFound, msg),
            AppError::Validation(msg) | AppError::BadRequest(msg) => (ErrorCode::Validation, msg),
            AppError::Conflict(msg) => (ErrorCode::Conflict, msg),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (ErrorCode::DbFailure, "Database error".to_string())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (ErrorCode::Internal, "Internal server error".to_string())
            }
        };

        let body = Json(ErrorResponse {
            data: None,
            errors: ErrorBody { code, message },
        });

        (status, body).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::Validation("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Internal("x".into()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            AppError::Database(sqlx::Error::RowNotFound).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_unique_violation_passthrough() {
        let err = AppError::Database(sqlx::Error::PoolTimedOut).on_unique_violation("dup");
        assert!(matches!(err, AppError::Database(_)));

        let err = AppError::NotFound("gone".into()).on_unique_violation("dup");
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_error_envelope_shape() {
        let body = ErrorResponse {
            data: None,
            errors: ErrorBody {
                code: ErrorCode::NotFound,
                message: "Event 7 not found".to_string(),
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json["data"].is_null());
        assert_eq!(json["errors"]["code"], "NOT_FOUND");
        assert_eq!(json["errors"]["message"], "Event 7 not found");
    }
}
