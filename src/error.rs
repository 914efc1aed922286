//! Application error type and JSON error responses.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

/// Exact wire strings for response bodies. Centralized so handlers,
/// middleware and tests agree on them byte-for-byte.
pub mod msg {
    // Webhook outcomes
    pub const INVALID_JSON: &str = "invalid json data";
    pub const TRANSACTION_EXISTS: &str = "transaction already exists";
    pub const INVALID_USER_ID: &str = "invalid user id";
    pub const SERVER_ERROR: &str = "unexpected server error";

    // Authentication
    pub const UNAUTHORIZED: &str = "you are unauthorized";
    pub const ADMINS_ONLY: &str = "only admins allowed";
    pub const INVALID_CREDENTIALS_LIST: &str = "invalid credentials list";
    pub const INVALID_CREDENTIALS: &str = "invalid credentials";

    // User management
    pub const MISSING_CREDENTIALS: &str =
        "invalid request data: missing email and/or password";
    pub const INVALID_EMAIL: &str = "invalid email format";
    pub const INVALID_PASSWORD: &str = r#"invalid password value - only english letters, digits and special characters !@#$%^&*()_+=-"'<>,./\|{}[]:;`~ allowed"#;
    pub const INVALID_FULL_NAME: &str =
        "invalid full_name value - it can be only list of words, consisting of ASCII characters";
    pub const USER_EXISTS: &str = "user with provided credentials already exists";
    pub const USER_NOT_FOUND: &str = "user with given id doesn't exist";
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid request body: {0}")]
    JsonRejection(#[from] JsonRejection),

    #[error("{0}")]
    Internal(String),
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl AppError {
    /// True when the underlying sqlite failure is a constraint violation
    /// (UNIQUE, FOREIGN KEY). Used to turn duplicate-email inserts into 409s.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            AppError::Database(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation
        )
    }
}

/// JSON body for every error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            AppError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message),
            AppError::Forbidden(message) => (StatusCode::FORBIDDEN, message),
            AppError::Conflict(message) => (StatusCode::CONFLICT, message),
            AppError::JsonRejection(_) => {
                (StatusCode::BAD_REQUEST, msg::INVALID_JSON.to_string())
            }
            // Server-side failures are logged with detail but the response
            // body stays generic.
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, msg::SERVER_ERROR.to_string())
            }
            AppError::Pool(ref e) => {
                tracing::error!("Connection pool error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, msg::SERVER_ERROR.to_string())
            }
            AppError::Json(ref e) => {
                tracing::error!("Serialization error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, msg::SERVER_ERROR.to_string())
            }
            AppError::Internal(ref detail) => {
                tracing::error!("Internal error: {}", detail);
                (StatusCode::INTERNAL_SERVER_ERROR, msg::SERVER_ERROR.to_string())
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
