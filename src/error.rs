//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Application-wide error type.
///
/// Each variant maps to a specific HTTP status code and error code.
///
/// # Error Categories
///
/// - **Validation Errors**: Missing or malformed input
/// - **Edit Key Errors**: Mutation attempted without a key, or with the wrong one
/// - **Resource Errors**: Entity absent or logically deleted
/// - **Database Errors**: Any sqlx::Error from database operations
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (e.g., connection error, query error).
    ///
    /// The detail is logged server-side and never sent to the client.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request.
    /// The String contains details about what was invalid.
    #[error("{0}")]
    Validation(String),

    /// A mutation was attempted without an edit key.
    ///
    /// Returns HTTP 403 Forbidden.
    #[error("Edit key is required")]
    KeyRequired,

    /// An edit key was supplied but its digest does not match.
    ///
    /// Returns HTTP 403 Forbidden.
    #[error("Invalid edit key")]
    InvalidKey,

    /// Store does not exist or has been logically deleted.
    ///
    /// Both cases produce the same response so deletion state is not leaked.
    #[error("Store not found")]
    StoreNotFound,

    /// Review does not exist or has been logically deleted.
    #[error("Review not found")]
    ReviewNotFound,
}

impl AppError {
    /// Machine-readable error code sent in the response body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "internal_error",
            AppError::Validation(_) => "validation_failed",
            AppError::KeyRequired => "key_required",
            AppError::InvalidKey => "invalid_key",
            AppError::StoreNotFound => "store_not_found",
            AppError::ReviewNotFound => "review_not_found",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::KeyRequired | AppError::InvalidKey => StatusCode::FORBIDDEN,
            AppError::StoreNotFound | AppError::ReviewNotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(format!("Invalid JSON body: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(format!("Invalid path: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(format!("Invalid query string: {}", rejection.body_text()))
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// All errors return JSON in this format:
/// ```json
/// {
///   "error": {
///     "code": "invalid_key",
///     "message": "Invalid edit key"
///   }
/// }
/// ```
///
/// # Status Code Mapping
///
/// - `Validation` → 400 Bad Request
/// - `KeyRequired`, `InvalidKey` → 403 Forbidden
/// - `StoreNotFound`, `ReviewNotFound` → 404 Not Found
/// - `Database` → 500 Internal Server Error (hides details from client)
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let message = match &self {
            AppError::Database(e) => {
                tracing::error!(error = ?e, "Database error while handling request");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
