//! Application error taxonomy.
//!
//! Every failure in the system maps to one of these tagged kinds; nothing
//! propagates as an opaque error. The HTTP layer converts each kind into a
//! status code and a structured [`ApiResponse`](crate::response::ApiResponse)
//! error body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use thiserror::Error;

use crate::response::ApiResponse;

/// Result alias used throughout the workspace.
pub type AppResult<T> = Result<T, AppError>;

/// Application error kinds.
#[derive(Debug, Error)]
pub enum AppError {
    /// The requested database file does not exist.
    #[error("database not found: {0}")]
    DatabaseNotFound(String),

    /// The requested table is not present in the database.
    #[error("table not found: {0}")]
    TableNotFound(String),

    /// The backend could not establish or re-establish a connection.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The backend reported an error while executing a query.
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// All schema introspection fallbacks were exhausted. Recovered
    /// internally into a synthetic result and rarely surfaced.
    #[error("schema unavailable: {0}")]
    SchemaUnavailable(String),

    /// The uploaded file has a disallowed extension or bad signature.
    #[error("invalid file type: {0}")]
    InvalidFileType(String),

    /// A request parameter failed validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// Missing or invalid admin token.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The requested action is not configured on this server.
    #[error("not configured: {0}")]
    NotConfigured(String),

    /// Filesystem error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Unexpected internal failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable error code for client-side handling.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::DatabaseNotFound(_) => "DATABASE_NOT_FOUND",
            AppError::TableNotFound(_) => "TABLE_NOT_FOUND",
            AppError::ConnectionFailed(_) => "CONNECTION_FAILED",
            AppError::QueryFailed(_) => "QUERY_FAILED",
            AppError::SchemaUnavailable(_) => "SCHEMA_UNAVAILABLE",
            AppError::InvalidFileType(_) => "INVALID_FILE_TYPE",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::NotConfigured(_) => "NOT_CONFIGURED",
            AppError::Io(_) => "IO_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP status code for this error kind.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::DatabaseNotFound(_) | AppError::TableNotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidFileType(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::FORBIDDEN,
            AppError::NotConfigured(_) => StatusCode::NOT_IMPLEMENTED,
            AppError::ConnectionFailed(_)
            | AppError::QueryFailed(_)
            | AppError::SchemaUnavailable(_)
            | AppError::Io(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "request failed");
        } else {
            tracing::warn!(code = self.code(), error = %self, "request rejected");
        }
        let body = ApiResponse::err(self.code(), self.to_string());
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_kinds_map_to_404() {
        assert_eq!(
            AppError::DatabaseNotFound("x.db".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::TableNotFound("Users".into()).status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn unconfigured_admin_actions_map_to_501() {
        assert_eq!(
            AppError::NotConfigured("admin token".into()).status(),
            StatusCode::NOT_IMPLEMENTED
        );
    }
}
