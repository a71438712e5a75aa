// src/errors.rs
// DOCUMENTATION: Custom error types and HTTP responses
// PURPOSE: Centralized error handling for database checks and the Striim proxy

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;

/// Application-specific error types
/// DOCUMENTATION: Every failure a check, action or monitor call can produce.
/// Each variant maps to an HTTP status code and a machine-readable code.
#[derive(Error, Debug)]
pub enum OjetError {
    #[error("Database connection not initialized. Please connect first.")]
    NotInitialized,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Pool could not be created (bad credentials, listener down, ...)
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// No connection could be borrowed from an existing pool
    #[error("Connection pool exhausted or unreachable: {0}")]
    PoolUnavailable(String),

    /// SQL / PL-SQL failure, driver message passed through verbatim
    #[error("{0}")]
    StatementFailed(String),

    #[error("Connection refused by {0}")]
    ConnectionRefused(String),

    #[error("Host not found: {0}")]
    HostNotFound(String),

    #[error("External API error: {0}")]
    ExternalApiError(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl OjetError {
    /// Stable code used in JSON error bodies and logs
    pub fn code(&self) -> &'static str {
        match self {
            OjetError::NotInitialized => "NOT_INITIALIZED",
            OjetError::InvalidInput(_) => "INVALID_INPUT",
            OjetError::ValidationError(_) => "VALIDATION_ERROR",
            OjetError::DatabaseError(_) => "DATABASE_ERROR",
            OjetError::PoolUnavailable(_) => "POOL_UNAVAILABLE",
            OjetError::StatementFailed(_) => "STATEMENT_ERROR",
            OjetError::ConnectionRefused(_) => "CONNECTION_REFUSED",
            OjetError::HostNotFound(_) => "HOST_NOT_FOUND",
            OjetError::ExternalApiError(_) => "EXTERNAL_API_ERROR",
            OjetError::AuthenticationFailed(_) => "AUTHENTICATION_FAILED",
            OjetError::InternalError(_) => "INTERNAL_ERROR",
        }
    }
}

/// Convert OjetError to HTTP response
/// DOCUMENTATION: Keeps the `{success, message}` shape the dashboard expects
impl ResponseError for OjetError {
    fn error_response(&self) -> HttpResponse {
        let body = json!({
            "success": false,
            "message": self.to_string(),
            "error": {
                "code": self.code(),
                "timestamp": chrono::Utc::now().to_rfc3339()
            }
        });

        HttpResponse::build(self.status_code()).json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            OjetError::NotInitialized => StatusCode::BAD_REQUEST,
            OjetError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            OjetError::ValidationError(_) => StatusCode::BAD_REQUEST,
            OjetError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            OjetError::PoolUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            OjetError::StatementFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            OjetError::ConnectionRefused(_) => StatusCode::BAD_GATEWAY,
            OjetError::HostNotFound(_) => StatusCode::BAD_GATEWAY,
            OjetError::ExternalApiError(_) => StatusCode::BAD_GATEWAY,
            OjetError::AuthenticationFailed(_) => StatusCode::UNAUTHORIZED,
            OjetError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
