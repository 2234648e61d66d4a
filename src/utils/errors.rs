//! Error handling for SkiClub
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy, including the mapping of
//! errors to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Main error type for SkiClub application
#[derive(Error, Debug)]
pub enum SkiClubError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Email error: {0}")]
    Email(#[from] EmailError),

    #[error("AI service error: {0}")]
    Ai(#[from] AiError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// Email delivery errors
#[derive(Error, Debug)]
pub enum EmailError {
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Email build error: {0}")]
    Build(String),

    #[error("Mail API request failed: {0}")]
    Api(String),

    #[error("Mail API authentication failed: {0}")]
    Authentication(String),
}

/// Generative text endpoint errors
#[derive(Error, Debug)]
pub enum AiError {
    #[error("AI request failed: {0}")]
    RequestFailed(String),

    #[error("AI service not configured")]
    NotConfigured,

    #[error("Invalid AI response: {0}")]
    InvalidResponse(String),
}

/// Result type alias for SkiClub operations
pub type Result<T> = std::result::Result<T, SkiClubError>;

/// Result type alias for email delivery
pub type EmailResult<T> = std::result::Result<T, EmailError>;

impl SkiClubError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        SkiClubError::NotFound { entity, id: id.to_string() }
    }

    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            SkiClubError::Database(_) => false,
            SkiClubError::Migration(_) => false,
            SkiClubError::Email(_) => true,
            SkiClubError::Ai(_) => true,
            SkiClubError::Config(_) => false,
            SkiClubError::Validation(_) => false,
            SkiClubError::Unauthorized(_) => false,
            SkiClubError::PermissionDenied(_) => false,
            SkiClubError::NotFound { .. } => false,
            SkiClubError::Conflict(_) => false,
            SkiClubError::Redis(_) => true,
            SkiClubError::Http(_) => true,
            SkiClubError::Serialization(_) => false,
            SkiClubError::Io(_) => true,
            SkiClubError::UrlParse(_) => false,
            SkiClubError::Token(_) => false,
            SkiClubError::RateLimitExceeded => true,
            SkiClubError::ServiceUnavailable(_) => true,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            SkiClubError::Database(_) => ErrorSeverity::Critical,
            SkiClubError::Migration(_) => ErrorSeverity::Critical,
            SkiClubError::Config(_) => ErrorSeverity::Critical,
            SkiClubError::Unauthorized(_) => ErrorSeverity::Warning,
            SkiClubError::PermissionDenied(_) => ErrorSeverity::Warning,
            SkiClubError::Token(_) => ErrorSeverity::Warning,
            SkiClubError::RateLimitExceeded => ErrorSeverity::Warning,
            SkiClubError::Validation(_) => ErrorSeverity::Info,
            SkiClubError::NotFound { .. } => ErrorSeverity::Info,
            SkiClubError::Conflict(_) => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }

    /// HTTP status, machine-readable code and client-facing message
    fn response_parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            SkiClubError::Validation(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR", msg.clone())
            }
            SkiClubError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
            SkiClubError::Token(_) => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Invalid or expired token".to_string(),
            ),
            SkiClubError::PermissionDenied(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
            SkiClubError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND", self.to_string()),
            SkiClubError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            SkiClubError::RateLimitExceeded => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMITED",
                "Too many requests, try again later".to_string(),
            ),
            SkiClubError::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE", msg.clone())
            }
            SkiClubError::Ai(AiError::NotConfigured) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                "Trip parsing is not configured".to_string(),
            ),
            SkiClubError::Ai(AiError::InvalidResponse(_)) => (
                StatusCode::BAD_GATEWAY,
                "BAD_GATEWAY",
                "Could not understand the AI response".to_string(),
            ),
            SkiClubError::Database(sqlx::Error::RowNotFound) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "Resource not found".to_string(),
            ),
            SkiClubError::Database(sqlx::Error::Database(db_err))
                if db_err.code().as_deref() == Some("23505") =>
            {
                let constraint = db_err.constraint().unwrap_or("unknown");
                (
                    StatusCode::CONFLICT,
                    "CONFLICT",
                    format!("Duplicate value violates unique constraint: {constraint}"),
                )
            }
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            ),
        }
    }
}

impl From<validator::ValidationErrors> for SkiClubError {
    fn from(errors: validator::ValidationErrors) -> Self {
        SkiClubError::Validation(errors.to_string())
    }
}

impl IntoResponse for SkiClubError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.response_parts();

        if status.is_server_error() {
            tracing::error!(
                error = %self,
                severity = %self.severity(),
                recoverable = self.is_recoverable(),
                "Request failed"
            );
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
