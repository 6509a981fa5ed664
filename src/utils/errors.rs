//! Error handling for Teacher's Pet
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy, including the mapping of
//! every error onto an HTTP status and `{ "error": message }` body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Main error type for the Teacher's Pet application
#[derive(Error, Debug)]
pub enum TeachersPetError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Integration error: {0}")]
    Integration(#[from] IntegrationError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("No passes remaining")]
    InsufficientAllowance,

    #[error("Not enough PBIS points: balance {balance}, cost {cost}")]
    InsufficientPoints { balance: i32, cost: i32 },

    #[error("Maximum {limit} extra passes per month")]
    PurchaseLimitReached { limit: i32 },

    #[error("Student {student} already has an open pass")]
    ActivePassExists { student: String },

    #[error("No active pass")]
    NoActivePass,

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Conflict: {0}")]
    Conflict(String),

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

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// Email and LLM integration errors
#[derive(Error, Debug)]
pub enum IntegrationError {
    #[error("Integration not configured: {0}")]
    NotConfigured(&'static str),

    #[error("Email delivery failed: {0}")]
    EmailFailed(String),

    #[error("LLM request failed: {0}")]
    LlmFailed(String),

    #[error("Invalid integration response: {0}")]
    InvalidResponse(String),

    #[error("Integration timeout")]
    Timeout,
}

/// Result type alias for Teacher's Pet operations
pub type Result<T> = std::result::Result<T, TeachersPetError>;

/// Result type alias for integration operations
pub type IntegrationResult<T> = std::result::Result<T, IntegrationError>;

impl TeachersPetError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        TeachersPetError::NotFound { entity, id: id.to_string() }
    }

    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            TeachersPetError::Database(_) => false,
            TeachersPetError::Migration(_) => false,
            TeachersPetError::Integration(_) => true,
            TeachersPetError::Config(_) => false,
            TeachersPetError::PermissionDenied(_) => false,
            TeachersPetError::Authentication(_) => false,
            TeachersPetError::NotFound { .. } => false,
            TeachersPetError::InsufficientAllowance => false,
            TeachersPetError::InsufficientPoints { .. } => false,
            TeachersPetError::PurchaseLimitReached { .. } => false,
            TeachersPetError::ActivePassExists { .. } => false,
            TeachersPetError::NoActivePass => false,
            TeachersPetError::InvalidStateTransition { .. } => false,
            TeachersPetError::Conflict(_) => false,
            TeachersPetError::Http(_) => true,
            TeachersPetError::Serialization(_) => false,
            TeachersPetError::Io(_) => true,
            TeachersPetError::UrlParse(_) => false,
            TeachersPetError::Token(_) => false,
            TeachersPetError::RateLimitExceeded => true,
            TeachersPetError::InvalidInput(_) => false,
            TeachersPetError::ServiceUnavailable(_) => true,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TeachersPetError::Database(_) => ErrorSeverity::Critical,
            TeachersPetError::Migration(_) => ErrorSeverity::Critical,
            TeachersPetError::Config(_) => ErrorSeverity::Critical,
            TeachersPetError::PermissionDenied(_) => ErrorSeverity::Warning,
            TeachersPetError::Authentication(_) => ErrorSeverity::Warning,
            TeachersPetError::Token(_) => ErrorSeverity::Warning,
            TeachersPetError::RateLimitExceeded => ErrorSeverity::Warning,
            TeachersPetError::InvalidInput(_)
            | TeachersPetError::InsufficientAllowance
            | TeachersPetError::InsufficientPoints { .. }
            | TeachersPetError::PurchaseLimitReached { .. }
            | TeachersPetError::ActivePassExists { .. }
            | TeachersPetError::NoActivePass
            | TeachersPetError::NotFound { .. } => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }

    /// HTTP status reported to API callers
    pub fn status_code(&self) -> StatusCode {
        match self {
            TeachersPetError::Authentication(_) | TeachersPetError::Token(_) => StatusCode::UNAUTHORIZED,
            TeachersPetError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            TeachersPetError::NotFound { .. } => StatusCode::NOT_FOUND,
            TeachersPetError::ActivePassExists { .. } | TeachersPetError::Conflict(_) => StatusCode::CONFLICT,
            TeachersPetError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            TeachersPetError::InvalidInput(_)
            | TeachersPetError::InsufficientAllowance
            | TeachersPetError::InsufficientPoints { .. }
            | TeachersPetError::PurchaseLimitReached { .. }
            | TeachersPetError::NoActivePass
            | TeachersPetError::InvalidStateTransition { .. } => StatusCode::BAD_REQUEST,
            TeachersPetError::Integration(_) | TeachersPetError::Http(_) => StatusCode::BAD_GATEWAY,
            TeachersPetError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for TeachersPetError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self.severity() {
            ErrorSeverity::Critical | ErrorSeverity::Error => {
                tracing::error!(status = status.as_u16(), error = %self, "Request failed");
            }
            ErrorSeverity::Warning => {
                tracing::warn!(status = status.as_u16(), error = %self, "Request rejected");
            }
            ErrorSeverity::Info => {
                tracing::debug!(status = status.as_u16(), error = %self, "Request refused");
            }
        }
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
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
