//! Error handling for EventDesk
//!
//! This module defines the error type shared by every component. Each variant
//! belongs to exactly one [`ErrorKind`], which is what boundary code uses to pick
//! a transport-specific outcome.

use thiserror::Error;

/// Main error type for EventDesk
#[derive(Error, Debug)]
pub enum EventDeskError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid state: {0}")]
    State(String),

    #[error("Invalid status transition: {from} -> {to} (allowed: {allowed:?})")]
    InvalidStateTransition {
        from: String,
        to: String,
        allowed: Vec<String>,
    },

    #[error("Permission denied: {0}")]
    Authorization(String),

    #[error("Invalid check-in token: {0}")]
    Decoding(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration loading error: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Closed set of error kinds exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    State,
    Authorization,
    Decoding,
    Processing,
}

/// Outcome class a boundary maps each kind to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    BadRequest,
    NotFound,
    Conflict,
    Forbidden,
    Internal,
}

/// Result type alias for EventDesk operations
pub type Result<T> = std::result::Result<T, EventDeskError>;

impl EventDeskError {
    pub fn validation(message: impl Into<String>) -> Self {
        EventDeskError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        EventDeskError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        EventDeskError::Conflict(message.into())
    }

    pub fn state(message: impl Into<String>) -> Self {
        EventDeskError::State(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        EventDeskError::Authorization(message.into())
    }

    pub fn decoding(message: impl Into<String>) -> Self {
        EventDeskError::Decoding(message.into())
    }

    /// Get the discriminant for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            EventDeskError::Validation(_) => ErrorKind::Validation,
            EventDeskError::NotFound(_) => ErrorKind::NotFound,
            EventDeskError::Conflict(_) => ErrorKind::Conflict,
            EventDeskError::State(_) => ErrorKind::State,
            EventDeskError::InvalidStateTransition { .. } => ErrorKind::State,
            EventDeskError::Authorization(_) => ErrorKind::Authorization,
            EventDeskError::Decoding(_) => ErrorKind::Decoding,
            EventDeskError::Processing(_)
            | EventDeskError::Database(_)
            | EventDeskError::Migration(_)
            | EventDeskError::Config(_)
            | EventDeskError::ConfigLoad(_)
            | EventDeskError::Serialization(_)
            | EventDeskError::Io(_) => ErrorKind::Processing,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EventDeskError::Database(_) => ErrorSeverity::Critical,
            EventDeskError::Migration(_) => ErrorSeverity::Critical,
            EventDeskError::Config(_) => ErrorSeverity::Critical,
            EventDeskError::ConfigLoad(_) => ErrorSeverity::Critical,
            EventDeskError::Authorization(_) => ErrorSeverity::Warning,
            EventDeskError::Decoding(_) => ErrorSeverity::Warning,
            EventDeskError::Validation(_) => ErrorSeverity::Info,
            EventDeskError::NotFound(_) => ErrorSeverity::Info,
            EventDeskError::Conflict(_) => ErrorSeverity::Info,
            EventDeskError::State(_) => ErrorSeverity::Info,
            EventDeskError::InvalidStateTransition { .. } => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }
}

impl ErrorKind {
    /// Map the kind to the outcome class a transport boundary reports
    pub fn outcome(&self) -> Outcome {
        match self {
            ErrorKind::Validation => Outcome::BadRequest,
            ErrorKind::Decoding => Outcome::BadRequest,
            ErrorKind::State => Outcome::BadRequest,
            ErrorKind::NotFound => Outcome::NotFound,
            ErrorKind::Conflict => Outcome::Conflict,
            ErrorKind::Authorization => Outcome::Forbidden,
            ErrorKind::Processing => Outcome::Internal,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Validation => "VALIDATION",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::State => "STATE",
            ErrorKind::Authorization => "AUTHORIZATION",
            ErrorKind::Decoding => "DECODING",
            ErrorKind::Processing => "PROCESSING",
        };
        f.write_str(name)
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
