//! Error types for showview
//!
//! This module defines the error types for all components of the application.
//! Errors are layered by domain and roll up into [`AppError`] at the
//! application boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Errors fetching data from the backend
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request failed (connection, timeout, TLS)
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    /// Server returned a non-success status
    #[error("Server error: HTTP {status} from {url}")]
    ServerError { status: u16, url: String },

    /// Response body was not the expected JSON shape
    #[error("Invalid JSON in backend response")]
    InvalidJson(#[from] serde_json::Error),

    /// Endpoint URL could not be constructed
    #[error("Invalid URL: {url} - {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Errors validating a single download record from a snapshot
///
/// These are per-record: one malformed record is skipped with a diagnostic
/// and never aborts the rest of the pass.
#[derive(Error, Debug)]
pub enum RecordError {
    /// A required field is absent
    #[error("Record is missing required field '{field}'")]
    MissingField { field: &'static str },

    /// A field is present but unusable
    #[error("Record field '{field}' is invalid: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid configuration format
    #[error("Invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),

    /// Configuration could not be serialized for writing
    #[error("Configuration could not be serialized")]
    Serialize(#[from] toml::ser::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// I/O error reading or writing the configuration file
    #[error("Configuration file I/O error")]
    Io(#[from] std::io::Error),
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Backend fetch error
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Snapshot record validation error
    #[error(transparent)]
    Record(#[from] RecordError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Check if the error is recoverable (transient)
    ///
    /// Fetch errors are recoverable: the scheduler abandons the cycle and the
    /// next tick retries against the same endpoint. Malformed records recover
    /// locally (the record is skipped). Configuration errors are not.
    pub fn is_recoverable(&self) -> bool {
        match self {
            AppError::Fetch(_) | AppError::Record(_) => true,
            AppError::Config(_) | AppError::Io(_) | AppError::Generic { .. } => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Fetch(_) => "fetch",
            AppError::Record(_) => "record",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Fetch result type alias
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Record validation result type alias
pub type RecordResult<T> = std::result::Result<T, RecordError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_errors_are_recoverable() {
        let err = AppError::Fetch(FetchError::ServerError {
            status: 503,
            url: "http://127.0.0.1:5000/downloads".to_string(),
        });
        assert!(err.is_recoverable());
        assert_eq!(err.category(), "fetch");
    }

    #[test]
    fn test_record_errors_recover_locally() {
        let err = AppError::Record(RecordError::MissingField { field: "url" });
        assert!(err.is_recoverable());
        assert_eq!(err.category(), "record");
    }

    #[test]
    fn test_config_errors_are_fatal() {
        let err = AppError::Config(ConfigError::InvalidValue {
            field: "poll.interval".to_string(),
            value: "0s".to_string(),
            reason: "must be positive".to_string(),
        });
        assert!(!err.is_recoverable());
        assert_eq!(err.category(), "config");
    }
}
