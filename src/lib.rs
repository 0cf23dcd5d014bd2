//! showview library
//!
//! Keeps a live, incrementally reconciled view of an in-progress set of
//! downloads grouped by show, fed by fixed-interval polling of a backend
//! that reports transfer progress.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};

#[cfg(test)]
mod tests {
    use super::*;
    use constants::*;

    #[test]
    fn test_constants_accessible() {
        // Test that our constants are accessible
        assert_eq!(DEFAULT_POLL_INTERVAL.as_secs(), 5);
        assert_eq!(DOWNLOADS_PATH, "downloads");
        assert!(USER_AGENT.contains("showview"));
    }

    #[test]
    fn test_error_types() {
        // Test that our error types work correctly
        let record_error = errors::RecordError::MissingField { field: "url" };
        let app_error = AppError::Record(record_error);

        assert_eq!(app_error.category(), "record");
        assert!(app_error.is_recoverable());
    }
}
