//! Application constants for showview
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain for maintainability and clarity.

use std::time::Duration;

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = "showview/0.1.0 (Download Monitor)";

    /// Default HTTP request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Maximum connections per host in pool
    pub const POOL_MAX_PER_HOST: usize = 4;
}

/// Backend endpoints
pub mod endpoints {
    /// Default backend base URL (the backend's development server address)
    pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

    /// Path returning the full list of active downloads
    pub const DOWNLOADS_PATH: &str = "downloads";

    /// Path prefix for per-show metadata
    pub const SHOWS_PATH: &str = "shows";
}

/// Polling configuration
pub mod poll {
    use super::Duration;

    /// Default interval between snapshot polls
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

    /// Minimum accepted poll interval
    pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);
}

/// Rate limiting
pub mod limits {
    /// Default rate limit for backend requests (requests per second)
    ///
    /// Bounds the burst of show-metadata fetches when a snapshot introduces
    /// many new shows at once.
    pub const DEFAULT_RATE_LIMIT_RPS: u32 = 10;
}

/// Terminal display configuration
pub mod display {
    /// Maximum width for file names in progress bars
    pub const MAX_FILENAME_WIDTH: usize = 48;

    /// Scale used for download progress bar positions (progress * scale)
    pub const PROGRESS_SCALE: u64 = 1000;

    /// Fallback terminal width when size detection fails
    pub const FALLBACK_TERMINAL_WIDTH: u16 = 80;
}

/// Logging constants
pub mod logging {
    /// Default log level
    pub const DEFAULT_LOG_LEVEL: &str = "info";
}

// Re-export commonly used constants for convenience
pub use endpoints::{DEFAULT_BASE_URL, DOWNLOADS_PATH, SHOWS_PATH};
pub use http::{DEFAULT_TIMEOUT as HTTP_TIMEOUT, USER_AGENT};
pub use limits::DEFAULT_RATE_LIMIT_RPS;
pub use poll::DEFAULT_POLL_INTERVAL;
