//! Configuration management for showview
//!
//! Unified TOML configuration with zero-config defaults: a missing file
//! means defaults, an explicit path must exist, and CLI flags override file
//! values at the command layer.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::app::client::ClientConfig;
use crate::app::scheduler::PollConfig;
use crate::constants::{display, endpoints, http, limits, logging, poll};
use crate::errors::{ConfigError, ConfigResult};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Backend HTTP client settings
    pub client: ClientSettings,
    /// Poll scheduling settings
    pub poll: PollSettings,
    /// Terminal display settings
    pub display: DisplaySettings,
    /// Logging configuration
    pub logging: LoggingSettings,
}

/// TOML-friendly client configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientSettings {
    /// Backend base URL
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// Maximum pooled connections per host
    pub pool_max_per_host: usize,
    /// Rate limit (requests per second)
    pub rate_limit_rps: u32,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: endpoints::DEFAULT_BASE_URL.to_string(),
            timeout_secs: http::DEFAULT_TIMEOUT.as_secs(),
            connect_timeout_secs: http::CONNECT_TIMEOUT.as_secs(),
            pool_max_per_host: http::POOL_MAX_PER_HOST,
            rate_limit_rps: limits::DEFAULT_RATE_LIMIT_RPS,
        }
    }
}

/// TOML-friendly poll configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PollSettings {
    /// Interval between snapshot polls (humantime format, e.g. "5s")
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: poll::DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Terminal display settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplaySettings {
    /// Render live progress bars (falls back to log lines off-terminal)
    pub progress_bars: bool,
    /// Maximum width for file names in progress bars
    pub max_filename_width: usize,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            progress_bars: true,
            max_filename_width: display::MAX_FILENAME_WIDTH,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default log level when no CLI flag or env filter overrides it
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: logging::DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl AppConfig {
    /// Platform default configuration file path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("showview").join("config.toml"))
    }

    /// Load configuration from an explicit file path
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load from the given path, the platform default, or fall back to
    /// defaults when no file exists
    ///
    /// An explicit path that does not exist is an error; a missing default
    /// file is not.
    pub fn load_or_default(path: Option<&Path>) -> ConfigResult<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(default) if default.exists() => Self::load(&default),
            _ => {
                debug!("No configuration file; using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Write this configuration to a file, creating parent directories
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        debug!("Saved configuration to {}", path.display());
        Ok(())
    }

    /// Validate field values
    pub fn validate(&self) -> ConfigResult<()> {
        if self.poll.interval < poll::MIN_POLL_INTERVAL {
            return Err(ConfigError::InvalidValue {
                field: "poll.interval".to_string(),
                value: format!("{:?}", self.poll.interval),
                reason: format!("must be at least {:?}", poll::MIN_POLL_INTERVAL),
            });
        }
        if self.client.rate_limit_rps == 0 {
            return Err(ConfigError::InvalidValue {
                field: "client.rate_limit_rps".to_string(),
                value: "0".to_string(),
                reason: "rate limit must be non-zero".to_string(),
            });
        }
        Url::parse(&self.client.base_url).map_err(|e| ConfigError::InvalidValue {
            field: "client.base_url".to_string(),
            value: self.client.base_url.clone(),
            reason: e.to_string(),
        })?;
        Ok(())
    }

    /// Runtime client configuration
    pub fn client_config(&self) -> ConfigResult<ClientConfig> {
        let base_url = Url::parse(&self.client.base_url).map_err(|e| ConfigError::InvalidValue {
            field: "client.base_url".to_string(),
            value: self.client.base_url.clone(),
            reason: e.to_string(),
        })?;
        Ok(ClientConfig {
            base_url,
            timeout: Duration::from_secs(self.client.timeout_secs),
            connect_timeout: Duration::from_secs(self.client.connect_timeout_secs),
            pool_max_per_host: self.client.pool_max_per_host,
            rate_limit_rps: self.client.rate_limit_rps,
        })
    }

    /// Runtime poll configuration
    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            interval: self.poll.interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_round_trips_through_toml() {
        let config = AppConfig::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.client.base_url = "http://media.local:5000".to_string();
        config.poll.interval = Duration::from_secs(10);
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_explicit_missing_path_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope.toml");
        let err = AppConfig::load_or_default(Some(&missing)).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn test_humantime_interval_parses() {
        let config: AppConfig = toml::from_str(
            r#"
            [poll]
            interval = "2s 500ms"
            "#,
        )
        .unwrap();
        assert_eq!(config.poll.interval, Duration::from_millis(2500));
    }

    #[test]
    fn test_validate_rejects_tiny_interval() {
        let mut config = AppConfig::default();
        config.poll.interval = Duration::from_millis(10);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_base_url() {
        let mut config = AppConfig::default();
        config.client.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_client_config_conversion() {
        let config = AppConfig::default();
        let client = config.client_config().unwrap();
        assert_eq!(client.base_url.as_str(), "http://127.0.0.1:5000/");
        assert_eq!(client.timeout, http::DEFAULT_TIMEOUT);
    }
}
