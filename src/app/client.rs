//! HTTP client for the download backend
//!
//! Wraps a pooled reqwest client with the rate limiting pattern used for all
//! outbound requests, and exposes the two backend endpoints behind the
//! [`SnapshotSource`] trait so the scheduler and tests can swap the
//! transport.

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use governor::{clock::DefaultClock, state::InMemoryState, state::NotKeyed, Jitter, Quota, RateLimiter};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::app::models::{ShowId, ShowMetadata};
use crate::constants::{endpoints, http, limits};
use crate::errors::{ConfigError, FetchError, FetchResult, Result};

/// Where snapshots and show metadata come from
///
/// The production implementation is [`BackendClient`]; tests drive the
/// scheduler with an in-memory source.
#[async_trait]
pub trait SnapshotSource: Send + Sync + 'static {
    /// Fetch the complete current download list
    ///
    /// No pagination: the backend returns the full state every call. Records
    /// are returned raw; per-record validation belongs to the engine so one
    /// bad record cannot blank the whole view.
    async fn fetch_snapshot(&self) -> FetchResult<Vec<Value>>;

    /// Fetch metadata for one show
    async fn fetch_show_metadata(&self, id: &ShowId) -> FetchResult<ShowMetadata>;
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL
    pub base_url: Url,
    /// Request timeout
    pub timeout: Duration,
    /// Connection establishment timeout
    pub connect_timeout: Duration,
    /// Maximum pooled connections per host
    pub pool_max_per_host: usize,
    /// Outbound request rate limit (requests per second)
    pub rate_limit_rps: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(endpoints::DEFAULT_BASE_URL)
                .expect("default base URL is valid"),
            timeout: http::DEFAULT_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
            pool_max_per_host: http::POOL_MAX_PER_HOST,
            rate_limit_rps: limits::DEFAULT_RATE_LIMIT_RPS,
        }
    }
}

/// Rate-limited client for the download backend
///
/// The limiter applies to every outbound request, which bounds the burst of
/// show-metadata fetches when a snapshot introduces many new shows at once.
pub struct BackendClient {
    client: Client,
    base_url: Url,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

impl BackendClient {
    /// Create a client from the given configuration
    pub fn new(config: ClientConfig) -> Result<Self> {
        let quota =
            Quota::per_second(NonZeroU32::new(config.rate_limit_rps).ok_or_else(|| {
                ConfigError::InvalidValue {
                    field: "client.rate_limit_rps".to_string(),
                    value: "0".to_string(),
                    reason: "rate limit must be non-zero".to_string(),
                }
            })?);

        let client = Client::builder()
            .user_agent(http::USER_AGENT)
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.pool_max_per_host)
            .build()
            .map_err(FetchError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url,
            rate_limiter: RateLimiter::direct(quota),
        })
    }

    /// Build an endpoint URL under the base, one path segment per element
    ///
    /// Segments are percent-encoded by the url crate, so show ids containing
    /// spaces or slashes are safe in the path.
    fn endpoint_url(&self, segments: &[&str]) -> FetchResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| FetchError::InvalidUrl {
                    url: self.base_url.to_string(),
                    reason: "base URL cannot have segments appended".to_string(),
                })?;
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    /// GET one endpoint and return the response body on a success status
    async fn get_body(&self, url: Url) -> FetchResult<(StatusCode, String)> {
        self.rate_limiter
            .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(100)))
            .await;

        let response = self.client.get(url.as_str()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::ServerError {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        debug!("Fetched {} ({} bytes)", url, body.len());
        Ok((status, body))
    }
}

#[async_trait]
impl SnapshotSource for BackendClient {
    async fn fetch_snapshot(&self) -> FetchResult<Vec<Value>> {
        let url = self.endpoint_url(&[endpoints::DOWNLOADS_PATH])?;
        let (_, body) = self.get_body(url).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn fetch_show_metadata(&self, id: &ShowId) -> FetchResult<ShowMetadata> {
        let url = self.endpoint_url(&[endpoints::SHOWS_PATH, id.as_str()])?;
        let (status, body) = self.get_body(url).await?;

        // The backend answers 204 for a show it cannot resolve; treat that as
        // metadata with nothing in it rather than a decode failure.
        if status == StatusCode::NO_CONTENT || body.is_empty() {
            return Ok(ShowMetadata::default());
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_with_base(base: &str) -> BackendClient {
        let config = ClientConfig {
            base_url: Url::parse(base).unwrap(),
            ..Default::default()
        };
        BackendClient::new(config).unwrap()
    }

    #[test]
    fn test_endpoint_url_for_downloads() {
        let client = client_with_base("http://127.0.0.1:5000");
        let url = client.endpoint_url(&[endpoints::DOWNLOADS_PATH]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:5000/downloads");
    }

    #[test]
    fn test_endpoint_url_with_base_path() {
        let client = client_with_base("http://media.local/nab/");
        let url = client.endpoint_url(&[endpoints::DOWNLOADS_PATH]).unwrap();
        assert_eq!(url.as_str(), "http://media.local/nab/downloads");
    }

    #[test]
    fn test_show_url_encodes_identity() {
        let client = client_with_base("http://127.0.0.1:5000");
        let url = client
            .endpoint_url(&[endpoints::SHOWS_PATH, "Example Show"])
            .unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:5000/shows/Example%20Show");
    }

    #[test]
    fn test_zero_rate_limit_is_rejected() {
        let config = ClientConfig {
            rate_limit_rps: 0,
            ..Default::default()
        };
        assert!(BackendClient::new(config).is_err());
    }

    #[test]
    fn test_connection_error_surfaces_as_fetch_error() {
        // Discard port: nothing listens there, so the connection is refused
        let client = client_with_base("http://127.0.0.1:9");
        let result = tokio_test::block_on(client.fetch_snapshot());
        assert!(matches!(result, Err(FetchError::Http(_))));
    }
}
