//! Environment-driven configuration.
//!
//! All settings are optional with defaults, so `Config::default()` works
//! offline and `Config::from_env()` picks up `API_URL`, `USE_LOCAL_CANDLES`,
//! and `REDIS_URL` when set.

use crate::constants::DEFAULT_API_URL;
use std::time::Duration;

/// Default HTTP request timeout
pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the scanner and its market-data client
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the upstream market-data service
    pub api_url: String,
    /// Route candle requests to the `/candles/local` endpoint
    pub use_local_candles: bool,
    /// Redis connection URL; `None` disables caching
    pub redis_url: Option<String>,
    /// HTTP request timeout
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            use_local_candles: false,
            redis_url: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl Config {
    /// Build a configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        let api_url = std::env::var("API_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let use_local_candles = std::env::var("USE_LOCAL_CANDLES")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let redis_url = std::env::var("REDIS_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());

        Self {
            api_url,
            use_local_candles,
            redis_url,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Create a new builder for `Config`
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Builder for [`Config`]
///
/// # Example
///
/// ```
/// use stock_scanner::Config;
/// use std::time::Duration;
///
/// let config = Config::builder()
///     .api_url("http://localhost:4001")
///     .timeout(Duration::from_secs(30))
///     .build();
/// ```
#[derive(Debug)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Set the upstream service base URL
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    /// Route candle requests to the local-candles endpoint
    pub fn use_local_candles(mut self, local: bool) -> Self {
        self.config.use_local_candles = local;
        self
    }

    /// Set the Redis URL for the cache backend
    pub fn redis_url(mut self, url: impl Into<String>) -> Self {
        self.config.redis_url = Some(url.into());
        self
    }

    /// Set the HTTP request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Finish building
    pub fn build(self) -> Config {
        self.config
    }
}
