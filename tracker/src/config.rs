//! Configuration management for the tracker.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Unset variables fall back to the defaults; set but malformed variables are
//! reported as [`ConfigError`].

use crate::effects::FetchPolicy;
use crate::models::CurrencyCode;
use reqwest::Url;
use std::time::Duration;

/// Errors raised while loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A URL variable does not parse
    #[error("{key} is not a valid URL: {value}")]
    InvalidUrl {
        /// Variable name
        key: &'static str,
        /// Offending value
        value: String,
    },

    /// A numeric variable does not parse
    #[error("{key} is not a valid number: {value}")]
    InvalidNumber {
        /// Variable name
        key: &'static str,
        /// Offending value
        value: String,
    },

    /// The target currency is not supported
    #[error("{key}: {source}")]
    InvalidCurrency {
        /// Variable name
        key: &'static str,
        /// Parse failure
        #[source]
        source: crate::models::UnknownCurrency,
    },

    /// The fetch policy is not recognised
    #[error("{key} must be `last-response-wins` or `switch-to-latest`, got {value}")]
    InvalidFetchPolicy {
        /// Variable name
        key: &'static str,
        /// Offending value
        value: String,
    },

    /// The HTTP client could not be built
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    /// Product list endpoint
    pub catalog_url: String,
    /// Latest-rates endpoint
    pub rates_url: String,
    /// Currency fetched by `FetchExchangeRate`
    pub target_currency: CurrencyCode,
    /// How overlapping fetches of one resource resolve
    pub fetch_policy: FetchPolicy,
    /// Retries after a transient fetch failure
    pub max_retries: u32,
    /// Per-request timeout
    pub http_timeout: Duration,
    /// Graceful shutdown timeout
    pub shutdown_timeout: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            catalog_url: "https://fakestoreapi.com/products".to_string(),
            rates_url: "https://api.frankfurter.app/latest".to_string(),
            target_currency: CurrencyCode::Eur,
            fetch_policy: FetchPolicy::default(),
            max_retries: 0,
            http_timeout: Duration::from_secs(10),
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

impl TrackerConfig {
    /// Load configuration from the process environment.
    ///
    /// Call `dotenvy::dotenv()` first to pick up a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to a malformed value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup` (a variable name to value map)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to a malformed value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let url = |key: &'static str, default: String| match var(key) {
            None => Ok(default),
            Some(value) => Url::parse(value.trim())
                .map(|_| value.trim().to_string())
                .map_err(|_| ConfigError::InvalidUrl { key, value }),
        };

        let number = |key: &'static str, default: u64| match var(key) {
            None => Ok(default),
            Some(value) => value
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidNumber { key, value }),
        };

        let target_currency = match var("SHOPTRACK_TARGET_CURRENCY") {
            None => defaults.target_currency,
            Some(value) => value.parse().map_err(|source| ConfigError::InvalidCurrency {
                key: "SHOPTRACK_TARGET_CURRENCY",
                source,
            })?,
        };

        let fetch_policy = match var("SHOPTRACK_FETCH_POLICY") {
            None => defaults.fetch_policy,
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidFetchPolicy {
                key: "SHOPTRACK_FETCH_POLICY",
                value,
            })?,
        };

        let max_retries = number("SHOPTRACK_MAX_RETRIES", u64::from(defaults.max_retries))?;
        let max_retries = u32::try_from(max_retries).map_err(|_| ConfigError::InvalidNumber {
            key: "SHOPTRACK_MAX_RETRIES",
            value: max_retries.to_string(),
        })?;

        Ok(Self {
            catalog_url: url("SHOPTRACK_CATALOG_URL", defaults.catalog_url)?,
            rates_url: url("SHOPTRACK_RATES_URL", defaults.rates_url)?,
            target_currency,
            fetch_policy,
            max_retries,
            http_timeout: Duration::from_secs(number(
                "SHOPTRACK_HTTP_TIMEOUT_SECS",
                defaults.http_timeout.as_secs(),
            )?),
            shutdown_timeout: Duration::from_secs(number(
                "SHOPTRACK_SHUTDOWN_TIMEOUT_SECS",
                defaults.shutdown_timeout.as_secs(),
            )?),
        })
    }

    /// Build the shared HTTP client
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::HttpClient`] if the TLS backend cannot be initialised.
    pub fn http_client(&self) -> Result<reqwest::Client, ConfigError> {
        reqwest::Client::builder()
            .timeout(self.http_timeout)
            .user_agent(concat!("shoptrack/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))
    }
}
