//! Injected dependencies.

use crate::api::{CatalogApi, HttpCatalog, HttpRates, RatesApi};
use crate::config::{ConfigError, TrackerConfig};
use crate::effects::FetchPolicy;
use crate::models::CurrencyCode;
use shoptrack_core::environment::{Clock, SystemClock};
use shoptrack_runtime::retry::RetryPolicy;
use std::sync::Arc;

/// Everything reducers and effects may use from the outside world
#[derive(Clone)]
pub struct AppEnvironment {
    /// Product catalog
    pub catalog: Arc<dyn CatalogApi>,
    /// Exchange rates
    pub rates: Arc<dyn RatesApi>,
    /// Time source for fetch timestamps
    pub clock: Arc<dyn Clock>,
    /// Retry policy for fetches
    pub retry: RetryPolicy,
    /// Resolution of overlapping fetches
    pub fetch_policy: FetchPolicy,
    /// Currency requested by `FetchExchangeRate`
    pub target_currency: CurrencyCode,
}

impl AppEnvironment {
    /// Environment over the given capabilities, with the system clock,
    /// no retries, last-response-wins and EUR as target
    #[must_use]
    pub fn new(catalog: Arc<dyn CatalogApi>, rates: Arc<dyn RatesApi>) -> Self {
        Self {
            catalog,
            rates,
            clock: Arc::new(SystemClock),
            retry: RetryPolicy::none(),
            fetch_policy: FetchPolicy::default(),
            target_currency: CurrencyCode::Eur,
        }
    }

    /// HTTP-backed environment built from configuration
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::HttpClient`] if the HTTP client cannot be built.
    pub fn from_config(config: &TrackerConfig) -> Result<Self, ConfigError> {
        let client = config.http_client()?;
        Ok(Self::new(
            Arc::new(HttpCatalog::new(client.clone(), config.catalog_url.clone())),
            Arc::new(HttpRates::new(client, config.rates_url.clone())),
        )
        .with_retry(RetryPolicy::none().with_max_retries(config.max_retries))
        .with_fetch_policy(config.fetch_policy)
        .with_target_currency(config.target_currency))
    }

    /// Replace the clock
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the retry policy
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replace the fetch policy
    #[must_use]
    pub const fn with_fetch_policy(mut self, policy: FetchPolicy) -> Self {
        self.fetch_policy = policy;
        self
    }

    /// Replace the target currency
    #[must_use]
    pub const fn with_target_currency(mut self, currency: CurrencyCode) -> Self {
        self.target_currency = currency;
        self
    }
}

impl std::fmt::Debug for AppEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppEnvironment")
            .field("retry", &self.retry)
            .field("fetch_policy", &self.fetch_policy)
            .field("target_currency", &self.target_currency)
            .finish_non_exhaustive()
    }
}
