//! The effects engine.
//!
//! [`AppEffects`] watches for the two request actions and turns each into an
//! [`Effect::Future`] that calls the matching capability. Whatever happens,
//! the future resolves to a success or failure action: errors are data here,
//! never panics or dropped results.
//!
//! Overlapping requests for one resource are resolved by [`FetchPolicy`].

use crate::actions::AppAction;
use crate::environment::AppEnvironment;
use crate::models::{CurrencyCode, FetchError};
use shoptrack_core::{Effect, EffectHandler};
use shoptrack_runtime::retry::retry_when;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// How completions of overlapping fetches of the same resource are applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchPolicy {
    /// Every completion is dispatched; the last one to arrive wins
    #[default]
    LastResponseWins,
    /// Only the completion of the most recent request is dispatched
    SwitchToLatest,
}

/// Unknown fetch policy name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown fetch policy: {0}")]
pub struct UnknownFetchPolicy(pub String);

impl FromStr for FetchPolicy {
    type Err = UnknownFetchPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "last-response-wins" => Ok(Self::LastResponseWins),
            "switch-to-latest" => Ok(Self::SwitchToLatest),
            other => Err(UnknownFetchPolicy(other.to_string())),
        }
    }
}

/// Request counter of one resource
#[derive(Debug, Default)]
struct Generations(Arc<AtomicU64>);

impl Generations {
    fn issue(&self) -> Ticket {
        let id = self.0.fetch_add(1, Ordering::SeqCst) + 1;
        Ticket {
            id,
            latest: Arc::clone(&self.0),
        }
    }

    /// Make every outstanding ticket stale without starting a request
    fn supersede(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Identity of one request
struct Ticket {
    id: u64,
    latest: Arc<AtomicU64>,
}

impl Ticket {
    fn is_latest(&self) -> bool {
        self.latest.load(Ordering::SeqCst) == self.id
    }

    /// `false` if the completion should be dropped under `policy`
    fn admits(&self, policy: FetchPolicy, resource: &'static str) -> bool {
        if policy == FetchPolicy::SwitchToLatest && !self.is_latest() {
            tracing::debug!(resource, request = self.id, "Superseded response dropped");
            return false;
        }
        true
    }
}

/// Effect handler for product and exchange-rate fetches
#[derive(Debug, Default)]
pub struct AppEffects {
    products: Generations,
    rates: Generations,
}

impl AppEffects {
    /// Fresh handler with no requests issued
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn fetch_products(&self, env: &AppEnvironment) -> Effect<AppAction> {
        let ticket = self.products.issue();
        let catalog = Arc::clone(&env.catalog);
        let retry = env.retry.clone();
        let policy = env.fetch_policy;

        Effect::future(async move {
            let result = retry_when(&retry, || catalog.fetch_products(), FetchError::is_retryable).await;

            if !ticket.admits(policy, "products") {
                return None;
            }

            Some(match result {
                Ok(products) => {
                    tracing::debug!(count = products.len(), "Products fetched");
                    AppAction::FetchProductsSuccess { products }
                },
                Err(error) => {
                    tracing::warn!(error = %error, "Product fetch failed");
                    AppAction::FetchProductsFailure { error }
                },
            })
        })
    }

    fn fetch_exchange_rate(&self, env: &AppEnvironment) -> Effect<AppAction> {
        let ticket = self.rates.issue();
        let rates = Arc::clone(&env.rates);
        let retry = env.retry.clone();
        let policy = env.fetch_policy;
        let target = env.target_currency;

        Effect::future(async move {
            let result = retry_when(
                &retry,
                || rates.fetch_rate(CurrencyCode::Usd, target),
                FetchError::is_retryable,
            )
            .await;

            if !ticket.admits(policy, "currency") {
                return None;
            }

            Some(match result {
                Ok(rate) => {
                    tracing::debug!(currency = %rate.currency, rate = rate.rate, "Exchange rate fetched");
                    AppAction::FetchExchangeRateSuccess { rate }
                },
                Err(error) => {
                    tracing::warn!(error = %error, "Exchange rate fetch failed");
                    AppAction::FetchExchangeRateFailure { error }
                },
            })
        })
    }
}

impl EffectHandler for AppEffects {
    type Action = AppAction;
    type Environment = AppEnvironment;

    fn handle(&self, action: &AppAction, env: &AppEnvironment) -> Effect<AppAction> {
        match action {
            AppAction::FetchProducts => self.fetch_products(env),
            AppAction::FetchExchangeRate => self.fetch_exchange_rate(env),
            AppAction::ResetCurrency => {
                // A rate still in flight must not undo the reset
                self.rates.supersede();
                Effect::None
            },
            _ => Effect::None,
        }
    }
}
