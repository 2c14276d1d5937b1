//! Scriptable capabilities for tests and offline demos.
//!
//! Each mock answers calls from a queue of scripted responses, in order, and
//! falls back to an empty catalog / a rate of 1 once the queue is drained.
//! Clones share the queue and the call log.

use crate::api::{CatalogApi, FetchFuture, RatesApi};
use crate::environment::AppEnvironment;
use crate::models::{CurrencyCode, CurrencyRate, FetchError, Product};
use shoptrack_testing::test_clock;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

struct Scripted<T> {
    delay: Duration,
    result: Result<T, FetchError>,
}

struct Script<T, R> {
    responses: VecDeque<Scripted<T>>,
    requests: Vec<R>,
}

type Shared<T, R> = Arc<Mutex<Script<T, R>>>;

fn lock<T, R>(script: &Shared<T, R>) -> MutexGuard<'_, Script<T, R>> {
    match script.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn shared<T, R>() -> Shared<T, R> {
    Arc::new(Mutex::new(Script {
        responses: VecDeque::new(),
        requests: Vec::new(),
    }))
}

/// Scriptable [`CatalogApi`]
#[derive(Clone)]
pub struct MockCatalog {
    script: Shared<Vec<Product>, ()>,
}

impl MockCatalog {
    /// Catalog with nothing scripted
    #[must_use]
    pub fn new() -> Self {
        Self { script: shared() }
    }

    /// Queue a response delivered immediately
    #[must_use]
    pub fn respond(self, result: Result<Vec<Product>, FetchError>) -> Self {
        self.respond_after(Duration::ZERO, result)
    }

    /// Queue a response delivered after `delay`
    #[must_use]
    pub fn respond_after(self, delay: Duration, result: Result<Vec<Product>, FetchError>) -> Self {
        lock(&self.script)
            .responses
            .push_back(Scripted { delay, result });
        self
    }

    /// Number of fetches so far
    #[must_use]
    pub fn calls(&self) -> usize {
        lock(&self.script).requests.len()
    }
}

impl Default for MockCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogApi for MockCatalog {
    fn fetch_products(&self) -> FetchFuture<'_, Vec<Product>> {
        let next = {
            let mut script = lock(&self.script);
            script.requests.push(());
            script.responses.pop_front()
        };
        Box::pin(async move {
            match next {
                Some(Scripted { delay, result }) => {
                    tokio::time::sleep(delay).await;
                    result
                },
                None => Ok(Vec::new()),
            }
        })
    }
}

/// Scriptable [`RatesApi`]; scripted rates apply to whatever target is asked
#[derive(Clone)]
pub struct MockRates {
    script: Shared<f64, (CurrencyCode, CurrencyCode)>,
}

impl MockRates {
    /// Rates with nothing scripted
    #[must_use]
    pub fn new() -> Self {
        Self { script: shared() }
    }

    /// Queue a response delivered immediately
    #[must_use]
    pub fn respond(self, result: Result<f64, FetchError>) -> Self {
        self.respond_after(Duration::ZERO, result)
    }

    /// Queue a response delivered after `delay`
    #[must_use]
    pub fn respond_after(self, delay: Duration, result: Result<f64, FetchError>) -> Self {
        lock(&self.script)
            .responses
            .push_back(Scripted { delay, result });
        self
    }

    /// `(base, target)` of every fetch so far
    #[must_use]
    pub fn requests(&self) -> Vec<(CurrencyCode, CurrencyCode)> {
        lock(&self.script).requests.clone()
    }
}

impl Default for MockRates {
    fn default() -> Self {
        Self::new()
    }
}

impl RatesApi for MockRates {
    fn fetch_rate(&self, base: CurrencyCode, target: CurrencyCode) -> FetchFuture<'_, CurrencyRate> {
        let next = {
            let mut script = lock(&self.script);
            script.requests.push((base, target));
            script.responses.pop_front()
        };
        Box::pin(async move {
            let rate = match next {
                Some(Scripted { delay, result }) => {
                    tokio::time::sleep(delay).await;
                    result?
                },
                None => 1.0,
            };
            Ok(CurrencyRate {
                currency: target,
                rate,
            })
        })
    }
}

/// Environment over the given mocks with the fixed test clock
#[must_use]
pub fn test_environment(catalog: MockCatalog, rates: MockRates) -> AppEnvironment {
    AppEnvironment::new(Arc::new(catalog), Arc::new(rates)).with_clock(Arc::new(test_clock()))
}
