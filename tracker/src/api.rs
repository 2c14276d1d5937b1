//! Fetch capabilities and their HTTP implementations.
//!
//! The effects engine only sees [`CatalogApi`] and [`RatesApi`]. The HTTP
//! clients below talk to a fakestore-style catalog (`GET /products` answering
//! a product array) and a Frankfurter-style rates service
//! (`GET /latest?from=USD&to=EUR` answering `{"rates":{"EUR":0.9}}`).

use crate::models::{CurrencyCode, CurrencyRate, FetchError, Product};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by the capability traits
pub type FetchFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, FetchError>> + Send + 'a>>;

/// Source of catalog products
pub trait CatalogApi: Send + Sync {
    /// Fetch the full catalog
    fn fetch_products(&self) -> FetchFuture<'_, Vec<Product>>;
}

/// Source of exchange rates
pub trait RatesApi: Send + Sync {
    /// Fetch how many `target` units one `base` unit buys
    fn fetch_rate(&self, base: CurrencyCode, target: CurrencyCode) -> FetchFuture<'_, CurrencyRate>;
}

/// Catalog served over HTTP
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    client: Client,
    url: String,
}

impl HttpCatalog {
    /// Catalog at `url` (the product list endpoint)
    #[must_use]
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Endpoint URL
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl CatalogApi for HttpCatalog {
    fn fetch_products(&self) -> FetchFuture<'_, Vec<Product>> {
        Box::pin(async move {
            tracing::debug!(url = %self.url, "Fetching products");
            get_json(&self.client, &self.url, &[]).await
        })
    }
}

/// Exchange rates served over HTTP
#[derive(Debug, Clone)]
pub struct HttpRates {
    client: Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct RatesBody {
    rates: HashMap<String, f64>,
}

impl HttpRates {
    /// Rates service at `url` (the latest-rates endpoint)
    #[must_use]
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Endpoint URL
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl RatesApi for HttpRates {
    fn fetch_rate(&self, base: CurrencyCode, target: CurrencyCode) -> FetchFuture<'_, CurrencyRate> {
        Box::pin(async move {
            if base == target {
                return Ok(CurrencyRate {
                    currency: target,
                    rate: 1.0,
                });
            }

            tracing::debug!(url = %self.url, %base, %target, "Fetching exchange rate");
            let body: RatesBody = get_json(
                &self.client,
                &self.url,
                &[("from", base.as_str()), ("to", target.as_str())],
            )
            .await?;

            let rate = body
                .rates
                .get(target.as_str())
                .copied()
                .ok_or_else(|| FetchError::Decode {
                    url: self.url.clone(),
                    message: format!("no {target} rate in response"),
                })?;

            if !rate.is_finite() || rate <= 0.0 {
                return Err(FetchError::Decode {
                    url: self.url.clone(),
                    message: format!("invalid {target} rate {rate}"),
                });
            }

            Ok(CurrencyRate {
                currency: target,
                rate,
            })
        })
    }
}

/// GET `url` and decode a JSON body, mapping every failure to a [`FetchError`]
async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    query: &[(&str, &str)],
) -> Result<T, FetchError> {
    let response = client
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|e| FetchError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })?;

    let status = response.status();
    let body = response.text().await.map_err(|e| FetchError::Transport {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    if !status.is_success() {
        let message = if body.trim().is_empty() {
            status.canonical_reason().unwrap_or("Unknown Status").to_string()
        } else {
            body
        };
        return Err(FetchError::Http {
            url: url.to_string(),
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&body).map_err(|e| FetchError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })
}
