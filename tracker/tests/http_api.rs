//! HTTP capability tests against a local mock server.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code

use serde_json::json;
use shoptrack::api::{CatalogApi, HttpCatalog, HttpRates, RatesApi};
use shoptrack::{AppAction, AppEnvironment, CurrencyCode, FetchError, new_store};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn catalog_body() -> serde_json::Value {
    json!([
        {
            "id": 1,
            "title": "Fjallraven Backpack",
            "price": 109.95,
            "description": "Your perfect pack",
            "category": "men's clothing",
            "image": "https://catalog.test/1.jpg",
            "rating": { "rate": 3.9, "count": 120 }
        },
        {
            "id": 2,
            "title": "Slim Fit T-Shirt",
            "price": 22.3,
            "category": "men's clothing",
            "rating": { "rate": 4.1, "count": 259 }
        }
    ])
}

async fn catalog_answering(template: ResponseTemplate) -> (MockServer, HttpCatalog) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(template)
        .mount(&server)
        .await;
    let catalog = HttpCatalog::new(reqwest::Client::new(), format!("{}/products", server.uri()));
    (server, catalog)
}

async fn rates_answering(template: ResponseTemplate) -> (MockServer, HttpRates) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/latest"))
        .and(query_param("from", "USD"))
        .and(query_param("to", "EUR"))
        .respond_with(template)
        .mount(&server)
        .await;
    let rates = HttpRates::new(reqwest::Client::new(), format!("{}/latest", server.uri()));
    (server, rates)
}

// ============================================================================
// Catalog
// ============================================================================

#[tokio::test]
async fn test_catalog_decodes_products() {
    let (_server, catalog) = catalog_answering(ResponseTemplate::new(200).set_body_json(catalog_body())).await;

    let products = catalog.fetch_products().await.unwrap();

    assert_eq!(products.len(), 2);
    assert_eq!(products[0].title, "Fjallraven Backpack");
    assert_eq!(products[1].rating.count, 259);
    assert!(products[1].description.is_empty());
}

#[tokio::test]
async fn test_catalog_not_found_is_http_error() {
    let (_server, catalog) = catalog_answering(ResponseTemplate::new(404)).await;

    let error = catalog.fetch_products().await.unwrap_err();

    assert!(matches!(error, FetchError::Http { status: 404, .. }));
    assert_eq!(error.message(), "Not Found");
    assert!(error.url().ends_with("/products"));
    assert!(!error.is_retryable());
}

#[tokio::test]
async fn test_catalog_server_error_keeps_body() {
    let (_server, catalog) =
        catalog_answering(ResponseTemplate::new(500).set_body_string("database is down")).await;

    let error = catalog.fetch_products().await.unwrap_err();

    assert_eq!(error.status(), 500);
    assert_eq!(error.message(), "database is down");
    assert!(error.is_retryable());
}

#[tokio::test]
async fn test_catalog_malformed_body_is_decode_error() {
    let (_server, catalog) = catalog_answering(ResponseTemplate::new(200).set_body_string("<html>")).await;

    let error = catalog.fetch_products().await.unwrap_err();

    assert!(matches!(error, FetchError::Decode { .. }));
    assert_eq!(error.status(), 0);
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    let server = MockServer::start().await;
    let url = format!("{}/products", server.uri());
    drop(server);

    let catalog = HttpCatalog::new(reqwest::Client::new(), url);
    let error = catalog.fetch_products().await.unwrap_err();

    assert!(matches!(error, FetchError::Transport { .. }));
    assert_eq!(error.status(), 0);
}

// ============================================================================
// Rates
// ============================================================================

#[tokio::test]
async fn test_rates_sends_currency_pair() {
    let (_server, rates) = rates_answering(
        ResponseTemplate::new(200).set_body_json(json!({ "amount": 1.0, "base": "USD", "rates": { "EUR": 0.9 } })),
    )
    .await;

    let rate = rates.fetch_rate(CurrencyCode::Usd, CurrencyCode::Eur).await.unwrap();

    assert_eq!(rate.currency, CurrencyCode::Eur);
    assert!((rate.rate - 0.9).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_rates_missing_target_is_decode_error() {
    let (_server, rates) =
        rates_answering(ResponseTemplate::new(200).set_body_json(json!({ "rates": { "GBP": 0.8 } }))).await;

    let error = rates.fetch_rate(CurrencyCode::Usd, CurrencyCode::Eur).await.unwrap_err();

    assert!(matches!(error, FetchError::Decode { .. }));
    assert!(error.message().contains("EUR"));
}

#[tokio::test]
async fn test_rates_same_currency_skips_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    let rates = HttpRates::new(reqwest::Client::new(), format!("{}/latest", server.uri()));

    let rate = rates.fetch_rate(CurrencyCode::Usd, CurrencyCode::Usd).await.unwrap();

    assert_eq!(rate.currency, CurrencyCode::Usd);
    assert!((rate.rate - 1.0).abs() < f64::EPSILON);
}

// ============================================================================
// Through the store
// ============================================================================

#[tokio::test]
async fn test_store_fetches_over_http() {
    let (_catalog_server, catalog) =
        catalog_answering(ResponseTemplate::new(200).set_body_json(catalog_body())).await;
    let (_rates_server, rates) =
        rates_answering(ResponseTemplate::new(200).set_body_json(json!({ "rates": { "EUR": 0.92 } }))).await;

    let env = AppEnvironment::new(Arc::new(catalog), Arc::new(rates));
    let store = new_store(env);
    let wait = Duration::from_secs(5);

    let products = store
        .dispatch_and_wait_for(
            AppAction::FetchProducts,
            |a| matches!(a, AppAction::FetchProductsSuccess { .. } | AppAction::FetchProductsFailure { .. }),
            wait,
        )
        .await
        .unwrap();
    assert!(matches!(products, AppAction::FetchProductsSuccess { ref products } if products.len() == 2));

    let rate = store
        .dispatch_and_wait_for(
            AppAction::FetchExchangeRate,
            |a| {
                matches!(
                    a,
                    AppAction::FetchExchangeRateSuccess { .. } | AppAction::FetchExchangeRateFailure { .. }
                )
            },
            wait,
        )
        .await
        .unwrap();
    assert!(matches!(rate, AppAction::FetchExchangeRateSuccess { .. }));

    let snapshot = store.snapshot();
    assert_eq!(snapshot.products.value().len(), 2);
    assert_eq!(snapshot.currency.value().currency, CurrencyCode::Eur);
    assert!(snapshot.currency.updated_at().is_some());
}
