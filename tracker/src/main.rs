//! Shoptrack demo binary
//!
//! Fetches the catalog and the exchange rate, records a few items and prints
//! the per-store table in both currencies. Pass `--offline` to run against
//! scripted capabilities instead of the configured HTTP endpoints.

use futures::StreamExt;
use shoptrack::mocks::{MockCatalog, MockRates, test_environment};
use shoptrack::{
    AppAction, AppEnvironment, AppSelectors, ItemDraft, Product, Rating, TrackerConfig, new_store,
};
use shoptrack_core::Select;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shoptrack=debug,shoptrack_runtime=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = TrackerConfig::from_env()?;
    let offline = std::env::args().any(|arg| arg == "--offline");
    let environment = if offline {
        offline_environment(&config)
    } else {
        AppEnvironment::from_config(&config)?
    };
    tracing::info!(?environment, offline, "Starting shoptrack");

    let store = new_store(environment);
    let selectors = AppSelectors::new();

    println!("=== Shoptrack ===\n");

    let dispatches = store.subscribe(|snapshot| {
        tracing::trace!(items = snapshot.items.len(), "Snapshot published");
    });

    let totals = tokio::spawn({
        let mut totals = store.select(selectors.grand_total.clone()).into_stream();
        async move {
            while let Some(total) = totals.next().await {
                println!(
                    "  (total now {:.2} USD = {:.2} {})",
                    total.usd, total.converted, total.currency
                );
            }
        }
    });

    let wait = Duration::from_secs(15);
    let products = store
        .dispatch_and_wait_for(
            AppAction::FetchProducts,
            |a| {
                matches!(
                    a,
                    AppAction::FetchProductsSuccess { .. } | AppAction::FetchProductsFailure { .. }
                )
            },
            wait,
        )
        .await?;
    if let AppAction::FetchProductsFailure { error } = products {
        println!("Catalog unavailable ({}): {}", error.error(), error.message());
    }

    let titles = selectors.matching_titles("backpack").select(&store.snapshot());
    println!("Catalog matches for \"backpack\": {titles:?}\n");

    let drafts = [
        ItemDraft {
            name: String::new(),
            catalog_title: titles.first().cloned(),
            store: "Amazon".to_string(),
            price_usd: 109.95,
            estimated_delivery: "2024-03-05".to_string(),
        },
        ItemDraft {
            name: "Desk lamp".to_string(),
            catalog_title: None,
            store: "IKEA".to_string(),
            price_usd: 24.5,
            estimated_delivery: "12-Apr-2024".to_string(),
        },
        ItemDraft {
            name: "USB cable".to_string(),
            catalog_title: None,
            store: "Amazon".to_string(),
            price_usd: 8.99,
            estimated_delivery: "07/03/2024".to_string(),
        },
        ItemDraft {
            name: "Gift card".to_string(),
            catalog_title: None,
            store: "IKEA".to_string(),
            price_usd: 0.0,
            estimated_delivery: "01-May-2024".to_string(),
        },
    ];

    for draft in &drafts {
        match draft.validate() {
            Ok(item) => {
                println!(">>> Adding {} from {}", item.name, item.store);
                store.dispatch(AppAction::Add { item }).await?;
            },
            Err(error) => println!("!!! Rejected {:?}: {error}", draft.name),
        }
    }

    let rate = store
        .dispatch_and_wait_for(
            AppAction::FetchExchangeRate,
            |a| {
                matches!(
                    a,
                    AppAction::FetchExchangeRateSuccess { .. }
                        | AppAction::FetchExchangeRateFailure { .. }
                )
            },
            wait,
        )
        .await?;
    if let AppAction::FetchExchangeRateFailure { error } = rate {
        println!("Exchange rate unavailable: {error}");
    }

    let snapshot = store.snapshot();
    let currency = selectors.currency_type.select(&snapshot);
    let rate = selectors.exchange_rate.select(&snapshot);

    println!("\n{:<12} {:>5} {:>12} {:>12}", "Store", "Items", "USD", currency);
    for row in selectors.by_store.select(&snapshot).iter() {
        println!(
            "{:<12} {:>5} {:>12.2} {:>12.2}",
            row.store,
            row.quantity,
            row.sum,
            row.sum * *rate
        );
    }
    let amazon = selectors.total_price_for_store("Amazon").select(&snapshot);
    println!("\nSpent at Amazon: {amazon:.2} USD");

    drop(dispatches);
    store.shutdown(config.shutdown_timeout).await?;
    drop(store);
    let _ = tokio::time::timeout(Duration::from_secs(1), totals).await;

    println!("\n=== Done ===");
    Ok(())
}

/// Scripted catalog and rate, for running without network access
fn offline_environment(config: &TrackerConfig) -> AppEnvironment {
    let catalog = MockCatalog::new().respond_after(
        Duration::from_millis(50),
        Ok(vec![Product {
            id: 1,
            title: "Fjallraven Foldsack No. 1 Backpack".to_string(),
            description: "Fits 15 inch laptops".to_string(),
            category: "men's clothing".to_string(),
            price: 109.95,
            image: String::new(),
            rating: Rating {
                rate: 3.9,
                count: 120,
            },
        }]),
    );
    let rates = MockRates::new().respond_after(Duration::from_millis(50), Ok(0.92));

    test_environment(catalog, rates)
        .with_target_currency(config.target_currency)
        .with_fetch_policy(config.fetch_policy)
}
