//! # Shoptrack
//!
//! A shopping tracker built on the Shoptrack store: users record items
//! (store, price, delivery date), the catalog feeds the item-name
//! autocomplete, and per-store totals are shown in a chosen currency.
//!
//! ## Architecture
//!
//! - **State**: [`AppState`], three `Arc` slices (items, products, currency)
//! - **Actions**: [`AppAction`]
//! - **Reducers**: one per slice, combined into [`reducers::AppReducer`]
//! - **Effects**: [`AppEffects`] fetches products and exchange rates
//! - **Selectors**: memoized views in [`selectors`]
//! - **Environment**: fetch capabilities, clock and policies in [`AppEnvironment`]
//!
//! ## Example
//!
//! ```no_run
//! use shoptrack::{AppAction, AppEnvironment, TrackerConfig, new_store, selectors};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = TrackerConfig::from_env()?;
//! let store = new_store(AppEnvironment::from_config(&config)?);
//!
//! let mut rate = store.select(selectors::select_exchange_rate());
//! store.dispatch(AppAction::FetchExchangeRate).await?;
//! println!("rate: {:?}", rate.changed().await);
//! # Ok(())
//! # }
//! ```

/// Entity models
pub mod models;

/// Action vocabulary
pub mod actions;

/// State tree
pub mod state;

/// Slice reducers and the root reducer
pub mod reducers;

/// Effects engine
pub mod effects;

/// Memoized selectors
pub mod selectors;

/// Item form validation
pub mod validation;

/// Fetch capabilities and HTTP clients
pub mod api;

/// Injected dependencies
pub mod environment;

/// Environment-driven configuration
pub mod config;

/// Scriptable capabilities
pub mod mocks;

pub use actions::AppAction;
pub use config::{ConfigError, TrackerConfig};
pub use effects::{AppEffects, FetchPolicy};
pub use environment::AppEnvironment;
pub use models::{CurrencyCode, CurrencyRate, FetchError, Item, Product, Rating};
pub use reducers::{AppReducer, RootReducer, root_reducer};
pub use selectors::{AppSelectors, SharedSelector, StoreData};
pub use state::AppState;
pub use validation::{ItemDraft, ValidationError};

use shoptrack_runtime::{Store, StoreConfig};

/// The tracker store
pub type TrackerStore = Store<AppState, AppAction, AppEnvironment, RootReducer>;

/// Store over the initial state with the root reducer
#[must_use]
pub fn new_store(environment: AppEnvironment) -> TrackerStore {
    Store::new(AppState::initial(), root_reducer(), environment)
}

/// Store with custom runtime configuration
#[must_use]
pub fn new_store_with_config(environment: AppEnvironment, config: StoreConfig) -> TrackerStore {
    Store::with_config(AppState::initial(), root_reducer(), environment, config)
}
