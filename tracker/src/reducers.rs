//! Slice reducers and the root reducer.
//!
//! Every slice reducer matches the actions it owns and ignores the rest
//! without touching its `Arc`, so an unrelated dispatch leaves the slice
//! reference identical. Handled actions go through `Arc::make_mut`, which
//! copies the slice only while an older snapshot still shares it.

use crate::actions::AppAction;
use crate::effects::AppEffects;
use crate::environment::AppEnvironment;
use crate::models::CurrencyRate;
use crate::state::{AppState, CurrencyState, ItemsState, ProductsState};
use shoptrack_core::composition::{CombinedReducer, WithEffects, combine_reducers, scope_reducer, with_effects};
use shoptrack_core::{Effect, Reducer, SmallVec};
use std::sync::Arc;

type Effects = SmallVec<[Effect<AppAction>; 4]>;

/// Reducer for the `items` slice
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemsReducer;

impl Reducer for ItemsReducer {
    type State = Arc<ItemsState>;
    type Action = AppAction;
    type Environment = AppEnvironment;

    fn reduce(&self, items: &mut Self::State, action: AppAction, _env: &AppEnvironment) -> Effects {
        match action {
            AppAction::Add { item } => {
                tracing::debug!(store = %item.store, "Item added");
                Arc::make_mut(items).push(item);
            },
            AppAction::Update { index, item } if index < items.len() => {
                Arc::make_mut(items)[index] = item;
            },
            AppAction::Remove { index } if index < items.len() => {
                Arc::make_mut(items).remove(index);
            },
            AppAction::Update { index, .. } | AppAction::Remove { index } => {
                tracing::warn!(index, len = items.len(), "Item index out of range, ignored");
            },
            _ => {},
        }
        SmallVec::new()
    }
}

/// Reducer for the `products` slice
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductsReducer;

impl Reducer for ProductsReducer {
    type State = Arc<ProductsState>;
    type Action = AppAction;
    type Environment = AppEnvironment;

    fn reduce(&self, products: &mut Self::State, action: AppAction, env: &AppEnvironment) -> Effects {
        match action {
            AppAction::FetchProducts => Arc::make_mut(products).start(),
            AppAction::FetchProductsSuccess { products: list } => {
                Arc::make_mut(products).succeed(list, env.clock.now());
            },
            AppAction::FetchProductsFailure { error } => Arc::make_mut(products).fail(error),
            _ => {},
        }
        SmallVec::new()
    }
}

/// Reducer for the `currency` slice
#[derive(Debug, Clone, Copy, Default)]
pub struct CurrencyReducer;

impl Reducer for CurrencyReducer {
    type State = Arc<CurrencyState>;
    type Action = AppAction;
    type Environment = AppEnvironment;

    fn reduce(&self, currency: &mut Self::State, action: AppAction, env: &AppEnvironment) -> Effects {
        match action {
            AppAction::FetchExchangeRate => Arc::make_mut(currency).start(),
            AppAction::FetchExchangeRateSuccess { rate } => {
                Arc::make_mut(currency).succeed(rate, env.clock.now());
            },
            AppAction::FetchExchangeRateFailure { error } => Arc::make_mut(currency).fail(error),
            AppAction::ResetCurrency => Arc::make_mut(currency).reset(CurrencyRate::usd()),
            _ => {},
        }
        SmallVec::new()
    }
}

/// The three slice reducers scoped onto [`AppState`]
pub struct AppReducer {
    slices: CombinedReducer<AppState, AppAction, AppEnvironment>,
}

impl AppReducer {
    /// Items, products and currency, in that order
    #[must_use]
    pub fn new() -> Self {
        Self {
            slices: combine_reducers(vec![
                Box::new(scope_reducer(ItemsReducer, |s: &mut AppState| &mut s.items)),
                Box::new(scope_reducer(ProductsReducer, |s: &mut AppState| &mut s.products)),
                Box::new(scope_reducer(CurrencyReducer, |s: &mut AppState| &mut s.currency)),
            ]),
        }
    }
}

impl Default for AppReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl Reducer for AppReducer {
    type State = AppState;
    type Action = AppAction;
    type Environment = AppEnvironment;

    fn reduce(&self, state: &mut AppState, action: AppAction, env: &AppEnvironment) -> Effects {
        self.slices.reduce(state, action, env)
    }
}

/// Root reducer handed to the store: slices first, then the effects engine
pub type RootReducer = WithEffects<AppReducer, AppEffects>;

/// Build the root reducer
#[must_use]
pub fn root_reducer() -> RootReducer {
    with_effects(AppReducer::new(), AppEffects::new())
}
