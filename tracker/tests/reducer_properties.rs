//! Property-based tests for the slice reducers.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code

use proptest::prelude::*;
use shoptrack::mocks::{MockCatalog, MockRates, test_environment};
use shoptrack::{AppAction, AppEnvironment, AppReducer, AppState, CurrencyCode, CurrencyRate, FetchError, Item};
use shoptrack_core::Reducer;
use shoptrack_testing::properties::{name, positive_amount};
use std::sync::Arc;

fn env() -> AppEnvironment {
    test_environment(MockCatalog::new(), MockRates::new())
}

fn item() -> impl Strategy<Value = Item> {
    (name(), name(), positive_amount()).prop_map(|(name, store, price_usd)| Item {
        name,
        store,
        price_usd,
        estimated_delivery: "05-Mar-2024".to_string(),
    })
}

fn fetch_error() -> impl Strategy<Value = FetchError> {
    prop_oneof![
        name().prop_map(|message| FetchError::Transport {
            url: "http://rates.test".to_string(),
            message,
        }),
        (400_u16..600).prop_map(|status| FetchError::Http {
            url: "http://rates.test".to_string(),
            status,
            message: String::new(),
        }),
    ]
}

fn action() -> impl Strategy<Value = AppAction> {
    prop_oneof![
        item().prop_map(|item| AppAction::Add { item }),
        (0_usize..8, item()).prop_map(|(index, item)| AppAction::Update { index, item }),
        (0_usize..8).prop_map(|index| AppAction::Remove { index }),
        Just(AppAction::FetchProducts),
        Just(AppAction::FetchProductsSuccess { products: Vec::new() }),
        fetch_error().prop_map(|error| AppAction::FetchProductsFailure { error }),
        Just(AppAction::FetchExchangeRate),
        (1_u32..500).prop_map(|r| AppAction::FetchExchangeRateSuccess {
            rate: CurrencyRate {
                currency: CurrencyCode::Eur,
                rate: f64::from(r) / 100.0,
            },
        }),
        fetch_error().prop_map(|error| AppAction::FetchExchangeRateFailure { error }),
        Just(AppAction::ResetCurrency),
    ]
}

/// Apply `actions` in order, starting from the initial state
fn reduce_all(actions: &[AppAction]) -> AppState {
    let reducer = AppReducer::new();
    let env = env();
    let mut state = AppState::initial();
    for action in actions {
        let _ = reducer.reduce(&mut state, action.clone(), &env);
    }
    state
}

fn changed_slices(before: &AppState, after: &AppState) -> usize {
    usize::from(!Arc::ptr_eq(&before.items, &after.items))
        + usize::from(!Arc::ptr_eq(&before.products, &after.products))
        + usize::from(!Arc::ptr_eq(&before.currency, &after.currency))
}

proptest! {
    /// Adds keep insertion order
    #[test]
    fn prop_adds_keep_order(items in prop::collection::vec(item(), 0..20)) {
        let actions: Vec<_> = items.iter().cloned().map(|item| AppAction::Add { item }).collect();
        let state = reduce_all(&actions);
        prop_assert_eq!(&*state.items, &items);
    }

    /// Every action replaces at most one slice
    #[test]
    fn prop_at_most_one_slice_changes(
        history in prop::collection::vec(action(), 0..12),
        next in action(),
    ) {
        let before = reduce_all(&history);
        let mut after = before.clone();
        let _ = AppReducer::new().reduce(&mut after, next, &env());
        prop_assert!(changed_slices(&before, &after) <= 1);
    }

    /// Out-of-range indices leave the whole state untouched
    #[test]
    fn prop_out_of_range_index_is_identity(
        items in prop::collection::vec(item(), 0..6),
        offset in 0_usize..4,
        replacement in item(),
    ) {
        let adds: Vec<_> = items.into_iter().map(|item| AppAction::Add { item }).collect();
        let before = reduce_all(&adds);
        let index = before.items.len() + offset;

        let reducer = AppReducer::new();
        let env = env();
        let mut after = before.clone();
        let _ = reducer.reduce(&mut after, AppAction::Remove { index }, &env);
        let _ = reducer.reduce(&mut after, AppAction::Update { index, item: replacement }, &env);

        prop_assert!(before.shares_slices_with(&after));
    }

    /// Item actions never touch products or currency
    #[test]
    fn prop_item_actions_only_touch_items(
        history in prop::collection::vec(action(), 0..12),
        extra in item(),
    ) {
        let before = reduce_all(&history);
        let mut after = before.clone();
        let _ = AppReducer::new().reduce(&mut after, AppAction::Add { item: extra }, &env());

        prop_assert!(Arc::ptr_eq(&before.products, &after.products));
        prop_assert!(Arc::ptr_eq(&before.currency, &after.currency));
        prop_assert_eq!(after.items.len(), before.items.len() + 1);
    }

    /// A failure never loses the last good value
    #[test]
    fn prop_failure_keeps_value(
        history in prop::collection::vec(action(), 0..12),
        error in fetch_error(),
    ) {
        let before = reduce_all(&history);
        let mut after = before.clone();
        let reducer = AppReducer::new();
        let env = env();
        let _ = reducer.reduce(&mut after, AppAction::FetchExchangeRateFailure { error: error.clone() }, &env);
        let _ = reducer.reduce(&mut after, AppAction::FetchProductsFailure { error: error.clone() }, &env);

        prop_assert_eq!(after.currency.value(), before.currency.value());
        prop_assert_eq!(after.products.value(), before.products.value());
        prop_assert_eq!(after.currency.error(), Some(&error));
        prop_assert!(!after.products.is_loading());
    }
}
