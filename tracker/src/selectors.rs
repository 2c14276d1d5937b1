//! Memoized projections of [`AppState`] for the views.
//!
//! Every `select_*` function builds a fresh selector with its own memo; build
//! each one once and keep it (or use [`AppSelectors`], which bundles one of
//! each and shares the upstream selectors between derived ones). A selector
//! recomputes only when the slice (or upstream output) it reads is a
//! different `Arc` than last time.

use crate::models::{CurrencyCode, CurrencyRate, FetchError, Item, Product};
use crate::state::{AppState, CurrencyState, ItemsState, ProductsState};
use serde::Serialize;
use shoptrack_core::{Select, Selector};
use std::sync::Arc;

/// A selector over [`AppState`] behind a shared handle
pub type SharedSelector<T> = Arc<dyn Select<AppState, Output = T>>;

/// One row of the per-store table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreData {
    /// Store name
    pub store: String,
    /// Total of the item prices at this store, in US dollars
    pub sum: f64,
    /// Number of items bought at this store
    pub quantity: usize,
}

/// An item with its price in the display currency
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricedItem {
    /// The item as stored
    pub item: Item,
    /// `item.price_usd` converted at the active rate
    pub price: f64,
    /// Currency of `price`
    pub currency: CurrencyCode,
}

/// Grand total over all stores
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GrandTotal {
    /// Total in US dollars
    pub usd: f64,
    /// Total at the active rate
    pub converted: f64,
    /// Currency of `converted`
    pub currency: CurrencyCode,
}

fn items(state: &AppState) -> Arc<ItemsState> {
    Arc::clone(&state.items)
}

fn products(state: &AppState) -> Arc<ProductsState> {
    Arc::clone(&state.products)
}

fn currency(state: &AppState) -> Arc<CurrencyState> {
    Arc::clone(&state.currency)
}

/// All items, in insertion order
#[must_use]
pub fn select_items() -> SharedSelector<Vec<Item>> {
    Arc::new(Selector::new("items", items, |items: &Arc<ItemsState>| {
        items.as_ref().clone()
    }))
}

/// The catalog product list (possibly stale after a failed refresh)
#[must_use]
pub fn select_products() -> SharedSelector<Vec<Product>> {
    Arc::new(Selector::new("products", products, |p: &Arc<ProductsState>| {
        p.value().clone()
    }))
}

/// Error of the last catalog fetch, if it failed
#[must_use]
pub fn select_fetch_products_error() -> SharedSelector<Option<FetchError>> {
    Arc::new(Selector::new(
        "fetch_products_error",
        products,
        |p: &Arc<ProductsState>| p.error().cloned(),
    ))
}

/// `true` while the catalog is being fetched
#[must_use]
pub fn select_products_loading() -> SharedSelector<bool> {
    Arc::new(Selector::new("products_loading", products, |p: &Arc<ProductsState>| {
        p.is_loading()
    }))
}

/// Product titles offered by the item-name autocomplete
#[must_use]
pub fn select_product_titles() -> SharedSelector<Vec<String>> {
    Arc::new(Selector::new("product_titles", products, |p: &Arc<ProductsState>| {
        p.value().iter().map(|product| product.title.clone()).collect()
    }))
}

/// Titles containing `query`, ignoring case (all titles for a blank query)
#[must_use]
pub fn select_matching_titles(query: impl Into<String>) -> SharedSelector<Vec<String>> {
    matching_titles_from(select_product_titles(), query.into())
}

fn matching_titles_from(titles: SharedSelector<Vec<String>>, query: String) -> SharedSelector<Vec<String>> {
    let needle = query.trim().to_lowercase();
    Arc::new(Selector::new(
        format!("matching_titles({query})"),
        move |state: &AppState| titles.select(state),
        move |titles: &Arc<Vec<String>>| {
            titles
                .iter()
                .filter(|title| title.to_lowercase().contains(&needle))
                .cloned()
                .collect()
        },
    ))
}

/// Display currency
#[must_use]
pub fn select_currency_type() -> SharedSelector<CurrencyCode> {
    Arc::new(Selector::new("currency_type", currency, |c: &Arc<CurrencyState>| {
        c.value().currency
    }))
}

/// Units of the display currency per US dollar
#[must_use]
pub fn select_exchange_rate() -> SharedSelector<f64> {
    Arc::new(Selector::new("exchange_rate", currency, |c: &Arc<CurrencyState>| {
        c.value().rate
    }))
}

/// Error of the last rate fetch, if it failed
#[must_use]
pub fn select_currency_error() -> SharedSelector<Option<FetchError>> {
    Arc::new(Selector::new("currency_error", currency, |c: &Arc<CurrencyState>| {
        c.error().cloned()
    }))
}

/// `true` while the rate is being fetched
#[must_use]
pub fn select_currency_loading() -> SharedSelector<bool> {
    Arc::new(Selector::new("currency_loading", currency, |c: &Arc<CurrencyState>| {
        c.is_loading()
    }))
}

/// Items grouped per store, stores in order of first appearance
#[must_use]
pub fn select_by_store() -> SharedSelector<Vec<StoreData>> {
    Arc::new(Selector::new("by_store", items, |items: &Arc<ItemsState>| {
        let mut rows: Vec<StoreData> = Vec::new();
        for item in items.iter() {
            match rows.iter_mut().find(|row| row.store == item.store) {
                Some(row) => {
                    row.sum += item.price_usd;
                    row.quantity += 1;
                },
                None => rows.push(StoreData {
                    store: item.store.clone(),
                    sum: item.price_usd,
                    quantity: 1,
                }),
            }
        }
        rows
    }))
}

/// Total spent at `store` in US dollars, 0 when no item was bought there
#[must_use]
pub fn select_total_price_for_store(store: impl Into<String>) -> SharedSelector<f64> {
    total_price_for_store_from(select_by_store(), store.into())
}

fn total_price_for_store_from(by_store: SharedSelector<Vec<StoreData>>, store: String) -> SharedSelector<f64> {
    Arc::new(Selector::new(
        format!("total_price_for_store({store})"),
        move |state: &AppState| by_store.select(state),
        move |rows: &Arc<Vec<StoreData>>| {
            rows.iter()
                .find(|row| row.store == store)
                .map_or(0.0, |row| row.sum)
        },
    ))
}

/// Total over all stores, in US dollars and at the active rate
#[must_use]
pub fn select_grand_total() -> SharedSelector<GrandTotal> {
    grand_total_from(select_by_store())
}

fn grand_total_from(by_store: SharedSelector<Vec<StoreData>>) -> SharedSelector<GrandTotal> {
    Arc::new(Selector::new(
        "grand_total",
        move |state: &AppState| (by_store.select(state), currency(state)),
        |(rows, currency): &(Arc<Vec<StoreData>>, Arc<CurrencyState>)| {
            let usd: f64 = rows.iter().map(|row| row.sum).sum();
            let rate: &CurrencyRate = currency.value();
            GrandTotal {
                usd,
                converted: rate.convert(usd),
                currency: rate.currency,
            }
        },
    ))
}

/// Items with prices converted to the display currency
#[must_use]
pub fn select_items_in_currency() -> SharedSelector<Vec<PricedItem>> {
    Arc::new(Selector::new(
        "items_in_currency",
        |state: &AppState| (items(state), currency(state)),
        |(items, currency): &(Arc<ItemsState>, Arc<CurrencyState>)| {
            let rate = currency.value();
            items
                .iter()
                .map(|item| PricedItem {
                    item: item.clone(),
                    price: rate.convert(item.price_usd),
                    currency: rate.currency,
                })
                .collect()
        },
    ))
}

/// One instance of every selector, with derived selectors sharing their upstreams
#[derive(Clone)]
pub struct AppSelectors {
    /// [`select_items`]
    pub items: SharedSelector<Vec<Item>>,
    /// [`select_products`]
    pub products: SharedSelector<Vec<Product>>,
    /// [`select_fetch_products_error`]
    pub fetch_products_error: SharedSelector<Option<FetchError>>,
    /// [`select_products_loading`]
    pub products_loading: SharedSelector<bool>,
    /// [`select_product_titles`]
    pub product_titles: SharedSelector<Vec<String>>,
    /// [`select_currency_type`]
    pub currency_type: SharedSelector<CurrencyCode>,
    /// [`select_exchange_rate`]
    pub exchange_rate: SharedSelector<f64>,
    /// [`select_currency_error`]
    pub currency_error: SharedSelector<Option<FetchError>>,
    /// [`select_currency_loading`]
    pub currency_loading: SharedSelector<bool>,
    /// [`select_by_store`]
    pub by_store: SharedSelector<Vec<StoreData>>,
    /// [`select_grand_total`]
    pub grand_total: SharedSelector<GrandTotal>,
    /// [`select_items_in_currency`]
    pub items_in_currency: SharedSelector<Vec<PricedItem>>,
}

impl AppSelectors {
    /// Build every selector
    #[must_use]
    pub fn new() -> Self {
        let by_store = select_by_store();
        Self {
            items: select_items(),
            products: select_products(),
            fetch_products_error: select_fetch_products_error(),
            products_loading: select_products_loading(),
            product_titles: select_product_titles(),
            currency_type: select_currency_type(),
            exchange_rate: select_exchange_rate(),
            currency_error: select_currency_error(),
            currency_loading: select_currency_loading(),
            grand_total: grand_total_from(Arc::clone(&by_store)),
            by_store,
            items_in_currency: select_items_in_currency(),
        }
    }

    /// [`select_total_price_for_store`] reading this bundle's `by_store`
    #[must_use]
    pub fn total_price_for_store(&self, store: impl Into<String>) -> SharedSelector<f64> {
        total_price_for_store_from(Arc::clone(&self.by_store), store.into())
    }

    /// [`select_matching_titles`] reading this bundle's `product_titles`
    #[must_use]
    pub fn matching_titles(&self, query: impl Into<String>) -> SharedSelector<Vec<String>> {
        matching_titles_from(Arc::clone(&self.product_titles), query.into())
    }
}

impl Default for AppSelectors {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AppSelectors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppSelectors").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Rating;
    use shoptrack_core::Resource;
    use shoptrack_testing::test_clock;
    use shoptrack_core::environment::Clock;

    fn item(store: &str, price: f64) -> Item {
        Item {
            name: format!("{store} item"),
            store: store.to_string(),
            price_usd: price,
            estimated_delivery: "01-Jan-2025".to_string(),
        }
    }

    fn product(title: &str) -> Product {
        Product {
            id: 1,
            title: title.to_string(),
            description: String::new(),
            category: String::new(),
            price: 1.0,
            image: String::new(),
            rating: Rating { rate: 1.0, count: 1 },
        }
    }

    fn with_products(titles: &[&str]) -> AppState {
        let mut products = Resource::default();
        products.succeed(titles.iter().map(|t| product(t)).collect(), test_clock().now());
        AppState {
            products: Arc::new(products),
            ..AppState::initial()
        }
    }

    fn at_rate(state: &AppState, currency: CurrencyCode, rate: f64) -> AppState {
        let mut slice = Resource::default();
        slice.succeed(CurrencyRate { currency, rate }, test_clock().now());
        AppState {
            currency: Arc::new(slice),
            ..state.clone()
        }
    }

    #[test]
    fn test_selectors_on_initial_state() {
        let selectors = AppSelectors::new();
        let state = AppState::initial();

        assert!(selectors.items.select(&state).is_empty());
        assert!(selectors.products.select(&state).is_empty());
        assert_eq!(*selectors.fetch_products_error.select(&state), None);
        assert!(!*selectors.products_loading.select(&state));
        assert_eq!(*selectors.currency_type.select(&state), CurrencyCode::Usd);
        assert!((*selectors.exchange_rate.select(&state) - 1.0).abs() < f64::EPSILON);
        assert!(selectors.by_store.select(&state).is_empty());
        assert!(selectors.grand_total.select(&state).usd.abs() < f64::EPSILON);
        assert!(selectors.total_price_for_store("Nowhere").select(&state).abs() < f64::EPSILON);
    }

    #[test]
    fn test_by_store_groups_in_first_seen_order() {
        let state = AppState::with_items(vec![item("B", 7.0), item("A", 10.0), item("B", 3.0)]);
        let rows = select_by_store().select(&state);
        assert_eq!(
            *rows,
            vec![
                StoreData {
                    store: "B".to_string(),
                    sum: 10.0,
                    quantity: 2,
                },
                StoreData {
                    store: "A".to_string(),
                    sum: 10.0,
                    quantity: 1,
                },
            ]
        );
    }

    #[test]
    fn test_total_price_for_store() {
        let state = AppState::with_items(vec![item("A", 10.0), item("A", 5.0), item("B", 7.0)]);
        let selectors = AppSelectors::new();

        assert!((*selectors.total_price_for_store("A").select(&state) - 15.0).abs() < 1e-9);
        assert!((*select_total_price_for_store("B").select(&state) - 7.0).abs() < 1e-9);
        assert!(select_total_price_for_store("C").select(&state).abs() < f64::EPSILON);
    }

    #[test]
    fn test_same_snapshot_same_output() {
        let state = with_products(&["Backpack"]);
        let selector = select_products();
        let first = selector.select(&state);
        let second = selector.select(&state);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_derived_selectors_skip_unrelated_changes() {
        let selectors = AppSelectors::new();
        let state = AppState::with_items(vec![item("A", 10.0)]);
        let rows = selectors.by_store.select(&state);
        let items = selectors.items_in_currency.select(&state);

        let reloaded = with_products(&["Backpack"]);
        let unrelated = AppState {
            products: Arc::clone(&reloaded.products),
            ..state.clone()
        };
        assert!(Arc::ptr_eq(&rows, &selectors.by_store.select(&unrelated)));
        assert!(Arc::ptr_eq(&items, &selectors.items_in_currency.select(&unrelated)));

        let converted = at_rate(&unrelated, CurrencyCode::Eur, 0.5);
        assert!(Arc::ptr_eq(&rows, &selectors.by_store.select(&converted)));
        assert!(!Arc::ptr_eq(&items, &selectors.items_in_currency.select(&converted)));
    }

    #[test]
    fn test_currency_conversion() {
        let state = at_rate(
            &AppState::with_items(vec![item("A", 10.0), item("B", 30.0)]),
            CurrencyCode::Eur,
            0.9,
        );

        let total = select_grand_total().select(&state);
        assert!((total.usd - 40.0).abs() < 1e-9);
        assert!((total.converted - 36.0).abs() < 1e-9);
        assert_eq!(total.currency, CurrencyCode::Eur);

        let priced = select_items_in_currency().select(&state);
        assert!((priced[0].price - 9.0).abs() < 1e-9);
        assert_eq!(priced[1].currency, CurrencyCode::Eur);
    }

    #[test]
    fn test_matching_titles_ignores_case() {
        let state = with_products(&["Mens Cotton Jacket", "Womens Rain Jacket", "Backpack"]);
        let selectors = AppSelectors::new();

        assert_eq!(
            *selectors.matching_titles("JACKET").select(&state),
            vec!["Mens Cotton Jacket".to_string(), "Womens Rain Jacket".to_string()]
        );
        assert_eq!(select_matching_titles("  ").select(&state).len(), 3);
        assert!(select_matching_titles("lamp").select(&state).is_empty());
    }
}
