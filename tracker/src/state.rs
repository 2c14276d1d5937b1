//! The state tree.
//!
//! Each slice sits behind its own `Arc`. A dispatch clones the tree (three
//! pointer copies) and only the slice whose reducer handles the action is
//! replaced, so selectors can tell changed slices apart by identity.

use crate::models::{CurrencyRate, FetchError, Item, Product};
use shoptrack_core::Resource;
use std::sync::Arc;

/// Items in insertion order
pub type ItemsState = Vec<Item>;

/// Catalog mirror with its request status
pub type ProductsState = Resource<Vec<Product>, FetchError>;

/// Active exchange rate with its request status
pub type CurrencyState = Resource<CurrencyRate, FetchError>;

/// Immutable snapshot of the whole application
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    /// User items
    pub items: Arc<ItemsState>,
    /// Catalog products
    pub products: Arc<ProductsState>,
    /// Display currency
    pub currency: Arc<CurrencyState>,
}

impl AppState {
    /// Empty items, empty idle catalog, idle USD at rate 1
    #[must_use]
    pub fn initial() -> Self {
        Self::default()
    }

    /// Snapshot seeded with `items`
    #[must_use]
    pub fn with_items(items: ItemsState) -> Self {
        Self {
            items: Arc::new(items),
            ..Self::default()
        }
    }

    /// `true` if every slice is the same allocation in both snapshots
    #[must_use]
    pub fn shares_slices_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.items, &other.items)
            && Arc::ptr_eq(&self.products, &other.products)
            && Arc::ptr_eq(&self.currency, &other.currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CurrencyCode;
    use shoptrack_core::LoadStatus;

    #[test]
    fn test_initial_state() {
        let state = AppState::initial();
        assert!(state.items.is_empty());
        assert!(state.products.value().is_empty());
        assert_eq!(state.products.status(), &LoadStatus::Idle);
        assert_eq!(state.currency.value().currency, CurrencyCode::Usd);
        assert!((state.currency.value().rate - 1.0).abs() < f64::EPSILON);
        assert!(!state.currency.is_loading());
        assert!(state.currency.error().is_none());
    }

    #[test]
    fn test_clone_shares_slices() {
        let state = AppState::initial();
        let copy = state.clone();
        assert!(state.shares_slices_with(&copy));
        assert!(!state.shares_slices_with(&AppState::initial()));
    }
}
