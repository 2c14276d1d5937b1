//! The action vocabulary.
//!
//! Views dispatch the request variants; the effects engine answers fetch
//! requests with the matching success or failure variant.

use crate::models::{CurrencyRate, FetchError, Item, Product};
use serde::{Deserialize, Serialize};

/// Everything that can happen to the tracker state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum AppAction {
    /// Append a validated item
    Add {
        /// The new item
        item: Item,
    },

    /// Replace the item at `index`
    Update {
        /// Position in the item list
        index: usize,
        /// Replacement
        item: Item,
    },

    /// Remove the item at `index`
    Remove {
        /// Position in the item list
        index: usize,
    },

    /// Request the product catalog
    FetchProducts,

    /// The catalog arrived
    FetchProductsSuccess {
        /// Full catalog, replacing the previous one
        products: Vec<Product>,
    },

    /// The catalog request failed
    FetchProductsFailure {
        /// Cause
        error: FetchError,
    },

    /// Request the exchange rate for the configured currency
    FetchExchangeRate,

    /// The exchange rate arrived
    FetchExchangeRateSuccess {
        /// New active rate
        rate: CurrencyRate,
    },

    /// The exchange rate request failed
    FetchExchangeRateFailure {
        /// Cause
        error: FetchError,
    },

    /// Go back to US dollars
    ResetCurrency,
}

impl AppAction {
    /// `true` for actions that start a fetch
    #[must_use]
    pub const fn is_request(&self) -> bool {
        matches!(self, Self::FetchProducts | Self::FetchExchangeRate)
    }

    /// Stable kind name for logs
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Add { .. } => "[Items] Add",
            Self::Update { .. } => "[Items] Update",
            Self::Remove { .. } => "[Items] Remove",
            Self::FetchProducts => "[Products] Fetch",
            Self::FetchProductsSuccess { .. } => "[Products] Fetch Success",
            Self::FetchProductsFailure { .. } => "[Products] Fetch Failure",
            Self::FetchExchangeRate => "[Currency] Fetch Rate",
            Self::FetchExchangeRateSuccess { .. } => "[Currency] Fetch Rate Success",
            Self::FetchExchangeRateFailure { .. } => "[Currency] Fetch Rate Failure",
            Self::ResetCurrency => "[Currency] Reset",
        }
    }
}
