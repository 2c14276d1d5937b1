//! Entity models: items, catalog products, exchange rates and fetch errors.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Display and storage format of delivery dates (`05-Mar-2024`)
pub const DELIVERY_DATE_FORMAT: &str = "%d-%b-%Y";

/// A tracked purchase.
///
/// Built by [`ItemDraft::validate`](crate::validation::ItemDraft::validate);
/// the reducers assume every field is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// What was bought
    pub name: String,
    /// Where it was bought
    pub store: String,
    /// Price in US dollars, always positive
    #[serde(rename = "priceUSD")]
    pub price_usd: f64,
    /// Expected delivery, formatted as `DD-MMM-YYYY`
    #[serde(rename = "estimatedDelivery")]
    pub estimated_delivery: String,
}

impl Item {
    /// Parse the delivery date back into a calendar date
    #[must_use]
    pub fn delivery_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.estimated_delivery, DELIVERY_DATE_FORMAT).ok()
    }
}

/// Customer rating of a catalog product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    /// Average score
    pub rate: f64,
    /// Number of votes
    pub count: u64,
}

/// A product from the upstream catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Catalog identifier
    pub id: u64,
    /// Display title, also offered as an item name
    pub title: String,
    /// Long description
    #[serde(default)]
    pub description: String,
    /// Catalog category
    #[serde(default)]
    pub category: String,
    /// Listed price in US dollars
    pub price: f64,
    /// Image URL
    #[serde(default)]
    pub image: String,
    /// Customer rating
    pub rating: Rating,
}

/// Currencies prices can be shown in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CurrencyCode {
    /// US dollar, the currency prices are entered in
    #[default]
    Usd,
    /// Euro
    Eur,
    /// Pound sterling
    Gbp,
    /// Israeli new shekel
    Ils,
    /// Japanese yen
    Jpy,
}

impl CurrencyCode {
    /// Every supported code
    pub const ALL: [Self; 5] = [Self::Usd, Self::Eur, Self::Gbp, Self::Ils, Self::Jpy];

    /// ISO 4217 code
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
            Self::Ils => "ILS",
            Self::Jpy => "JPY",
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Unknown currency code
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported currency code: {0}")]
pub struct UnknownCurrency(pub String);

impl FromStr for CurrencyCode {
    type Err = UnknownCurrency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(code))
            .ok_or_else(|| UnknownCurrency(code.to_string()))
    }
}

/// The active exchange rate from US dollars
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurrencyRate {
    /// Currency prices are converted to
    #[serde(rename = "type")]
    pub currency: CurrencyCode,
    /// Units of `currency` per US dollar
    pub rate: f64,
}

impl CurrencyRate {
    /// The identity rate
    #[must_use]
    pub const fn usd() -> Self {
        Self {
            currency: CurrencyCode::Usd,
            rate: 1.0,
        }
    }

    /// Convert a US dollar amount
    #[must_use]
    pub fn convert(&self, usd: f64) -> f64 {
        usd * self.rate
    }
}

impl Default for CurrencyRate {
    fn default() -> Self {
        Self::usd()
    }
}

/// Why a fetch failed.
///
/// Each variant carries the requested URL; [`status`](Self::status) is 0
/// unless the server answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FetchError {
    /// The request never got an answer
    #[error("request to {url} failed: {message}")]
    Transport {
        /// Requested URL
        url: String,
        /// Underlying cause
        message: String,
    },

    /// The server answered with a non-success status
    #[error("{url} answered {status}: {message}")]
    Http {
        /// Requested URL
        url: String,
        /// HTTP status code
        status: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// The answer could not be understood
    #[error("unexpected response from {url}: {message}")]
    Decode {
        /// Requested URL
        url: String,
        /// Parser message
        message: String,
    },
}

impl FetchError {
    /// Short name of the failure kind
    #[must_use]
    pub const fn error(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "Transport Error",
            Self::Http { .. } => "Http Error",
            Self::Decode { .. } => "Decode Error",
        }
    }

    /// Human-readable detail
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Transport { message, .. }
            | Self::Http { message, .. }
            | Self::Decode { message, .. } => message,
        }
    }

    /// Requested URL
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Transport { url, .. } | Self::Http { url, .. } | Self::Decode { url, .. } => url,
        }
    }

    /// HTTP status, 0 when the server never answered
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::Http { status, .. } => *status,
            Self::Transport { .. } | Self::Decode { .. } => 0,
        }
    }

    /// Transport failures, 5xx and 429 are worth another attempt
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Http { status, .. } => *status >= 500 || *status == 429,
            Self::Decode { .. } => false,
        }
    }
}
