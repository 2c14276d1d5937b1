//! Item form validation.
//!
//! Invalid input never reaches the store: a draft either becomes an
//! [`Item`] ready for [`AppAction::Add`](crate::actions::AppAction::Add)
//! or a [`ValidationError`] to show the user.

use crate::models::{DELIVERY_DATE_FORMAT, Item};
use chrono::NaiveDate;

/// Date formats accepted from the form, tried in order
const INPUT_DATE_FORMATS: [&str; 3] = [DELIVERY_DATE_FORMAT, "%Y-%m-%d", "%d/%m/%Y"];

/// Why a draft was rejected
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Neither a name nor a catalog selection was given
    #[error("item name is required")]
    MissingName,

    /// No store was given
    #[error("store is required")]
    MissingStore,

    /// The price is zero, negative or not a number
    #[error("price must be a positive amount, got {0}")]
    InvalidPrice(f64),

    /// No delivery date was given
    #[error("estimated delivery date is required")]
    MissingDeliveryDate,

    /// The delivery date does not parse
    #[error("unrecognised delivery date: {0}")]
    InvalidDeliveryDate(String),
}

/// Raw contents of the add/edit item form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemDraft {
    /// Free-text name
    pub name: String,
    /// Title picked from the catalog autocomplete, used when `name` is blank
    pub catalog_title: Option<String>,
    /// Store
    pub store: String,
    /// Price in US dollars
    pub price_usd: f64,
    /// Delivery date as typed (`05-Mar-2024`, `2024-03-05` or `05/03/2024`)
    pub estimated_delivery: String,
}

impl ItemDraft {
    /// Draft pre-filled from an existing item, for editing
    #[must_use]
    pub fn from_item(item: &Item) -> Self {
        Self {
            name: item.name.clone(),
            catalog_title: None,
            store: item.store.clone(),
            price_usd: item.price_usd,
            estimated_delivery: item.estimated_delivery.clone(),
        }
    }

    /// Check every field and build the item.
    ///
    /// Text fields are trimmed and the delivery date is normalised to
    /// `DD-MMM-YYYY`.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found, in form order.
    pub fn validate(&self) -> Result<Item, ValidationError> {
        let name = Some(self.name.trim())
            .filter(|n| !n.is_empty())
            .or_else(|| self.catalog_title.as_deref().map(str::trim).filter(|n| !n.is_empty()))
            .ok_or(ValidationError::MissingName)?;

        let store = self.store.trim();
        if store.is_empty() {
            return Err(ValidationError::MissingStore);
        }

        if !self.price_usd.is_finite() || self.price_usd <= 0.0 {
            return Err(ValidationError::InvalidPrice(self.price_usd));
        }

        let delivery = parse_delivery_date(&self.estimated_delivery)?;

        Ok(Item {
            name: name.to_string(),
            store: store.to_string(),
            price_usd: self.price_usd,
            estimated_delivery: format_delivery_date(delivery),
        })
    }
}

/// Parse a delivery date typed in any accepted format
///
/// # Errors
///
/// [`ValidationError::MissingDeliveryDate`] for blank input,
/// [`ValidationError::InvalidDeliveryDate`] when no format matches.
pub fn parse_delivery_date(input: &str) -> Result<NaiveDate, ValidationError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ValidationError::MissingDeliveryDate);
    }
    INPUT_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(input, format).ok())
        .ok_or_else(|| ValidationError::InvalidDeliveryDate(input.to_string()))
}

/// Format a date the way items store it (`05-Mar-2024`)
#[must_use]
pub fn format_delivery_date(date: NaiveDate) -> String {
    date.format(DELIVERY_DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn draft() -> ItemDraft {
        ItemDraft {
            name: "Kettle".to_string(),
            catalog_title: None,
            store: "Amazon".to_string(),
            price_usd: 25.5,
            estimated_delivery: "2024-03-05".to_string(),
        }
    }

    #[test]
    fn test_valid_draft_normalises_date() {
        let item = draft().validate();
        assert_eq!(
            item,
            Ok(Item {
                name: "Kettle".to_string(),
                store: "Amazon".to_string(),
                price_usd: 25.5,
                estimated_delivery: "05-Mar-2024".to_string(),
            })
        );
    }

    #[test]
    fn test_name_falls_back_to_catalog_title() {
        let item = ItemDraft {
            name: "   ".to_string(),
            catalog_title: Some("Mens Casual Slim Fit".to_string()),
            ..draft()
        }
        .validate();
        assert_eq!(item.map(|i| i.name), Ok("Mens Casual Slim Fit".to_string()));
    }

    #[test]
    fn test_rejects_each_missing_field() {
        let blank_name = ItemDraft {
            name: String::new(),
            ..draft()
        };
        assert_eq!(blank_name.validate(), Err(ValidationError::MissingName));

        let blank_store = ItemDraft {
            store: " ".to_string(),
            ..draft()
        };
        assert_eq!(blank_store.validate(), Err(ValidationError::MissingStore));

        let free = ItemDraft {
            price_usd: 0.0,
            ..draft()
        };
        assert_eq!(free.validate(), Err(ValidationError::InvalidPrice(0.0)));

        let no_date = ItemDraft {
            estimated_delivery: String::new(),
            ..draft()
        };
        assert_eq!(no_date.validate(), Err(ValidationError::MissingDeliveryDate));

        let bad_date = ItemDraft {
            estimated_delivery: "next tuesday".to_string(),
            ..draft()
        };
        assert_eq!(
            bad_date.validate(),
            Err(ValidationError::InvalidDeliveryDate("next tuesday".to_string()))
        );
    }

    #[test]
    fn test_rejects_nan_price() {
        let draft = ItemDraft {
            price_usd: f64::NAN,
            ..draft()
        };
        assert!(matches!(draft.validate(), Err(ValidationError::InvalidPrice(p)) if p.is_nan()));
    }

    #[test]
    fn test_edit_round_trip() {
        let item = draft().validate().unwrap_or_else(|_| unreachable!());
        assert_eq!(ItemDraft::from_item(&item).validate(), Ok(item));
    }

    #[test]
    fn test_accepts_every_input_format() {
        let expected = NaiveDate::from_ymd_opt(2024, 12, 31);
        for input in ["31-Dec-2024", "2024-12-31", "31/12/2024"] {
            assert_eq!(parse_delivery_date(input).ok(), expected, "{input}");
        }
    }

    proptest! {
        #[test]
        fn non_positive_prices_are_rejected(price in -1_000_000.0_f64..=0.0) {
            let draft = ItemDraft { price_usd: price, ..draft() };
            prop_assert_eq!(draft.validate(), Err(ValidationError::InvalidPrice(price)));
        }

        #[test]
        fn dates_round_trip(days in 0_i64..40_000) {
            let date = NaiveDate::from_ymd_opt(1970, 1, 1)
                .and_then(|d| d.checked_add_signed(chrono::Duration::days(days)));
            prop_assume!(date.is_some());
            let date = date.unwrap_or_default();
            prop_assert_eq!(parse_delivery_date(&format_delivery_date(date)), Ok(date));
        }
    }
}
