//! Async resource lifecycle.
//!
//! Every slice backed by a remote fetch goes through the same machine:
//!
//! ```text
//! Idle ──start──▶ Loading ──succeed──▶ Loaded
//!                    │
//!                    └────fail──────▶ Failed(E)
//! ```
//!
//! Any transition is accepted from any status, so a new request may start
//! while another is in flight. `Loading` and `Failed` are distinct variants,
//! which makes "loading with an error" unrepresentable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a resource stands in its request cycle.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum LoadStatus<E> {
    /// Never requested, or reset
    #[default]
    Idle,
    /// A request is in flight
    Loading,
    /// The last request succeeded
    Loaded,
    /// The last request failed
    Failed(E),
}

/// A value together with the status of the request that produces it.
///
/// A failed request keeps the previous value (stale-but-available).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource<T, E> {
    value: T,
    status: LoadStatus<E>,
    updated_at: Option<DateTime<Utc>>,
}

impl<T, E> Resource<T, E> {
    /// Create an idle resource holding `value`
    #[must_use]
    pub const fn new(value: T) -> Self {
        Self {
            value,
            status: LoadStatus::Idle,
            updated_at: None,
        }
    }

    /// Current value (possibly stale after a failure)
    pub const fn value(&self) -> &T {
        &self.value
    }

    /// Current status
    pub const fn status(&self) -> &LoadStatus<E> {
        &self.status
    }

    /// `true` while a request is in flight
    pub const fn is_loading(&self) -> bool {
        matches!(self.status, LoadStatus::Loading)
    }

    /// Error of the last request, if it failed
    pub const fn error(&self) -> Option<&E> {
        match &self.status {
            LoadStatus::Failed(error) => Some(error),
            _ => None,
        }
    }

    /// When the value was last replaced by a successful request
    pub const fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// A request started; clears any previous error
    pub fn start(&mut self) {
        self.status = LoadStatus::Loading;
    }

    /// A request succeeded with `value` at `at`
    pub fn succeed(&mut self, value: T, at: DateTime<Utc>) {
        self.value = value;
        self.status = LoadStatus::Loaded;
        self.updated_at = Some(at);
    }

    /// A request failed; the value is left untouched
    pub fn fail(&mut self, error: E) {
        self.status = LoadStatus::Failed(error);
    }

    /// Replace the value and go back to idle
    pub fn reset(&mut self, value: T) {
        self.value = value;
        self.status = LoadStatus::Idle;
        self.updated_at = None;
    }
}

impl<T: Default, E> Default for Resource<T, E> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
