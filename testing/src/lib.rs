//! # Shoptrack Testing
//!
//! Testing utilities for the Shoptrack state engine.
//!
//! This crate provides:
//! - [`ReducerTest`]: Given-When-Then builder for reducers
//! - Effect assertions and [`helpers::collect_actions`] to run effects without a store
//! - Deterministic clocks
//! - Tracing setup for tests
//!
//! ## Example
//!
//! ```ignore
//! use shoptrack_testing::{ReducerTest, test_clock};
//!
//! ReducerTest::new(ItemsReducer)
//!     .with_env(test_environment())
//!     .given_state(ItemsState::default())
//!     .when_action(AppAction::Add { item })
//!     .then_state(|items| assert_eq!(items.len(), 1))
//!     .run();
//! ```

use chrono::{DateTime, Duration, Utc};
use shoptrack_core::environment::Clock;


pub use reducer_test::{ReducerTest, assertions};

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Duration, Utc};
    use std::sync::Mutex;

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use shoptrack_testing::mocks::FixedClock;
    /// use shoptrack_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock that moves forward by a fixed step on every reading
    ///
    /// Useful when a test needs to tell two successful fetches apart by
    /// their timestamps.
    #[derive(Debug)]
    pub struct SteppingClock {
        next: Mutex<DateTime<Utc>>,
        step: Duration,
    }

    impl SteppingClock {
        /// Start at `start`, advancing by `step` after each reading
        #[must_use]
        pub const fn new(start: DateTime<Utc>, step: Duration) -> Self {
            Self {
                next: Mutex::new(start),
                step,
            }
        }
    }

    impl Clock for SteppingClock {
        fn now(&self) -> DateTime<Utc> {
            let mut next = match self.next.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let now = *next;
            *next = now + self.step;
            now
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(DateTime::from_timestamp(1_735_689_600, 0).unwrap_or_default())
    }
}

/// Test helpers and utilities
pub mod helpers {
    use futures::future::BoxFuture;
    use shoptrack_core::effect::Effect;

    /// Run effect descriptions to completion and collect the actions they produce.
    ///
    /// Effects run one after another in the order given, so the result is
    /// deterministic even for [`Effect::Parallel`]. Delays are honoured.
    pub fn collect_actions<A>(effects: Vec<Effect<A>>) -> BoxFuture<'static, Vec<A>>
    where
        A: Send + 'static,
    {
        Box::pin(async move {
            let mut actions = Vec::new();
            for effect in effects {
                match effect {
                    Effect::None => {},
                    Effect::Future(fut) => actions.extend(fut.await),
                    Effect::Delay { duration, action } => {
                        tokio::time::sleep(duration).await;
                        actions.push(*action);
                    },
                    Effect::Parallel(inner) | Effect::Sequential(inner) => {
                        actions.extend(collect_actions(inner).await);
                    },
                }
            }
            actions
        })
    }

    /// Install a test-friendly tracing subscriber
    ///
    /// Honours `RUST_LOG`; safe to call from every test.
    pub fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }
}

/// Property-based testing utilities
pub mod properties {
    use proptest::prelude::*;

    /// Non-empty printable names (store names, product titles)
    pub fn name() -> impl Strategy<Value = String> {
        "[A-Za-z][A-Za-z0-9 ]{0,15}"
    }

    /// Strictly positive, finite amounts with cent precision
    pub fn positive_amount() -> impl Strategy<Value = f64> {
        (1_u32..1_000_000).prop_map(|cents| f64::from(cents) / 100.0)
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, SteppingClock, test_clock};
