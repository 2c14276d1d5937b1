//! Bounded retries with exponential backoff.
//!
//! Effects wrap their capability calls in [`retry_when`] so that transient
//! failures (a dropped connection, a 503) are retried a bounded number of
//! times before a failure action is dispatched. Only errors accepted by the
//! caller's predicate are retried; anything else fails immediately.
//!
//! # Example
//!
//! ```rust
//! use shoptrack_runtime::retry::{RetryPolicy, retry_when};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), String> {
//! let policy = RetryPolicy::none()
//!     .with_max_retries(2)
//!     .with_initial_delay(Duration::from_millis(50));
//!
//! let rate = retry_when(
//!     &policy,
//!     || async { Ok::<_, String>(0.9) },
//!     |err: &String| err.contains("unavailable"),
//! )
//! .await?;
//! assert!((rate - 0.9_f64).abs() < f64::EPSILON);
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::time::Duration;

/// How often and how patiently to retry.
///
/// The default performs no retries: one attempt, then the error is reported.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Growth factor applied per retry
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

impl RetryPolicy {
    /// A single attempt, no retries
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            multiplier: 2.0,
        }
    }

    /// Set the number of retries
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the delay before the first retry
    #[must_use]
    pub const fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the delay cap
    #[must_use]
    pub const fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the growth factor
    #[must_use]
    pub const fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Total attempts this policy allows
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retry number `retry` (zero-based), capped at `max_delay`
    #[must_use]
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let factor = self.multiplier.max(1.0).powi(i32::try_from(retry).unwrap_or(i32::MAX));
        let scaled = self.initial_delay.as_secs_f64() * factor;
        if !scaled.is_finite() || scaled >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }
        Duration::from_secs_f64(scaled)
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// the policy is exhausted.
///
/// Returns the error of the last attempt.
///
/// # Errors
///
/// The error of the final attempt when no attempt succeeded.
pub async fn retry_when<F, Fut, T, E, P>(
    policy: &RetryPolicy,
    mut operation: F,
    is_retryable: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let mut retry = 0;

    loop {
        match operation().await {
            Ok(value) => {
                if retry > 0 {
                    tracing::info!(retries = retry, "Operation succeeded after retry");
                    metrics::counter!("effects.retry.recovered").increment(1);
                }
                return Ok(value);
            },
            Err(error) if !is_retryable(&error) => {
                tracing::debug!(error = %error, "Error is not retryable");
                return Err(error);
            },
            Err(error) if retry >= policy.max_retries => {
                if policy.max_retries > 0 {
                    tracing::warn!(retries = retry, error = %error, "Retries exhausted");
                    metrics::counter!("effects.retry.exhausted").increment(1);
                }
                return Err(error);
            },
            Err(error) => {
                let delay = policy.delay_for_retry(retry);
                tracing::warn!(
                    retry = retry + 1,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %error,
                    "Operation failed, retrying"
                );
                tokio::time::sleep(delay).await;
                retry += 1;
            },
        }
    }
}
