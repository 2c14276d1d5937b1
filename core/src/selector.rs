//! Memoized selectors.
//!
//! A [`Selector`] projects a snapshot into a view value in two steps:
//!
//! 1. an *input* function picks the shared pieces it depends on (slice `Arc`s,
//!    or the output of another selector);
//! 2. a *projection* derives the view value from those pieces.
//!
//! The output is cached against the identity of the inputs. As long as the
//! same `Arc`s come back from the input function, [`Select::select`] hands out
//! the same `Arc<T>` without running the projection. The cache keeps `Weak`
//! handles only, so a selector never keeps an old slice alive.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use shoptrack_core::selector::{Select, Selector};
//!
//! #[derive(Clone, Default)]
//! struct Snapshot {
//!     prices: Arc<Vec<u32>>,
//! }
//!
//! let total = Selector::new(
//!     "total",
//!     |s: &Snapshot| Arc::clone(&s.prices),
//!     |prices: &Arc<Vec<u32>>| prices.iter().sum::<u32>(),
//! );
//!
//! let snapshot = Snapshot { prices: Arc::new(vec![2, 3]) };
//! let first = total.select(&snapshot);
//! let second = total.select(&snapshot);
//! assert_eq!(*first, 5);
//! assert!(Arc::ptr_eq(&first, &second));
//! ```

use std::sync::{Arc, Mutex, MutexGuard, Weak};

/// Something a selector can depend on, compared by identity.
pub trait SelectorInput {
    /// Non-owning identity of the input
    type Key: Send;

    /// Record the identity of this input
    fn key(&self) -> Self::Key;

    /// `true` if this input is the one recorded in `key`
    fn matches(&self, key: &Self::Key) -> bool;
}

impl<A> SelectorInput for Arc<A>
where
    A: Send + Sync,
{
    type Key = Weak<A>;

    fn key(&self) -> Self::Key {
        Arc::downgrade(self)
    }

    fn matches(&self, key: &Self::Key) -> bool {
        // The Weak keeps the allocation reserved, so the address cannot be reused.
        std::ptr::eq(Arc::as_ptr(self), key.as_ptr())
    }
}

impl<A, B> SelectorInput for (A, B)
where
    A: SelectorInput,
    B: SelectorInput,
{
    type Key = (A::Key, B::Key);

    fn key(&self) -> Self::Key {
        (self.0.key(), self.1.key())
    }

    fn matches(&self, key: &Self::Key) -> bool {
        self.0.matches(&key.0) && self.1.matches(&key.1)
    }
}

/// Projection from a snapshot `S` to a shared view value.
pub trait Select<S>: Send + Sync {
    /// The derived value
    type Output;

    /// Derive (or reuse) the value for `state`
    fn select(&self, state: &S) -> Arc<Self::Output>;

    /// Name used in logs
    fn name(&self) -> &str;
}

type InputFn<S, I> = Box<dyn Fn(&S) -> I + Send + Sync>;
type ProjectFn<I, T> = Box<dyn Fn(&I) -> T + Send + Sync>;

struct Memo<K, T> {
    key: K,
    output: Arc<T>,
}

/// A memoized selector.
///
/// See the [module documentation](self).
pub struct Selector<S, I: SelectorInput, T> {
    name: String,
    input: InputFn<S, I>,
    project: ProjectFn<I, T>,
    memo: Mutex<Option<Memo<I::Key, T>>>,
}

impl<S, I, T> Selector<S, I, T>
where
    I: SelectorInput,
{
    /// Build a selector from an input function and a projection
    pub fn new<F, P>(name: impl Into<String>, input: F, project: P) -> Self
    where
        F: Fn(&S) -> I + Send + Sync + 'static,
        P: Fn(&I) -> T + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            input: Box::new(input),
            project: Box::new(project),
            memo: Mutex::new(None),
        }
    }

    /// Forget the cached output
    pub fn reset(&self) {
        *self.lock() = None;
    }

    fn lock(&self) -> MutexGuard<'_, Option<Memo<I::Key, T>>> {
        // A panic inside a projection cannot leave the memo half-written.
        match self.memo.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<S, I, T> Select<S> for Selector<S, I, T>
where
    I: SelectorInput,
    T: Send + Sync,
{
    type Output = T;

    fn select(&self, state: &S) -> Arc<T> {
        let input = (self.input)(state);
        let mut memo = self.lock();

        if let Some(cached) = memo.as_ref() {
            if input.matches(&cached.key) {
                return Arc::clone(&cached.output);
            }
        }

        let output = Arc::new((self.project)(&input));
        *memo = Some(Memo {
            key: input.key(),
            output: Arc::clone(&output),
        });
        output
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl<S, I, T> std::fmt::Debug for Selector<S, I, T>
where
    I: SelectorInput,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Selector")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
