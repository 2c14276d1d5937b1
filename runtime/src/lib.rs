//! # Shoptrack Runtime
//!
//! The Store: the single state container of an application.
//!
//! ## Core Components
//!
//! - **Store**: holds the current immutable snapshot, serializes dispatches,
//!   publishes every new snapshot and executes effects
//! - **Subscriptions**: scoped snapshot listeners and live selector views
//! - **Effect Executor**: runs effect descriptions and feeds their actions back
//!
//! ## Lifecycle
//!
//! A store is constructed once at application start with the initial
//! snapshot, the root reducer and the environment, then cloned into every
//! part of the application that needs it. [`Store::shutdown`] stops
//! accepting actions and waits for in-flight effects before the process
//! exits.
//!
//! ## Example
//!
//! ```ignore
//! use shoptrack_runtime::Store;
//!
//! let store = Store::new(initial_state, root_reducer, environment);
//!
//! // Dispatch an action
//! store.dispatch(Action::DoSomething).await?;
//!
//! // Read through a selector
//! let mut view = store.select(selector);
//! while let Some(value) = view.changed().await {
//!     render(&value);
//! }
//! ```

use shoptrack_core::{effect::Effect, reducer::Reducer};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::watch;

/// Retry logic with exponential backoff
pub mod retry;

/// Snapshot listeners and live selector views
pub mod subscription;

pub use subscription::{ListenerHandle, Selection};

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// Timeout waiting for a matching action
        #[error("Timeout waiting for action")]
        Timeout,

        /// Action broadcast channel closed
        #[error("Action broadcast channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;

/// Configuration for Store instances
///
/// # Example
///
/// ```
/// use shoptrack_runtime::StoreConfig;
/// use std::time::Duration;
///
/// let config = StoreConfig::default()
///     .with_broadcast_capacity(256)
///     .with_shutdown_timeout(Duration::from_secs(5));
/// assert_eq!(config.broadcast_capacity, 256);
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Number of actions buffered for each action observer
    pub broadcast_capacity: usize,
    /// Default timeout for graceful shutdown
    pub default_shutdown_timeout: Duration,
}

impl StoreConfig {
    /// Set the action broadcast capacity
    #[must_use]
    pub const fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity;
        self
    }

    /// Set the default shutdown timeout
    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.default_shutdown_timeout = timeout;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 64,
            default_shutdown_timeout: Duration::from_secs(30),
        }
    }
}

/// Handle for tracking effect completion
///
/// Returned by [`Store::dispatch()`]. Awaiting it waits for the effects
/// started by that dispatch, including the dispatch of the actions they
/// produce.
///
/// # Example
///
/// ```ignore
/// let mut handle = store.dispatch(Action::FetchProducts).await?;
/// handle.wait_with_timeout(Duration::from_secs(5)).await?;
/// // The success or failure action has been reduced
/// ```
#[derive(Clone)]
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    fn new() -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            effects: Arc::clone(&counter),
            completion: rx,
        };

        let tracking = EffectTracking {
            counter,
            notifier: Arc::new(tx),
        };

        (handle, tracking)
    }

    /// Create a handle that's already complete
    #[must_use]
    pub fn completed() -> Self {
        let (_tx, rx) = watch::channel(());

        Self {
            effects: Arc::new(AtomicUsize::new(0)),
            completion: rx,
        }
    }

    /// Number of effects still running
    #[must_use]
    pub fn pending(&self) -> usize {
        self.effects.load(Ordering::SeqCst)
    }

    /// Wait for all effects to complete
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                // Every tracker is gone, nothing can still be running
                break;
            }
        }
    }

    /// Wait for all effects to complete with a timeout
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if the timeout expires before all effects complete.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.effects.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Internal: effect counter shared between a handle and the tasks it tracks
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: Arc<watch::Sender<()>>,
}

impl EffectTracking {
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            // Counter reached zero, wake waiters
            self.notifier.send_replace(());
        }
    }
}

/// Internal: RAII guard that decrements the effect counter on drop
///
/// The counter is decremented even if the effect panics.
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Guard that decrements the store-wide pending counter on drop (for shutdown)
struct AtomicCounterGuard(Arc<AtomicUsize>);

impl Drop for AtomicCounterGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Store module - the state container
pub mod store {
    use super::{
        Arc, AtomicBool, AtomicCounterGuard, AtomicUsize, DecrementGuard, Duration, Effect,
        EffectHandle, EffectTracking, Ordering, Reducer, StoreConfig, StoreError,
    };
    use crate::subscription::{Listener, ListenerHandle, ListenerRegistry, Selection};
    use shoptrack_core::selector::Select;
    use tokio::sync::{Mutex, broadcast, watch};

    /// The Store - holds the current snapshot and runs the reducer
    ///
    /// The Store manages:
    /// 1. The current snapshot (`Arc<S>`, replaced wholesale on every dispatch)
    /// 2. The root reducer and the injected environment
    /// 3. Listeners and selector views
    /// 4. Effect execution (with feedback loop)
    ///
    /// Cloning a store is cheap; clones share everything.
    ///
    /// # Type Parameters
    ///
    /// - `S`: State (snapshot) type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        snapshot: Arc<watch::Sender<Arc<S>>>,
        dispatch_lock: Arc<Mutex<()>>,
        listeners: Arc<ListenerRegistry<S>>,
        reducer: Arc<R>,
        environment: Arc<E>,
        config: StoreConfig,
        shutdown: Arc<AtomicBool>,
        pending_effects: Arc<AtomicUsize>,
        /// Every dispatched action, in dispatch order, after it has been reduced.
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Clone + std::fmt::Debug + Send + Sync + 'static,
        S: Clone + Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        ///
        /// Uses [`StoreConfig::default`].
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_config(initial_state, reducer, environment, StoreConfig::default())
        }

        /// Create a new Store with custom configuration
        #[must_use]
        pub fn with_config(initial_state: S, reducer: R, environment: E, config: StoreConfig) -> Self {
            let (snapshot, _) = watch::channel(Arc::new(initial_state));
            let (action_broadcast, _) = broadcast::channel(config.broadcast_capacity.max(1));

            tracing::debug!(
                broadcast_capacity = config.broadcast_capacity,
                "Store initialized"
            );

            Self {
                snapshot: Arc::new(snapshot),
                dispatch_lock: Arc::new(Mutex::new(())),
                listeners: Arc::new(ListenerRegistry::new()),
                reducer: Arc::new(reducer),
                environment: Arc::new(environment),
                config,
                shutdown: Arc::new(AtomicBool::new(false)),
                pending_effects: Arc::new(AtomicUsize::new(0)),
                action_broadcast,
            }
        }

        /// The injected environment
        #[must_use]
        pub fn environment(&self) -> &E {
            &self.environment
        }

        /// The current snapshot
        #[must_use]
        pub fn snapshot(&self) -> Arc<S> {
            Arc::clone(&self.snapshot.borrow())
        }

        /// Read the current snapshot through a closure
        pub fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let snapshot = self.snapshot();
            f(&snapshot)
        }

        /// Effects currently running, across all dispatches
        #[must_use]
        pub fn pending_effects(&self) -> usize {
            self.pending_effects.load(Ordering::Acquire)
        }

        /// `true` once [`shutdown`](Self::shutdown) has been called
        #[must_use]
        pub fn is_shutting_down(&self) -> bool {
            self.shutdown.load(Ordering::Acquire)
        }

        /// Register a listener called synchronously after every dispatch
        ///
        /// The listener runs while the dispatch is still serialized, so it sees
        /// snapshots strictly in dispatch order. It must not block.
        pub fn subscribe<F>(&self, listener: F) -> ListenerHandle<S>
        where
            F: Fn(&Arc<S>) + Send + Sync + 'static,
        {
            let listener: Listener<S> = Arc::new(listener);
            self.listeners.register(listener)
        }

        /// Number of registered listeners
        #[must_use]
        pub fn listener_count(&self) -> usize {
            self.listeners.len()
        }

        /// Open a live view of `selector` over this store's snapshots
        pub fn select<T>(&self, selector: Arc<dyn Select<S, Output = T>>) -> Selection<S, T>
        where
            T: Send + Sync + 'static,
        {
            Selection::new(self.snapshot.subscribe(), selector)
        }

        /// Observe every dispatched action
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Initiate graceful shutdown of the store
        ///
        /// Rejects new actions from callers, then waits for pending effects.
        /// Actions produced by those effects are still reduced, so the final
        /// snapshot includes their outcome.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if the timeout expires before all
        /// pending effects complete.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating graceful shutdown");
            metrics::counter!("store.shutdown.initiated").increment(1);

            self.shutdown.store(true, Ordering::Release);

            let start = std::time::Instant::now();
            let poll_interval = Duration::from_millis(10);

            loop {
                let pending = self.pending_effects.load(Ordering::Acquire);

                if pending == 0 {
                    tracing::info!("All effects completed, shutdown successful");
                    metrics::counter!("store.shutdown.completed").increment(1);
                    return Ok(());
                }

                if start.elapsed() >= timeout {
                    tracing::error!(pending_effects = pending, "Shutdown timed out");
                    metrics::counter!("store.shutdown.timeout").increment(1);
                    return Err(StoreError::ShutdownTimeout(pending));
                }

                tracing::debug!(
                    pending_effects = pending,
                    elapsed_ms = start.elapsed().as_millis(),
                    "Waiting for effects to complete"
                );

                tokio::time::sleep(poll_interval).await;
            }
        }

        /// Shut down using the configured default timeout
        ///
        /// # Errors
        ///
        /// See [`shutdown`](Self::shutdown).
        pub async fn shutdown_default(&self) -> Result<(), StoreError> {
            self.shutdown(self.config.default_shutdown_timeout).await
        }

        /// Dispatch an action
        ///
        /// 1. Waits for any dispatch in progress (dispatches never interleave)
        /// 2. Runs the reducer on a copy of the current snapshot
        /// 3. Publishes the result as the new snapshot
        /// 4. Calls listeners, then broadcasts the action to observers
        /// 5. Starts the returned effects in background tasks
        ///
        /// The returned [`EffectHandle`] resolves when those effects (and the
        /// dispatch of the actions they produce) are done.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        ///
        /// # Panics
        ///
        /// If the reducer panics, the panic propagates to the caller.
        #[tracing::instrument(skip(self, action), name = "store_dispatch")]
        pub async fn dispatch(&self, action: A) -> Result<EffectHandle, StoreError> {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!(?action, "Rejected action: store is shutting down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            Ok(self.process(action).await)
        }

        /// Reduce, publish and start effects, without the shutdown gate
        ///
        /// Effect feedback comes through here, so fetches still in flight
        /// when [`shutdown`](Self::shutdown) starts are reduced before it returns.
        async fn process(&self, action: A) -> EffectHandle {
            tracing::debug!(?action, "Processing action");
            metrics::counter!("store.actions.total").increment(1);

            let (handle, tracking) = EffectHandle::new();

            let effects = {
                let _serialized = self.dispatch_lock.lock().await;

                let mut next = S::clone(&self.snapshot.borrow());

                let start = std::time::Instant::now();
                let effects = self
                    .reducer
                    .reduce(&mut next, action.clone(), &self.environment);
                metrics::histogram!("store.reducer.duration_seconds")
                    .record(start.elapsed().as_secs_f64());

                let next = Arc::new(next);
                self.snapshot.send_replace(Arc::clone(&next));
                self.listeners.notify(&next);

                // No observers is fine
                let _ = self.action_broadcast.send(action);

                effects
            };

            tracing::trace!("Reducer returned {} effects", effects.len());
            for effect in effects {
                self.execute_effect(effect, tracking.clone());
            }

            handle
        }

        /// Dispatch an action and wait for a matching action
        ///
        /// Designed for request/response flows: dispatch a request and wait
        /// for its success or failure action.
        ///
        /// # Errors
        ///
        /// - [`StoreError::Timeout`]: Timeout expired before a matching action
        /// - [`StoreError::ChannelClosed`]: Action broadcast channel closed
        /// - [`StoreError::ShutdownInProgress`]: Store is shutting down
        pub async fn dispatch_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            F: Fn(&A) -> bool,
        {
            // Subscribe BEFORE dispatching to avoid missing a fast answer
            let mut rx = self.action_broadcast.subscribe();

            self.dispatch(action).await?;

            tokio::time::timeout(timeout, async {
                loop {
                    match rx.recv().await {
                        Ok(action) if predicate(&action) => return Ok(action),
                        Ok(_) => {},
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Action observer lagged");
                        },
                        Err(broadcast::error::RecvError::Closed) => {
                            return Err(StoreError::ChannelClosed);
                        },
                    }
                }
            })
            .await
            .map_err(|_| StoreError::Timeout)?
        }

        /// Track a spawned effect task in both the handle and the store-wide counter
        fn track(&self, tracking: &EffectTracking) -> (DecrementGuard, AtomicCounterGuard) {
            tracking.increment();
            self.pending_effects.fetch_add(1, Ordering::SeqCst);
            (
                DecrementGuard(tracking.clone()),
                AtomicCounterGuard(Arc::clone(&self.pending_effects)),
            )
        }

        /// Feed an effect-produced action back into the store
        ///
        /// Accepted during shutdown; effects it starts are tracked like any other.
        async fn feed_back(&self, action: A) {
            let _ = self.process(action).await;
        }

        #[allow(clippy::needless_pass_by_value)] // tracking is cloned into tasks
        fn execute_effect(&self, effect: Effect<A>, tracking: EffectTracking) {
            match effect {
                Effect::None => {
                    metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                },
                Effect::Future(fut) => {
                    metrics::counter!("store.effects.executed", "type" => "future").increment(1);
                    let guards = self.track(&tracking);
                    let store = self.clone();

                    tokio::spawn(async move {
                        let _guards = guards;
                        if let Some(action) = fut.await {
                            tracing::trace!("Effect::Future produced an action");
                            store.feed_back(action).await;
                        } else {
                            tracing::trace!("Effect::Future completed with no action");
                        }
                    });
                },
                Effect::Delay { duration, action } => {
                    metrics::counter!("store.effects.executed", "type" => "delay").increment(1);
                    let guards = self.track(&tracking);
                    let store = self.clone();

                    tokio::spawn(async move {
                        let _guards = guards;
                        tokio::time::sleep(duration).await;
                        store.feed_back(*action).await;
                    });
                },
                Effect::Parallel(effects) => {
                    metrics::counter!("store.effects.executed", "type" => "parallel").increment(1);
                    for effect in effects {
                        self.execute_effect(effect, tracking.clone());
                    }
                },
                Effect::Sequential(effects) => {
                    metrics::counter!("store.effects.executed", "type" => "sequential").increment(1);
                    let guards = self.track(&tracking);
                    let store = self.clone();

                    tokio::spawn(async move {
                        let _guards = guards;
                        for effect in effects {
                            let (mut step, step_tracking) = EffectHandle::new();
                            store.execute_effect(effect, step_tracking);
                            step.wait().await;
                        }
                        tracing::trace!("Effect::Sequential completed");
                    });
                },
            }
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        fn clone(&self) -> Self {
            Self {
                snapshot: Arc::clone(&self.snapshot),
                dispatch_lock: Arc::clone(&self.dispatch_lock),
                listeners: Arc::clone(&self.listeners),
                reducer: Arc::clone(&self.reducer),
                environment: Arc::clone(&self.environment),
                config: self.config.clone(),
                shutdown: Arc::clone(&self.shutdown),
                pending_effects: Arc::clone(&self.pending_effects),
                action_broadcast: self.action_broadcast.clone(),
            }
        }
    }
}

pub use store::Store;
