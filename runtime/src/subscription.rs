//! Scoped subscriptions to store snapshots.
//!
//! Two flavours are handed out by the [`Store`](crate::Store):
//!
//! - [`ListenerHandle`]: a synchronous callback run inside every dispatch,
//!   right after the new snapshot is published;
//! - [`Selection`]: a push-based view that yields a selector's output each
//!   time it changes.
//!
//! Both unsubscribe when dropped, so a view that owns its handles releases
//! them on every exit path.

use futures::stream::{self, BoxStream, StreamExt};
use shoptrack_core::selector::Select;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::sync::watch;

/// Callback invoked with each new snapshot.
pub type Listener<S> = Arc<dyn Fn(&Arc<S>) + Send + Sync>;

/// Registered snapshot listeners, keyed by registration order.
pub(crate) struct ListenerRegistry<S> {
    next_id: AtomicU64,
    listeners: Mutex<BTreeMap<u64, Listener<S>>>,
}

impl<S> ListenerRegistry<S> {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            listeners: Mutex::new(BTreeMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<u64, Listener<S>>> {
        match self.listeners.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub(crate) fn register(self: &Arc<Self>, listener: Listener<S>) -> ListenerHandle<S> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().insert(id, listener);
        tracing::trace!(listener_id = id, "Listener registered");
        ListenerHandle {
            id,
            registry: Arc::downgrade(self),
        }
    }

    fn remove(&self, id: u64) -> bool {
        let removed = self.lock().remove(&id).is_some();
        if removed {
            tracing::trace!(listener_id = id, "Listener released");
        }
        removed
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    /// Call every listener with `snapshot`, in registration order.
    ///
    /// The registry lock is released before the callbacks run, so a listener
    /// may drop its own (or another) handle.
    pub(crate) fn notify(&self, snapshot: &Arc<S>) {
        let listeners: Vec<Listener<S>> = self.lock().values().cloned().collect();
        for listener in listeners {
            listener(snapshot);
        }
    }
}

/// Registration of a snapshot listener.
///
/// Dropping the handle (or calling [`unsubscribe`](Self::unsubscribe))
/// removes the listener. A handle that outlives its store is inert.
#[must_use = "dropping the handle unsubscribes the listener immediately"]
pub struct ListenerHandle<S> {
    id: u64,
    registry: Weak<ListenerRegistry<S>>,
}

impl<S> ListenerHandle<S> {
    /// Remove the listener now
    pub fn unsubscribe(self) {
        // Drop does the work
    }

    /// `true` while the listener is still registered
    #[must_use]
    pub fn is_active(&self) -> bool {
        let Some(registry) = self.registry.upgrade() else {
            return false;
        };
        let registered = registry.lock().contains_key(&self.id);
        registered
    }
}

impl<S> Drop for ListenerHandle<S> {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
    }
}

impl<S> std::fmt::Debug for ListenerHandle<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerHandle")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Live view of a selector over the store's snapshots.
///
/// [`current`](Self::current) always reflects the latest snapshot.
/// [`changed`](Self::changed) waits for the next snapshot whose derived value
/// is a different `Arc` than the last one yielded, so dispatches that leave
/// the selected slices alone never wake the view.
pub struct Selection<S, T> {
    snapshots: watch::Receiver<Arc<S>>,
    selector: Arc<dyn Select<S, Output = T>>,
    last: Arc<T>,
}

impl<S, T> Selection<S, T>
where
    S: Send + Sync + 'static,
    T: Send + Sync + 'static,
{
    pub(crate) fn new(
        snapshots: watch::Receiver<Arc<S>>,
        selector: Arc<dyn Select<S, Output = T>>,
    ) -> Self {
        let mut snapshots = snapshots;
        let last = {
            let snapshot = snapshots.borrow_and_update();
            selector.select(&snapshot)
        };
        Self {
            snapshots,
            selector,
            last,
        }
    }

    /// Derived value for the latest snapshot
    #[must_use]
    pub fn current(&self) -> Arc<T> {
        let snapshot = self.snapshots.borrow();
        self.selector.select(&snapshot)
    }

    /// The value most recently yielded (or the initial one)
    #[must_use]
    pub fn last(&self) -> Arc<T> {
        Arc::clone(&self.last)
    }

    /// Wait for the next distinct derived value.
    ///
    /// Returns `None` once the store has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<T>> {
        loop {
            self.snapshots.changed().await.ok()?;
            let value = {
                let snapshot = self.snapshots.borrow_and_update();
                self.selector.select(&snapshot)
            };
            if !Arc::ptr_eq(&value, &self.last) {
                tracing::trace!(selector = self.selector.name(), "Selection changed");
                self.last = Arc::clone(&value);
                return Some(value);
            }
        }
    }

    /// Stop observing
    pub fn unsubscribe(self) {
        // Dropping the receiver is all it takes
    }

    /// Turn the view into a stream of distinct values, starting with the current one
    pub fn into_stream(self) -> BoxStream<'static, Arc<T>> {
        let first = self.last();
        let rest = stream::unfold(self, |mut selection| async move {
            let value = selection.changed().await?;
            Some((value, selection))
        });
        stream::once(async move { first }).chain(rest).boxed()
    }
}

impl<S, T> std::fmt::Debug for Selection<S, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Selection")
            .field("selector", &self.selector.name())
            .finish_non_exhaustive()
    }
}
