//! Connectivity listener registry with per-listener failure isolation.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tracing::{debug, error};

type Listener = Arc<dyn Fn(bool) + Send + Sync>;

/// Set of connectivity listeners.
#[derive(Default)]
pub(crate) struct ListenerSet {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(u64, Listener)>>,
}

impl ListenerSet {
    pub(crate) fn insert(self: &Arc<Self>, listener: Listener) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.listeners).push((id, listener));
        Subscription {
            set: Arc::downgrade(self),
            id,
        }
    }

    fn remove(&self, id: u64) {
        lock(&self.listeners).retain(|(existing, _)| *existing != id);
    }

    pub(crate) fn clear(&self) {
        lock(&self.listeners).clear();
    }

    pub(crate) fn len(&self) -> usize {
        lock(&self.listeners).len()
    }

    /// Invoke every listener with `connected` while `current` holds.
    ///
    /// Runs against a snapshot, so listeners may subscribe or unsubscribe
    /// while being notified. `current` is checked before each listener; once
    /// it turns false the rest are skipped. A panicking listener is logged
    /// and skipped.
    pub(crate) fn notify_while(&self, connected: bool, current: impl Fn() -> bool) {
        let snapshot: Vec<(u64, Listener)> = lock(&self.listeners).clone();

        for (id, listener) in snapshot {
            if !current() {
                debug!("Dropping superseded notify({})", connected);
                return;
            }
            let result = panic::catch_unwind(AssertUnwindSafe(|| listener(connected)));
            if let Err(payload) = result {
                error!(
                    "Connection listener {} panicked on notify({}): {}",
                    id,
                    connected,
                    panic_message(payload.as_ref())
                );
            }
        }
    }
}

/// Handle returned by `on_connection_change`.
///
/// Dropping it keeps the listener registered; call [`Subscription::unsubscribe`]
/// to remove it. Unsubscribing more than once is harmless.
#[derive(Debug, Clone)]
pub struct Subscription {
    set: Weak<ListenerSet>,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(&self) {
        if let Some(set) = self.set.upgrade() {
            set.remove(self.id);
        }
    }
}

impl std::fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerSet").field("len", &self.len()).finish()
    }
}

/// Listeners run outside the lock, so a poisoned mutex only means a panic
/// happened mid-push/retain; the Vec itself is still usable.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
