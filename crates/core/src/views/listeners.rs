//! Subscriber registry for authoritative count updates.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};

pub(crate) type Callback = Arc<dyn Fn(&str, u64) + Send + Sync>;

#[derive(Default)]
pub(crate) struct ListenerSet {
    next_id: AtomicU64,
    callbacks: RwLock<HashMap<u64, Callback>>,
}

impl ListenerSet {
    pub(crate) fn add(self: &Arc<Self>, callback: Callback) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.callbacks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, callback);
        Subscription { id, set: Arc::downgrade(self) }
    }

    fn remove(&self, id: u64) -> bool {
        self.callbacks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.callbacks.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Invoke every callback with `(entity_id, count)`.
    ///
    /// Callbacks run outside the registry lock, so they may subscribe or
    /// unsubscribe. A panicking callback is logged and skipped.
    pub(crate) fn notify(&self, entity_id: &str, count: u64) {
        let callbacks: Vec<Callback> = self
            .callbacks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();

        for callback in callbacks {
            if catch_unwind(AssertUnwindSafe(|| callback(entity_id, count))).is_err() {
                tracing::error!(entity_id, count, "view count listener panicked");
            }
        }
    }
}

/// Registration handle returned by
/// [`ViewCountBatcher::add_listener`](super::ViewCountBatcher::add_listener).
///
/// Dropping the handle leaves the listener registered.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    set: Weak<ListenerSet>,
}

impl Subscription {
    /// Deregister the listener. Returns false if it was already gone.
    pub fn unsubscribe(self) -> bool {
        self.set.upgrade().is_some_and(|set| set.remove(self.id))
    }
}

impl std::fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerSet").field("len", &self.len()).finish()
    }
}
