//! Multicast change listeners
//!
//! Both the operation queue and the orchestrator notify payload-less
//! listeners. Callbacks run synchronously on the notifying task, outside
//! the registry mutex, so a listener may subscribe or unsubscribe others.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

/// A change callback
pub type Listener = Arc<dyn Fn() + Send + Sync>;

type Registry = Mutex<Vec<(u64, Listener)>>;

/// A set of listeners notified together
#[derive(Default)]
pub struct Listeners {
    registry: Arc<Registry>,
    next_id: AtomicU64,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener`; keep the returned handle to unsubscribe later
    pub fn subscribe(&self, listener: impl Fn() + Send + Sync + 'static) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));
        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Calls every registered listener once
    pub fn notify(&self) {
        let snapshot: Vec<Listener> = self
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in snapshot {
            listener();
        }
    }

    pub fn len(&self) -> usize {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle returned by `subscribe`
///
/// Dropping the handle does not unsubscribe; call [`Subscription::unsubscribe`].
#[must_use = "dropping a Subscription keeps the listener registered"]
pub struct Subscription {
    id: u64,
    registry: Weak<Registry>,
}

impl Subscription {
    /// Removes the listener; no-op if its owner is already gone
    pub fn unsubscribe(self) {
        if let Some(registry) = self.registry.upgrade() {
            registry
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|(id, _)| *id != self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        (count, move || {
            inner.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_notify_reaches_all_listeners() {
        let listeners = Listeners::new();
        let (a, fa) = counter();
        let (b, fb) = counter();
        let _sa = listeners.subscribe(fa);
        let _sb = listeners.subscribe(fb);

        listeners.notify();
        listeners.notify();

        assert_eq!(a.load(Ordering::SeqCst), 2);
        assert_eq!(b.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let listeners = Listeners::new();
        let (a, fa) = counter();
        let sub = listeners.subscribe(fa);
        assert_eq!(listeners.len(), 1);

        sub.unsubscribe();
        listeners.notify();

        assert!(listeners.is_empty());
        assert_eq!(a.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unsubscribe_after_owner_dropped() {
        let listeners = Listeners::new();
        let sub = listeners.subscribe(|| {});
        drop(listeners);
        sub.unsubscribe();
    }

    #[test]
    fn test_listener_may_subscribe_during_notify() {
        let listeners = Arc::new(Listeners::new());
        let inner = Arc::clone(&listeners);
        let _sub = listeners.subscribe(move || {
            let _nested = inner.subscribe(|| {});
        });

        listeners.notify();
        assert_eq!(listeners.len(), 2);
    }
}
