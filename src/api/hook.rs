//! Single-listener slot for the "authentication failed" signal.
//!
//! The [`ApiClient`](super::ApiClient) owns one [`AuthFailureHook`]. Whoever
//! owns the session registers a listener and keeps the returned
//! [`ListenerRegistration`]; dropping it empties the slot again. Registering a
//! second listener replaces the first, and a stale registration dropped later
//! leaves the newer listener in place.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Receives the signal raised when a non-login request gets 401/403.
#[async_trait]
pub trait AuthFailureListener: Send + Sync {
    async fn on_authentication_failed(&self);
}

type Slot = Mutex<Option<(u64, Arc<dyn AuthFailureListener>)>>;

/// Process-wide listener slot, cloned into whoever needs to register.
#[derive(Clone, Default)]
pub struct AuthFailureHook {
    slot: Arc<Slot>,
    next_id: Arc<AtomicU64>,
}

impl AuthFailureHook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `listener`, replacing any previous one.
    #[must_use = "dropping the registration removes the listener immediately"]
    pub fn register(&self, listener: Arc<dyn AuthFailureListener>) -> ListenerRegistration {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let replaced = self.slot.lock().replace((id, listener)).is_some();
        if replaced {
            tracing::debug!(id, "Replaced authentication-failure listener");
        }
        ListenerRegistration {
            id,
            slot: Arc::downgrade(&self.slot),
        }
    }

    pub fn is_registered(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Invoke the current listener, if any, and wait for it to finish.
    pub async fn notify(&self) {
        // Clone out so the lock is not held across the await.
        let listener = self.slot.lock().as_ref().map(|(_, l)| Arc::clone(l));
        match listener {
            Some(listener) => listener.on_authentication_failed().await,
            None => tracing::debug!("Authentication failure with no listener registered"),
        }
    }
}

/// Keeps a listener installed. Dropping it deregisters.
pub struct ListenerRegistration {
    id: u64,
    slot: Weak<Slot>,
}

impl ListenerRegistration {
    /// Deregister now instead of at drop.
    pub fn cancel(self) {}
}

impl Drop for ListenerRegistration {
    fn drop(&mut self) {
        let Some(slot) = self.slot.upgrade() else {
            return;
        };
        let mut guard = slot.lock();
        if matches!(guard.as_ref(), Some((id, _)) if *id == self.id) {
            *guard = None;
            tracing::debug!(id = self.id, "Authentication-failure listener removed");
        }
    }
}
