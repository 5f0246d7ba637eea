//! Subscription handles.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

type Unsubscribe = Box<dyn FnOnce() + Send + Sync>;

/// Handle to a registered listener.
///
/// Dropping the handle unsubscribes. Unsubscribing only stops delivery to this listener;
/// the channel and every other subscriber are unaffected.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    active: Arc<AtomicBool>,
    unsubscribe: Option<Unsubscribe>,
}

impl Subscription {
    pub(crate) fn new(active: Arc<AtomicBool>, unsubscribe: Unsubscribe) -> Self {
        Self {
            active,
            unsubscribe: Some(unsubscribe),
        }
    }

    /// Returns true until the subscription is cancelled.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Stop delivery to this listener.
    pub fn unsubscribe(mut self) {
        self.cancel();
    }

    /// Keep the listener registered for the rest of the channel's lifetime.
    pub fn detach(mut self) {
        self.unsubscribe = None;
    }

    fn cancel(&mut self) {
        self.active.store(false, Ordering::Release);
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.unsubscribe.is_some() {
            self.cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
