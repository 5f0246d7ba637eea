//! Replay channel - a value cell that multicasts every replacement to its listeners.
//!
//! The channel holds the last value and a list of registered callbacks. A new listener is
//! invoked synchronously with the current value before it is registered for later pushes,
//! so a late subscriber never waits for the next unrelated write to see data.
//!
//! Delivery is strictly ordered. A replacement made from inside a listener callback is queued
//! and delivered after the current broadcast finishes, so no listener ever observes values out
//! of install order. Delivery is serialized across threads by a re-entrant lock; callbacks must
//! not block on another thread that touches the same channel.
//!
//! ## Example
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use reactive_store::ReplayChannel;
//!
//! let channel = ReplayChannel::new(0);
//! channel.replace(1);
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&seen);
//! let _sub = channel.subscribe(move |v: &i32| sink.lock().unwrap().push(*v));
//!
//! channel.replace(2);
//! assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
//! ```

mod subscription;

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use tracing::trace;

use crate::observable::Observable;

pub use subscription::Subscription;

/// A listener callback.
pub(crate) type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Listener<T> {
    id: u64,
    /// Epoch of the value replayed on subscribe; only later epochs are delivered.
    since: u64,
    callback: Callback<T>,
    active: Arc<AtomicBool>,
}

struct State<T> {
    value: T,
    epoch: u64,
    listeners: Vec<Listener<T>>,
    pending: VecDeque<(u64, T)>,
    draining: bool,
}

struct Shared<T> {
    state: ReentrantMutex<RefCell<State<T>>>,
    next_listener: AtomicU64,
}

type Guard<'a, T> = ReentrantMutexGuard<'a, RefCell<State<T>>>;

/// Clears the draining flag when the owning broadcast ends, including by unwinding.
struct DrainReset<'a, T> {
    state: &'a RefCell<State<T>>,
}

impl<T> Drop for DrainReset<'_, T> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.try_borrow_mut() {
            state.draining = false;
        }
    }
}

/// Multicast cell with replay-last-value-on-subscribe semantics.
///
/// Clone-friendly via Arc; clones share the same value and listeners. The channel never
/// completes and never carries errors.
pub struct ReplayChannel<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for ReplayChannel<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> ReplayChannel<T> {
    /// Create a channel holding `initial`.
    pub fn new(initial: T) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: ReentrantMutex::new(RefCell::new(State {
                    value: initial,
                    epoch: 0,
                    listeners: Vec::new(),
                    pending: VecDeque::new(),
                    draining: false,
                })),
                next_listener: AtomicU64::new(1),
            }),
        }
    }

    /// Returns the current value without subscribing.
    pub fn current(&self) -> T {
        let guard = self.shared.state.lock();
        let value = guard.borrow().value.clone();
        value
    }

    /// Number of replacements installed so far.
    pub fn epoch(&self) -> u64 {
        let guard = self.shared.state.lock();
        let epoch = guard.borrow().epoch;
        epoch
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        let guard = self.shared.state.lock();
        let count = guard.borrow().listeners.len();
        count
    }

    /// Install a new value and broadcast it to every listener.
    pub fn replace(&self, value: T) {
        let guard = self.shared.state.lock();
        Self::install(&guard, value);
    }

    /// Compute the next value from the current one and install it, with no other thread able
    /// to install in between. Nothing is installed when `f` fails.
    ///
    /// `f` runs while the channel is locked; it may read the channel but must not block on
    /// another thread that uses it.
    pub(crate) fn update<F, O, E>(&self, f: F) -> Result<O, E>
    where
        F: FnOnce(&T) -> Result<(T, O), E>,
    {
        let guard = self.shared.state.lock();
        let current = guard.borrow().value.clone();
        let (next, output) = f(&current)?;
        Self::install(&guard, next);
        Ok(output)
    }

    fn install(guard: &Guard<'_, T>, value: T) {
        let owns_drain = {
            let mut state = guard.borrow_mut();
            state.epoch += 1;
            let epoch = state.epoch;
            state.value = value.clone();
            state.pending.push_back((epoch, value));
            !std::mem::replace(&mut state.draining, true)
        };

        if owns_drain {
            let _reset = DrainReset { state: guard };
            Self::drain(guard);
        } else {
            trace!("replacement queued behind active broadcast");
        }
    }

    /// Register `listener`. It is called right away with the current value, then with every
    /// later replacement in order.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.subscribe_callback(Arc::new(listener))
    }

    /// Observable view over this channel.
    pub fn observe(&self) -> Observable<T> {
        let channel = self.clone();
        Observable::new(move |callback| channel.subscribe_callback(callback))
    }

    pub(crate) fn subscribe_callback(&self, callback: Callback<T>) -> Subscription {
        let guard = self.shared.state.lock();
        let (value, since, owns_drain) = {
            let mut state = guard.borrow_mut();
            let owns_drain = !std::mem::replace(&mut state.draining, true);
            (state.value.clone(), state.epoch, owns_drain)
        };
        // Replacements made by the callback itself are queued until it is registered.
        let _reset = owns_drain.then(|| DrainReset { state: &guard });

        callback(&value);

        let id = self.shared.next_listener.fetch_add(1, Ordering::Relaxed);
        let active = Arc::new(AtomicBool::new(true));
        guard.borrow_mut().listeners.push(Listener {
            id,
            since,
            callback,
            active: Arc::clone(&active),
        });
        trace!(listener = id, epoch = since, "listener registered");

        if owns_drain {
            Self::drain(&guard);
        }

        let weak = Arc::downgrade(&self.shared);
        Subscription::new(active, Box::new(move || Self::remove(weak, id)))
    }

    fn drain(guard: &Guard<'_, T>) {
        loop {
            let next = {
                let mut state = guard.borrow_mut();
                state.pending.pop_front().map(|(epoch, value)| {
                    let targets: Vec<(Callback<T>, Arc<AtomicBool>)> = state
                        .listeners
                        .iter()
                        .filter(|l| l.since < epoch)
                        .map(|l| (Arc::clone(&l.callback), Arc::clone(&l.active)))
                        .collect();
                    (epoch, value, targets)
                })
            };

            let Some((epoch, value, targets)) = next else {
                break;
            };

            trace!(epoch, listeners = targets.len(), "broadcast");
            for (callback, active) in targets {
                if active.load(Ordering::Acquire) {
                    callback(&value);
                }
            }
        }
    }

    fn remove(shared: Weak<Shared<T>>, id: u64) {
        let Some(shared) = shared.upgrade() else {
            return;
        };
        let guard = shared.state.lock();
        let removed: Vec<Listener<T>> = {
            let mut state = guard.borrow_mut();
            let (removed, kept) = std::mem::take(&mut state.listeners)
                .into_iter()
                .partition(|l| l.id == id);
            state.listeners = kept;
            removed
        };
        trace!(listener = id, "listener removed");
        // Callbacks may own other subscriptions; drop them outside the borrow.
        drop(removed);
    }
}

impl<T: Clone + Send + Sync + Default + 'static> Default for ReplayChannel<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for ReplayChannel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.shared.state.lock();
        let result = match guard.try_borrow() {
            Ok(state) => f
                .debug_struct("ReplayChannel")
                .field("value", &state.value)
                .field("epoch", &state.epoch)
                .field("listeners", &state.listeners.len())
                .finish(),
            Err(_) => f.debug_struct("ReplayChannel").finish_non_exhaustive(),
        };
        result
    }
}
