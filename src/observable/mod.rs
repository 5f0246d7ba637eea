//! Observables - subscribable views composed on top of a [`ReplayChannel`](crate::ReplayChannel).
//!
//! Operators are pure and stateless. Subscribing to a derived observable subscribes to its
//! source; nothing is cached per operator and no extra producer is created, so any number of
//! derived views share the single upstream channel.

mod stream;

use std::fmt;
use std::sync::Arc;

use crate::channel::{Callback, Subscription};

pub use stream::ObservableStream;

type SubscribeFn<T> = dyn Fn(Callback<T>) -> Subscription + Send + Sync;

/// A subscribable stream of values.
pub struct Observable<T> {
    subscribe: Arc<SubscribeFn<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            subscribe: Arc::clone(&self.subscribe),
        }
    }
}

impl<T: Send + Sync + 'static> Observable<T> {
    pub(crate) fn new<S>(subscribe: S) -> Self
    where
        S: Fn(Callback<T>) -> Subscription + Send + Sync + 'static,
    {
        Self {
            subscribe: Arc::new(subscribe),
        }
    }

    /// Register `listener` for every value this observable emits.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        (self.subscribe)(Arc::new(listener))
    }

    /// Emit `f(value)` for every upstream value.
    pub fn map<U, F>(&self, f: F) -> Observable<U>
    where
        U: Send + Sync + 'static,
        F: Fn(&T) -> U + Send + Sync + 'static,
    {
        let source = self.clone();
        let f = Arc::new(f);
        Observable::new(move |downstream: Callback<U>| {
            let f = Arc::clone(&f);
            source.subscribe(move |value| downstream(&f(value)))
        })
    }

    /// Forward only the upstream values matching `predicate`.
    pub fn filter<P>(&self, predicate: P) -> Observable<T>
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let source = self.clone();
        let predicate = Arc::new(predicate);
        Observable::new(move |downstream: Callback<T>| {
            let predicate = Arc::clone(&predicate);
            source.subscribe(move |value| {
                if predicate(value) {
                    downstream(value);
                }
            })
        })
    }

    /// Emit `f(value)` when it is `Some`; upstream values mapping to `None` are suppressed.
    pub fn filter_map<U, F>(&self, f: F) -> Observable<U>
    where
        U: Send + Sync + 'static,
        F: Fn(&T) -> Option<U> + Send + Sync + 'static,
    {
        let source = self.clone();
        let f = Arc::new(f);
        Observable::new(move |downstream: Callback<U>| {
            let f = Arc::clone(&f);
            source.subscribe(move |value| {
                if let Some(mapped) = f(value) {
                    downstream(&mapped);
                }
            })
        })
    }

    /// Adapt into an async stream for consumers written as tasks.
    ///
    /// Values are buffered in emission order; the subscription lives as long as the stream.
    pub fn into_stream(&self) -> ObservableStream<T>
    where
        T: Clone,
    {
        ObservableStream::new(self)
    }
}

impl<T> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable").finish_non_exhaustive()
    }
}
