//! Async stream adapter for observables.

use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::Stream;

use super::Observable;
use crate::channel::Subscription;

/// An [`Observable`] consumed as a [`Stream`].
///
/// Yields the replayed value first, then every later emission in order. The stream ends only
/// when the source channel is dropped.
#[derive(Debug)]
pub struct ObservableStream<T> {
    inner: UnboundedReceiverStream<T>,
    subscription: Subscription,
}

impl<T: Clone + Send + Sync + 'static> ObservableStream<T> {
    pub(super) fn new(source: &Observable<T>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = source.subscribe(move |value: &T| {
            // The receiver is gone only once the stream itself was dropped.
            let _ = tx.send(value.clone());
        });
        Self {
            inner: UnboundedReceiverStream::new(rx),
            subscription,
        }
    }

    /// Stop receiving and drop anything buffered.
    pub fn close(self) {
        self.subscription.unsubscribe();
    }
}

impl<T> Stream for ObservableStream<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, None)
    }
}
