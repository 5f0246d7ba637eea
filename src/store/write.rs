//! PendingWrite - handle to the remote half of an optimistic write.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::remote::PersistenceError;

/// Progress of a single `save_record` call.
///
/// `Requested → LocalApplied → RemotePending → RemoteConfirmed | RemoteFailed`.
/// `LocalApplied` is never undone by the store; `RemoteFailed` is informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteState {
    Requested,
    LocalApplied,
    RemotePending,
    RemoteConfirmed,
    RemoteFailed,
}

impl WriteState {
    /// True once the remote side has answered either way.
    pub fn is_settled(&self) -> bool {
        matches!(self, WriteState::RemoteConfirmed | WriteState::RemoteFailed)
    }
}

impl fmt::Display for WriteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WriteState::Requested => "requested",
            WriteState::LocalApplied => "local-applied",
            WriteState::RemotePending => "remote-pending",
            WriteState::RemoteConfirmed => "remote-confirmed",
            WriteState::RemoteFailed => "remote-failed",
        };
        f.write_str(name)
    }
}

/// The remote acknowledgement of an optimistic write.
///
/// By the time this handle exists the change is already in the store. Await it for the
/// server's answer. Dropping it does not cancel the request.
pub struct PendingWrite<R> {
    id: u64,
    record: R,
    handle: JoinHandle<Result<(), PersistenceError>>,
    state: watch::Receiver<WriteState>,
}

// The record is never pinned; only the join handle is polled.
impl<R> Unpin for PendingWrite<R> {}

impl<R> PendingWrite<R> {
    pub(crate) fn new(
        id: u64,
        record: R,
        handle: JoinHandle<Result<(), PersistenceError>>,
        state: watch::Receiver<WriteState>,
    ) -> Self {
        Self {
            id,
            record,
            handle,
            state,
        }
    }

    /// Id of the saved record.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The merged record as applied locally.
    pub fn record(&self) -> &R {
        &self.record
    }

    /// Current progress.
    pub fn state(&self) -> WriteState {
        *self.state.borrow()
    }

    /// Receiver notified on every state change.
    pub fn watch_state(&self) -> watch::Receiver<WriteState> {
        self.state.clone()
    }
}

impl<R> Future for PendingWrite<R> {
    type Output = Result<(), PersistenceError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.handle).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(join_error)) => Poll::Ready(Err(PersistenceError::Aborted {
                id: this.id,
                message: join_error.to_string(),
            })),
        }
    }
}

impl<R: fmt::Debug> fmt::Debug for PendingWrite<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingWrite")
            .field("id", &self.id)
            .field("record", &self.record)
            .field("state", &self.state())
            .finish()
    }
}
