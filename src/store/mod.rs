//! Store - cached record collection with derived views and optimistic writes.
//!
//! The store owns one [`ReplayChannel`] holding the current [`Snapshot`]. `init` fills it from
//! the remote collection, the derivation methods build pure views over its read stream, and
//! `save_record` is the single writer: it installs the merged record locally before the PUT is
//! even sent.
//!
//! ## Example
//!
//! ```ignore
//! use reactive_store::{Category, Course, CourseChanges, Store};
//!
//! let store: Store<Course, _> = Store::new(transport);
//! store.init().await?;
//!
//! let _beginners = store
//!     .filter_by_category(Category::Beginner)
//!     .subscribe(|courses| render(courses));
//!
//! let write = store.save_record(2, CourseChanges {
//!     category: Some(Category::Beginner),
//!     ..Default::default()
//! })?;
//! // Subscribers already saw the change; the server answer arrives later.
//! write.await?;
//! ```

mod write;

use std::fmt;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::channel::ReplayChannel;
use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::observable::Observable;
use crate::record::{Record, Snapshot};
use crate::remote::{RemoteSource, RetryPolicy, Transport};
use crate::{Category, Course};

pub use write::{PendingWrite, WriteState};

/// Reactive cache of one remote record collection.
///
/// Clone-friendly via Arc; clones share the snapshot, the listeners and the transport.
pub struct Store<R, T> {
    channel: ReplayChannel<Snapshot<R>>,
    remote: RemoteSource<R, T>,
    retry: RetryPolicy,
}

impl<R, T> Clone for Store<R, T> {
    fn clone(&self) -> Self {
        Self {
            channel: self.channel.clone(),
            remote: self.remote.clone(),
            retry: self.retry.clone(),
        }
    }
}

impl<R: Record, T: Transport> Store<R, T> {
    /// Store over the default endpoint, single-attempt load.
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, StoreConfig::default())
    }

    pub fn with_config(transport: T, config: StoreConfig) -> Self {
        Self::from_shared(Arc::new(transport), config)
    }

    /// Store using a transport shared with other stores.
    pub fn from_shared(transport: Arc<T>, config: StoreConfig) -> Self {
        Self {
            channel: ReplayChannel::new(Snapshot::empty()),
            remote: RemoteSource::new(transport, config.endpoint),
            retry: config.retry,
        }
    }

    /// The remote collection this store caches.
    pub fn remote(&self) -> &RemoteSource<R, T> {
        &self.remote
    }

    /// Load the collection and broadcast it.
    ///
    /// Every call issues a fresh fetch (retried per the configured policy). On failure the
    /// error is returned here and the current snapshot stays in place; streams see nothing.
    pub async fn init(&self) -> Result<Snapshot<R>, StoreError> {
        let endpoint = self.remote.endpoint();
        let records = match self.remote.fetch_with_retry(&self.retry).await {
            Ok(records) => records,
            Err(err) => {
                warn!(%endpoint, error = %err, "initial load failed, keeping current snapshot");
                return Err(err.into());
            }
        };

        let (snapshot, dropped) = Snapshot::dedup_by_id(records);
        if !dropped.is_empty() {
            warn!(%endpoint, ?dropped, "dropped records with duplicate ids");
        }

        info!(%endpoint, records = snapshot.len(), "store initialized");
        self.replace(snapshot.clone());
        Ok(snapshot)
    }

    /// Multicast, replay-last stream of snapshots.
    ///
    /// Subscribers get the current snapshot immediately, then every replacement in order.
    /// The stream never completes and never errors; subscribing never touches the network.
    pub fn read_stream(&self) -> Observable<Snapshot<R>> {
        self.channel.observe()
    }

    /// The present snapshot, without subscribing.
    pub fn current_snapshot(&self) -> Snapshot<R> {
        self.channel.current()
    }

    fn replace(&self, snapshot: Snapshot<R>) {
        self.channel.replace(snapshot);
    }

    /// Records in `category`, re-derived from every snapshot in order.
    pub fn filter_by_category(&self, category: R::Category) -> Observable<Vec<R>> {
        self.read_stream().map(move |snapshot| snapshot.in_category(&category))
    }

    /// The record with `id`; snapshots without it produce no emission.
    pub fn find_by_id(&self, id: u64) -> Observable<R> {
        self.read_stream().filter_map(move |snapshot| snapshot.get(id).cloned())
    }

    /// Apply `changes` to record `id` locally, then persist them remotely.
    ///
    /// Returns after every subscriber has seen the merged record. The returned
    /// [`PendingWrite`] resolves with the server's answer; a failed write is not rolled back.
    ///
    /// Fails without changing anything if `id` is not in the current snapshot.
    pub fn save_record(&self, id: u64, changes: R::Changes) -> Result<PendingWrite<R>, StoreError> {
        let runtime = Handle::try_current().map_err(|_| StoreError::NoRuntime)?;
        let body = serde_json::to_value(&changes).map_err(|e| StoreError::Encode {
            id,
            message: e.to_string(),
        })?;

        let (state, state_rx) = watch::channel(WriteState::Requested);
        // Read, merge and install under one lock so concurrent saves never drop each other.
        let updated = self.channel.update(|current| {
            let index = current.position(id).ok_or(StoreError::NotFound { id })?;
            let updated = current[index].apply(&changes);
            Ok::<_, StoreError>((current.with_replaced(index, updated.clone()), updated))
        })?;
        state.send_replace(WriteState::LocalApplied);
        debug!(id, "optimistic update applied");

        let request = self.remote.persist(id, body);
        state.send_replace(WriteState::RemotePending);
        let handle = runtime.spawn(async move {
            let result = request.await;
            match &result {
                Ok(()) => {
                    debug!(id, "remote save confirmed");
                    state.send_replace(WriteState::RemoteConfirmed);
                }
                Err(err) => {
                    warn!(id, error = %err, "remote save failed, local change kept");
                    state.send_replace(WriteState::RemoteFailed);
                }
            }
            result
        });

        Ok(PendingWrite::new(id, updated, handle, state_rx))
    }

    /// Re-install `record` in place of the cached record with the same id.
    ///
    /// Local only; for callers reconciling after a failed write.
    pub fn revert(&self, record: R) -> Result<(), StoreError> {
        let id = record.id();
        self.channel.update(|current| {
            let index = current.position(id).ok_or(StoreError::NotFound { id })?;
            Ok::<_, StoreError>((current.with_replaced(index, record), ()))
        })?;
        debug!(id, "record reverted locally");
        Ok(())
    }
}

impl<T: Transport> Store<Course, T> {
    pub fn select_beginner_courses(&self) -> Observable<Vec<Course>> {
        self.filter_by_category(Category::Beginner)
    }

    pub fn select_advanced_courses(&self) -> Observable<Vec<Course>> {
        self.filter_by_category(Category::Advanced)
    }
}

impl<R: fmt::Debug, T> fmt::Debug for Store<R, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("remote", &self.remote)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}
