//! RemoteSource - lazy single-request producers for one record collection.

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use super::{FetchError, PersistenceError, RetryPolicy, Transport};
use crate::Record;

#[derive(Deserialize)]
struct Envelope {
    payload: Map<String, Value>,
}

/// Builds fetch and persist requests for the collection at `endpoint`.
///
/// Calling a method only builds a future; the request is issued when it is awaited, and
/// awaiting a newly built future issues an independent request. Clone-friendly via Arc.
pub struct RemoteSource<R, T> {
    transport: Arc<T>,
    endpoint: String,
    _record: PhantomData<fn() -> R>,
}

impl<R, T> Clone for RemoteSource<R, T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            endpoint: self.endpoint.clone(),
            _record: PhantomData,
        }
    }
}

impl<R, T> fmt::Debug for RemoteSource<R, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteSource")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl<R: Record, T: Transport> RemoteSource<R, T> {
    pub fn new(transport: Arc<T>, endpoint: impl Into<String>) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
            _record: PhantomData,
        }
    }

    /// The collection path.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The transport shared by every request.
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Path of a single record: `<endpoint>/<id>`.
    pub fn record_path(&self, id: u64) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), id)
    }

    /// GET the whole collection, flattening `payload` in document order.
    pub fn fetch_all(&self) -> impl Future<Output = Result<Vec<R>, FetchError>> + Send + 'static {
        let transport = Arc::clone(&self.transport);
        let endpoint = self.endpoint.clone();
        async move {
            debug!(%endpoint, "fetching collection");
            let body = transport.get(&endpoint).await?;
            decode_payload(&endpoint, body)
        }
    }

    /// [`fetch_all`](Self::fetch_all), rebuilt and re-awaited after each failure per `policy`.
    pub fn fetch_with_retry(
        &self,
        policy: &RetryPolicy,
    ) -> impl Future<Output = Result<Vec<R>, FetchError>> + Send + 'static {
        let source = self.clone();
        let policy = policy.clone();
        async move { policy.run(|| source.fetch_all()).await }
    }

    /// PUT `changes` to `<endpoint>/<id>`.
    pub fn persist(
        &self,
        id: u64,
        changes: Value,
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send + 'static {
        let transport = Arc::clone(&self.transport);
        let path = self.record_path(id);
        async move {
            debug!(%path, "persisting changes");
            transport.put(&path, changes).await?;
            trace!(%path, "remote write acknowledged");
            Ok(())
        }
    }
}

/// Flatten a `{ "payload": { key: record } }` body into records, keeping document order.
pub(crate) fn decode_payload<R: Record>(endpoint: &str, body: Value) -> Result<Vec<R>, FetchError> {
    let decode_error = |message: String| FetchError::Decode {
        endpoint: endpoint.to_string(),
        message,
    };

    let envelope: Envelope = serde_json::from_value(body).map_err(|e| decode_error(e.to_string()))?;

    envelope
        .payload
        .into_iter()
        .map(|(key, value)| {
            serde_json::from_value(value).map_err(|e| decode_error(format!("entry {key}: {e}")))
        })
        .collect()
}
