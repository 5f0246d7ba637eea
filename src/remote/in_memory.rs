//! InMemoryTransport - scripted transport for testing and offline development.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::watch;
use tracing::trace;

use super::{Transport, TransportError};

/// Request method as recorded by [`InMemoryTransport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Put,
}

/// A request observed by [`InMemoryTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Default)]
struct Inner {
    collections: HashMap<String, Value>,
    get_failures: VecDeque<TransportError>,
    put_failures: VecDeque<TransportError>,
    requests: Vec<RecordedRequest>,
}

/// Transport serving JSON collections from memory.
///
/// Features:
/// - GET on a registered collection path returns its body
/// - PUT on `<collection>/<id>` merges the JSON object into the matching `payload` entry
/// - Failures can be queued for the next GETs or PUTs
/// - Writes can be held back to observe a pending remote acknowledgement
/// - Every request is recorded in order
///
/// Clone-friendly via Arc; clones share collections and the request log.
#[derive(Clone)]
pub struct InMemoryTransport {
    inner: Arc<Mutex<Inner>>,
    writes_open: Arc<watch::Sender<bool>>,
}

impl Default for InMemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTransport {
    /// Create a transport with no collections. GETs fail with status 404 until one is added.
    pub fn new() -> Self {
        let (writes_open, _) = watch::channel(true);
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            writes_open: Arc::new(writes_open),
        }
    }

    /// Serve `body` for GETs on `path`.
    pub fn with_collection(self, path: impl Into<String>, body: Value) -> Self {
        self.set_collection(path, body);
        self
    }

    /// Replace the body served on `path`.
    pub fn set_collection(&self, path: impl Into<String>, body: Value) {
        self.inner.lock().collections.insert(path.into(), body);
    }

    /// Current body served on `path`, including merged PUTs.
    pub fn collection(&self, path: &str) -> Option<Value> {
        self.inner.lock().collections.get(path).cloned()
    }

    /// Fail the next GET with `error`. Queued failures are used in order.
    pub fn fail_next_get(&self, error: TransportError) {
        self.inner.lock().get_failures.push_back(error);
    }

    /// Fail the next PUT with `error`. Queued failures are used in order.
    pub fn fail_next_put(&self, error: TransportError) {
        self.inner.lock().put_failures.push_back(error);
    }

    /// Park incoming PUTs until [`release_writes`](Self::release_writes).
    pub fn hold_writes(&self) {
        self.writes_open.send_replace(false);
    }

    /// Let parked and future PUTs complete.
    pub fn release_writes(&self) {
        self.writes_open.send_replace(true);
    }

    /// All requests in the order they were received.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.inner.lock().requests.clone()
    }

    /// Number of requests received with `method`.
    pub fn request_count(&self, method: Method) -> usize {
        self.inner
            .lock()
            .requests
            .iter()
            .filter(|r| r.method == method)
            .count()
    }

    fn merge_into_collection(inner: &mut Inner, path: &str, body: &Value) {
        let Some((collection, id)) = path.rsplit_once('/') else {
            return;
        };
        let Ok(id) = id.parse::<u64>() else {
            return;
        };
        let (Some(entries), Some(changes)) = (
            inner
                .collections
                .get_mut(collection)
                .and_then(|c| c.get_mut("payload"))
                .and_then(Value::as_object_mut),
            body.as_object(),
        ) else {
            return;
        };

        let target = entries
            .values_mut()
            .filter_map(Value::as_object_mut)
            .find(|entry| entry.get("id").and_then(Value::as_u64) == Some(id));
        if let Some(entry) = target {
            for (field, value) in changes {
                entry.insert(field.clone(), value.clone());
            }
        }
    }
}

impl Transport for InMemoryTransport {
    async fn get(&self, path: &str) -> Result<Value, TransportError> {
        let mut inner = self.inner.lock();
        inner.requests.push(RecordedRequest {
            method: Method::Get,
            path: path.to_string(),
            body: None,
        });
        trace!(path, "in-memory GET");

        if let Some(error) = inner.get_failures.pop_front() {
            return Err(error);
        }
        inner
            .collections
            .get(path)
            .cloned()
            .ok_or_else(|| TransportError::Status {
                url: path.to_string(),
                status: 404,
            })
    }

    async fn put(&self, path: &str, body: Value) -> Result<(), TransportError> {
        self.inner.lock().requests.push(RecordedRequest {
            method: Method::Put,
            path: path.to_string(),
            body: Some(body.clone()),
        });
        trace!(path, "in-memory PUT");

        let mut open = self.writes_open.subscribe();
        if open.wait_for(|open| *open).await.is_err() {
            return Err(TransportError::Request {
                url: path.to_string(),
                message: "transport dropped".into(),
            });
        }

        let mut inner = self.inner.lock();
        if let Some(error) = inner.put_failures.pop_front() {
            return Err(error);
        }
        Self::merge_into_collection(&mut inner, path, &body);
        Ok(())
    }
}
