//! Remote collection access.
//!
//! [`Transport`] is the seam to the network: a single GET or PUT yielding one response or a
//! failure. [`RemoteSource`] builds the store's requests on top of it as lazy, single-value
//! futures; nothing is sent until a future is awaited, and each await is a fresh request.
//!
//! ## Wire format
//!
//! - `GET <endpoint>` answers `{ "payload": { "<key>": <record>, ... } }`; records are taken in
//!   document order.
//! - `PUT <endpoint>/<id>` carries the JSON-encoded changes with
//!   `content-type: application/json`; only success or failure is inspected.

mod error;
#[cfg(feature = "http")]
mod http;
mod in_memory;
mod retry;
mod source;

use std::future::Future;

use serde_json::Value;

pub use error::{FetchError, PersistenceError, TransportError};
#[cfg(feature = "http")]
pub use http::HttpTransport;
pub use in_memory::{InMemoryTransport, Method, RecordedRequest};
pub use retry::RetryPolicy;
pub use source::RemoteSource;

/// Performs single HTTP-style requests against a remote collection.
///
/// Paths are absolute (`/api/courses`, `/api/courses/3`); implementations resolve them
/// against their own base address.
pub trait Transport: Send + Sync + 'static {
    /// Issue a GET and return the decoded JSON body.
    fn get(&self, path: &str) -> impl Future<Output = Result<Value, TransportError>> + Send;

    /// Issue a PUT with a JSON body. Resolves once the server acknowledged the write.
    fn put(
        &self,
        path: &str,
        body: Value,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}
