//! Error types for remote reads and writes.

/// A transport-level failure: the request could not be completed or was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The request could not be sent or the connection failed.
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },
    /// The server answered with a non-success status.
    #[error("{url} responded with status {status}")]
    Status { url: String, status: u16 },
    /// No response within the configured timeout.
    #[error("request to {url} timed out")]
    Timeout { url: String },
    /// The response body could not be read as JSON.
    #[error("unreadable response body from {url}: {message}")]
    Body { url: String, message: String },
}

/// Loading the collection failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The body was JSON but not a `{ "payload": { ... } }` collection of records.
    #[error("failed to decode {endpoint} payload: {message}")]
    Decode { endpoint: String, message: String },
}

/// The remote acknowledgement for an optimistic write failed.
///
/// The local change stays applied; reconciliation is up to the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistenceError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The background write task ended without producing an acknowledgement.
    #[error("remote write for record {id} aborted: {message}")]
    Aborted { id: u64, message: String },
}
