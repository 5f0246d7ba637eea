use crate::remote::FetchError;

/// Error type for [`Store`](crate::Store) operations.
///
/// Remote acknowledgement failures are not store errors; they surface on the
/// [`PendingWrite`](crate::PendingWrite) returned by `save_record`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No record with this id in the current snapshot. Nothing was changed or sent.
    #[error("no record with id {id} in the current snapshot")]
    NotFound { id: u64 },
    /// The initial load failed; the snapshot is unchanged.
    #[error("initial load failed: {0}")]
    Fetch(#[from] FetchError),
    /// The changes could not be encoded as JSON. Nothing was changed or sent.
    #[error("failed to encode changes for record {id}: {message}")]
    Encode { id: u64, message: String },
    /// `save_record` was called outside a tokio runtime. Nothing was changed or sent.
    #[error("save_record requires a running tokio runtime")]
    NoRuntime,
}
