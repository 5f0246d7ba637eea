//! Client-side reactive cache for a remote record collection.
//!
//! - [`Store`] loads the collection once, broadcasts snapshots to any number of subscribers
//!   and applies writes optimistically before persisting them.
//! - [`ReplayChannel`] is the multicast cell underneath: late subscribers get the last value.
//! - [`Observable`] carries the derived views (`map`, `filter`, `filter_map`).
//! - [`remote`] holds the transport seam, the lazy request builders and the retry policy.

extern crate self as reactive_store;

mod channel;
mod config;
mod course;
mod error;
mod observable;
mod record;
pub mod remote;
mod store;

pub use channel::{ReplayChannel, Subscription};
pub use config::{HttpTransportConfig, StoreConfig, DEFAULT_ENDPOINT};
pub use course::{Category, Course, CourseChanges};
pub use error::StoreError;
pub use observable::{Observable, ObservableStream};
pub use record::{Record, Snapshot};
pub use remote::{FetchError, PersistenceError, RetryPolicy, Transport, TransportError};
pub use store::{PendingWrite, Store, WriteState};

// Derive macro for `Record`, generating the partial-update type.
pub use reactive_store_macros::Record;

#[doc(hidden)]
pub mod __private {
    pub use serde;
}
