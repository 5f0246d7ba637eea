//! Records and snapshots - the data held by a [`Store`](crate::Store).
//!
//! A record is a plain identified value. The store caches an ordered collection of records
//! as a [`Snapshot`]: an immutable, shared sequence that is replaced wholesale on every change
//! and never mutated in place.
//!
//! ## Example
//!
//! ```ignore
//! use reactive_store::Record;
//!
//! #[derive(Clone, Serialize, Deserialize, Record)]
//! struct Lesson {
//!     #[record(id)]
//!     pub id: u64,
//!     #[record(category)]
//!     pub kind: LessonKind,
//!     pub title: String,
//! }
//! ```

mod snapshot;

use serde::{de::DeserializeOwned, Serialize};

/// Trait for values that can be cached by a [`Store`](crate::Store).
///
/// Usually derived with `#[derive(Record)]`, which also generates the partial-update type.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Tag used by category filters.
    type Category: PartialEq + Clone + Send + Sync + 'static;

    /// Partial update: every field optional, present fields overwrite.
    type Changes: Serialize + Clone + Send + Sync + 'static;

    /// Unique, immutable identifier. Cache replacement compares records by id only.
    fn id(&self) -> u64;

    /// The record's category tag.
    fn category(&self) -> &Self::Category;

    /// Returns a new record equal to `self` merged with `changes`.
    ///
    /// Fields present in `changes` overwrite, absent fields are retained, the id never changes.
    fn apply(&self, changes: &Self::Changes) -> Self;
}

pub use snapshot::Snapshot;
