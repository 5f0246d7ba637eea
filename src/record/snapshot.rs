//! Snapshot - immutable, shared view of the whole cached collection.

use std::collections::HashSet;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use super::Record;

/// The entire cache contents at one instant.
///
/// Clones share storage. A snapshot is never modified after it is published; every change
/// to the store produces a new one, so holders of an older snapshot observe no change.
pub struct Snapshot<R> {
    records: Arc<[R]>,
}

impl<R> Clone for Snapshot<R> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
        }
    }
}

impl<R> Default for Snapshot<R> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<R> Snapshot<R> {
    /// The uninitialized state: no records.
    pub fn empty() -> Self {
        Self {
            records: Arc::from(Vec::new()),
        }
    }

    /// Returns the records as a slice.
    pub fn records(&self) -> &[R] {
        &self.records
    }

    /// Returns true if both snapshots are the same published value.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.records, &other.records)
    }

    /// Copy the records out into an owned vector.
    pub fn to_vec(&self) -> Vec<R>
    where
        R: Clone,
    {
        self.records.to_vec()
    }
}

impl<R: Record> Snapshot<R> {
    /// Build a snapshot, keeping only the first record seen for each id.
    ///
    /// Returns the snapshot and the ids that were dropped as duplicates.
    pub(crate) fn dedup_by_id(records: Vec<R>) -> (Self, Vec<u64>) {
        let mut seen = HashSet::with_capacity(records.len());
        let mut dropped = Vec::new();
        let mut kept = Vec::with_capacity(records.len());

        for record in records {
            if seen.insert(record.id()) {
                kept.push(record);
            } else {
                dropped.push(record.id());
            }
        }

        (Self::from(kept), dropped)
    }

    /// Position of the record with the given id.
    pub fn position(&self, id: u64) -> Option<usize> {
        self.records.iter().position(|r| r.id() == id)
    }

    /// The record with the given id.
    pub fn get(&self, id: u64) -> Option<&R> {
        self.records.iter().find(|r| r.id() == id)
    }

    /// Order-preserving sub-sequence of records in `category`.
    pub fn in_category(&self, category: &R::Category) -> Vec<R> {
        self.records
            .iter()
            .filter(|r| r.category() == category)
            .cloned()
            .collect()
    }

    /// New snapshot with the element at `index` replaced. `self` is left untouched.
    pub(crate) fn with_replaced(&self, index: usize, record: R) -> Self {
        let mut records = self.records.to_vec();
        records[index] = record;
        Self::from(records)
    }
}

impl<R> From<Vec<R>> for Snapshot<R> {
    fn from(records: Vec<R>) -> Self {
        Self {
            records: Arc::from(records),
        }
    }
}

impl<R> Deref for Snapshot<R> {
    type Target = [R];

    fn deref(&self) -> &[R] {
        &self.records
    }
}

impl<'a, R> IntoIterator for &'a Snapshot<R> {
    type Item = &'a R;
    type IntoIter = std::slice::Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl<R: PartialEq> PartialEq for Snapshot<R> {
    fn eq(&self, other: &Self) -> bool {
        self.records == other.records
    }
}

impl<R: fmt::Debug> fmt::Debug for Snapshot<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.records.iter()).finish()
    }
}
