//! Shared aggregate of all recorded listings
//!
//! The [`Aggregator`] is the only shared mutable state of a run. Workers fetch
//! and parse on their own and hand finished [`VolumeResult`]s over through
//! [`Aggregator::record`]; the lock is held only for the map insert and the
//! running-total update.

use crate::state::records::VolumeResult;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Nested `group -> sub -> result` mapping
pub type AggregateState = BTreeMap<String, BTreeMap<String, VolumeResult>>;

/// Running totals kept alongside the aggregate for progress reporting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunningTotals {
    /// Files across all recorded listings
    pub files: u64,

    /// Bytes across all recorded listings
    pub bytes: u64,

    /// Number of recorded `(group, sub)` entries
    pub directories: u64,
}

#[derive(Debug, Default)]
struct Inner {
    state: AggregateState,
    totals: RunningTotals,
}

/// Thread-safe owner of the aggregate state
#[derive(Debug, Default)]
pub struct Aggregator {
    inner: Mutex<Inner>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the result for one `(group, sub)` pair
    ///
    /// Empty results are ignored. A second result for the same pair replaces
    /// the first, and the running totals are corrected for the replaced entry.
    ///
    /// # Returns
    ///
    /// `true` if the result was stored
    pub fn record(
        &self,
        group_key: impl Into<String>,
        sub_key: impl Into<String>,
        result: VolumeResult,
    ) -> bool {
        if result.is_empty() {
            return false;
        }

        let group_key = group_key.into();
        let sub_key = sub_key.into();
        let added_files = result.file_count;
        let added_bytes = result.total_size_bytes;

        let mut inner = self.inner.lock();
        let previous = inner
            .state
            .entry(group_key)
            .or_default()
            .insert(sub_key, result);

        let totals = &mut inner.totals;
        match previous {
            Some(old) => {
                totals.files = totals.files - old.file_count + added_files;
                totals.bytes = totals.bytes - old.total_size_bytes + added_bytes;
            }
            None => {
                totals.files += added_files;
                totals.bytes += added_bytes;
                totals.directories += 1;
            }
        }

        true
    }

    /// Current running totals
    pub fn totals(&self) -> RunningTotals {
        self.inner.lock().totals
    }

    /// Point-in-time copy of the aggregate
    ///
    /// Taken under the same lock as [`record`](Self::record), so no partially
    /// applied update is ever visible. The copy needs no further locking.
    pub fn snapshot(&self) -> AggregateSnapshot {
        AggregateSnapshot(self.inner.lock().state.clone())
    }
}

/// Immutable copy of the aggregate state
///
/// Serializes as the nested `group -> sub -> {files, size, details}` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateSnapshot(AggregateState);

impl AggregateSnapshot {
    pub fn new(state: AggregateState) -> Self {
        Self(state)
    }

    /// Number of `(group, sub)` entries
    pub fn len(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of distinct groups
    pub fn group_count(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, group_key: &str, sub_key: &str) -> Option<&VolumeResult> {
        self.0.get(group_key).and_then(|subs| subs.get(sub_key))
    }

    pub fn groups(&self) -> impl Iterator<Item = (&str, &BTreeMap<String, VolumeResult>)> {
        self.0.iter().map(|(group, subs)| (group.as_str(), subs))
    }

    /// Iterates every entry as `(group, sub, result)` in key order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, &VolumeResult)> {
        self.0.iter().flat_map(|(group, subs)| {
            subs.iter()
                .map(move |(sub, result)| (group.as_str(), sub.as_str(), result))
        })
    }

    pub fn into_inner(self) -> AggregateState {
        self.0
    }
}
