//! Cache activity counters.
//!
//! Counters are plain atomics bumped alongside the table mutation they
//! describe. They are informational only: no decision in the cache reads
//! them back.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters owned by an [`InodeCache`](super::InodeCache).
#[derive(Debug, Default)]
pub(crate) struct CacheStats {
    entries_created: AtomicU64,
    entries_destroyed: AtomicU64,
    refs_acquired: AtomicU64,
    refs_released: AtomicU64,
    unlinks_immediate: AtomicU64,
    unlinks_deferred: AtomicU64,
    deferred_deletes: AtomicU64,
    alloc_failures: AtomicU64,
}

impl CacheStats {
    pub(crate) fn entry_created(&self) {
        self.entries_created.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn entry_destroyed(&self, unlinked: bool) {
        self.entries_destroyed.fetch_add(1, Ordering::Relaxed);
        if unlinked {
            self.deferred_deletes.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn ref_acquired(&self) {
        self.refs_acquired.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn refs_released(&self, count: u64) {
        self.refs_released.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn unlink(&self, immediate: bool) {
        let counter = if immediate {
            &self.unlinks_immediate
        } else {
            &self.unlinks_deferred
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn alloc_failure(&self) {
        self.alloc_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            entries_created: self.entries_created.load(Ordering::Relaxed),
            entries_destroyed: self.entries_destroyed.load(Ordering::Relaxed),
            refs_acquired: self.refs_acquired.load(Ordering::Relaxed),
            refs_released: self.refs_released.load(Ordering::Relaxed),
            unlinks_immediate: self.unlinks_immediate.load(Ordering::Relaxed),
            unlinks_deferred: self.unlinks_deferred.load(Ordering::Relaxed),
            deferred_deletes: self.deferred_deletes.load(Ordering::Relaxed),
            alloc_failures: self.alloc_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the cache counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStatsSnapshot {
    /// Entries manufactured by `get`/`get_ref`.
    pub entries_created: u64,
    /// Entries removed by a draining `put` or `forget`.
    pub entries_destroyed: u64,
    /// Open references granted by `get_ref`.
    pub refs_acquired: u64,
    /// References returned through `put`.
    pub refs_released: u64,
    /// `mark_unlinked` calls that found no entry (delete now).
    pub unlinks_immediate: u64,
    /// `mark_unlinked` calls that found an open entry (delete later).
    pub unlinks_deferred: u64,
    /// Drains that reported an unlinked inode.
    pub deferred_deletes: u64,
    /// Entry allocations that failed.
    pub alloc_failures: u64,
}

impl CacheStatsSnapshot {
    /// References granted but not yet released.
    pub fn outstanding_refs(&self) -> u64 {
        self.refs_acquired.saturating_sub(self.refs_released)
    }
}

impl fmt::Display for CacheStatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "entries: {} created, {} destroyed; refs: {} acquired, {} released; \
             unlinks: {} immediate, {} deferred; deferred deletes: {}; alloc failures: {}",
            self.entries_created,
            self.entries_destroyed,
            self.refs_acquired,
            self.refs_released,
            self.unlinks_immediate,
            self.unlinks_deferred,
            self.deferred_deletes,
            self.alloc_failures
        )
    }
}
