//! The inode reference table.
//!
//! One `parking_lot::Mutex` guards the whole map and every entry's fields.
//! Each public operation takes the lock once, does its lookup and mutation
//! inside that single critical section, and releases it before returning, so
//! a `get_ref` and a concurrent `put` on the same inode can never interleave
//! between "look up" and "adjust count". Nothing blocking happens under the
//! lock.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::{debug, error, trace, warn};

use super::entry::{EntryState, InodeEntry, InodeId};
use super::error::InodeCacheError;
use super::stats::{CacheStats, CacheStatsSnapshot};
use crate::config::CacheConfig;

type Table = HashMap<InodeId, EntryState>;

/// Open/unlink reference cache for inodes.
///
/// Construct once at startup and share via `Arc`. Call [`destroy`] at
/// shutdown to collect any entries whose handles were never released.
///
/// [`destroy`]: InodeCache::destroy
///
/// # Example
///
/// ```
/// use inode_refcache::InodeCache;
///
/// let cache = InodeCache::new();
///
/// cache.get_ref(42).unwrap();
/// cache.get_ref(42).unwrap();
///
/// // Still open: deletion of the storage object must wait.
/// assert!(!cache.mark_unlinked(42));
///
/// assert!(!cache.put(42, 1));
/// // Last handle closed on an unlinked inode: delete it now.
/// assert!(cache.put(42, 1));
/// assert!(cache.is_empty());
/// ```
pub struct InodeCache {
    table: Mutex<Table>,
    stats: CacheStats,
    leak_report_limit: usize,
    #[cfg(test)]
    fail_allocs: std::sync::atomic::AtomicBool,
}

impl InodeCache {
    /// Create a cache with default configuration.
    pub fn new() -> Self {
        Self::with_config(&CacheConfig::default())
    }

    /// Create a cache, pre-sizing the table from `config`.
    ///
    /// # Panics
    ///
    /// Panics if the initial table cannot be allocated. There is no useful
    /// way to serve a filesystem without it.
    pub fn with_config(config: &CacheConfig) -> Self {
        let mut table = Table::new();
        if let Err(e) = table.try_reserve(config.initial_capacity) {
            error!(
                capacity = config.initial_capacity,
                error = %e,
                "Failed to allocate inode table"
            );
            panic!(
                "inode cache: cannot allocate table for {} entries: {}",
                config.initial_capacity, e
            );
        }

        debug!(
            capacity = config.initial_capacity,
            leak_report_limit = config.leak_report_limit,
            "Inode cache initialized"
        );

        Self {
            table: Mutex::new(table),
            stats: CacheStats::default(),
            leak_report_limit: config.leak_report_limit,
            #[cfg(test)]
            fail_allocs: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// Look up `ino`, creating a closed entry if none exists.
    ///
    /// Does not take an open reference.
    pub fn get(&self, ino: InodeId) -> Result<InodeEntry, InodeCacheError> {
        let mut table = self.table.lock();
        let state = self.lookup_or_create(&mut table, ino)?;
        trace!(ino, open_count = state.open_count, "get");
        Ok(state.snapshot(ino))
    }

    /// Look up `ino` (creating it if needed) and take one open reference.
    ///
    /// Must be called exactly once per open handle granted to a client. The
    /// returned snapshot already includes the new reference. On error no
    /// reference is taken and no entry is inserted.
    pub fn get_ref(&self, ino: InodeId) -> Result<InodeEntry, InodeCacheError> {
        let mut table = self.table.lock();
        let state = self.lookup_or_create(&mut table, ino)?;
        state.open_count += 1;
        self.stats.ref_acquired();
        trace!(ino, open_count = state.open_count, "get_ref");
        Ok(state.snapshot(ino))
    }

    /// Record that the last name of `ino` was removed.
    ///
    /// Returns `true` when no entry exists, meaning nothing has the inode
    /// open and the caller may delete the storage object right away.
    /// Returns `false` when the inode is cached; deletion is then reported
    /// by the `put` that drains it. Never creates an entry.
    pub fn mark_unlinked(&self, ino: InodeId) -> bool {
        let mut table = self.table.lock();
        let immediate = match table.get_mut(&ino) {
            Some(state) => {
                state.unlinked = true;
                trace!(ino, open_count = state.open_count, "unlink deferred");
                false
            }
            None => {
                trace!(ino, "unlink with no open references");
                true
            }
        };
        self.stats.unlink(immediate);
        immediate
    }

    /// Release `count` references on `ino`.
    ///
    /// When the count reaches zero the entry is removed and its unlinked
    /// flag is returned: `true` means the caller must now delete the storage
    /// object. Otherwise returns `false`.
    ///
    /// # Panics
    ///
    /// Panics if `ino` has no entry or holds fewer than `count` references.
    /// Either means the caller's reference accounting is already wrong, and
    /// carrying on would risk deleting a live inode or leaking a dead one.
    pub fn put(&self, ino: InodeId, count: u64) -> bool {
        let mut table = self.table.lock();

        let Some(state) = table.get_mut(&ino) else {
            error!(ino, count, "Release of inode with no cache entry");
            panic!("inode cache: put({ino}, {count}) on inode with no cache entry");
        };

        if state.open_count < count {
            let held = state.open_count;
            error!(ino, count, held, "Release exceeds held references");
            panic!("inode cache: put({ino}, {count}) exceeds {held} held references");
        }

        state.open_count -= count;
        self.stats.refs_released(count);

        if state.open_count > 0 {
            trace!(ino, open_count = state.open_count, "put");
            return false;
        }

        let unlinked = state.unlinked;
        table.remove(&ino);
        self.stats.entry_destroyed(unlinked);
        debug!(ino, unlinked, "Inode entry drained");
        unlinked
    }

    /// Drop a closed entry left behind by `get`.
    ///
    /// If `ino` is cached with no open references the entry is removed and
    /// its unlinked flag returned, exactly as a draining `put(ino, 0)`
    /// would. A missing or still-open entry is left alone and `false` is
    /// returned, so this is safe to race with releases on the same inode.
    pub fn forget(&self, ino: InodeId) -> bool {
        let mut table = self.table.lock();
        match table.get(&ino) {
            Some(state) if state.open_count == 0 => {
                let unlinked = state.unlinked;
                table.remove(&ino);
                self.stats.entry_destroyed(unlinked);
                debug!(ino, unlinked, "Closed inode entry forgotten");
                unlinked
            }
            Some(state) => {
                trace!(ino, open_count = state.open_count, "forget on open inode");
                false
            }
            None => {
                trace!(ino, "forget on uncached inode");
                false
            }
        }
    }

    /// Snapshot of `ino` without creating an entry.
    pub fn peek(&self, ino: InodeId) -> Option<InodeEntry> {
        self.table.lock().get(&ino).map(|state| state.snapshot(ino))
    }

    /// Whether an entry exists for `ino`.
    pub fn contains(&self, ino: InodeId) -> bool {
        self.table.lock().contains_key(&ino)
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.table.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.lock().is_empty()
    }

    /// Total open references across all entries.
    pub fn open_handles(&self) -> u64 {
        self.table
            .lock()
            .values()
            .map(|state| state.open_count)
            .sum()
    }

    /// Current activity counters.
    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }

    /// Tear the cache down, returning every entry still present.
    ///
    /// Anything returned is a handle whose `put` was never issued. Each is
    /// logged as a leak and handed back sorted by inode so the caller can
    /// clean up deterministically (for example, delete the unlinked ones).
    pub fn destroy(mut self) -> Vec<InodeEntry> {
        let table = std::mem::take(self.table.get_mut());
        let leaked = drain_sorted(table);
        report_leaks(&leaked, self.leak_report_limit);
        debug!(leaked = leaked.len(), "Inode cache destroyed");
        leaked
    }

    fn lookup_or_create<'t>(
        &self,
        table: &'t mut Table,
        ino: InodeId,
    ) -> Result<&'t mut EntryState, InodeCacheError> {
        if !table.contains_key(&ino) {
            if self.reserve_slot(table).is_err() {
                self.stats.alloc_failure();
                warn!(ino, entries = table.len(), "Failed to allocate inode entry");
                return Err(InodeCacheError::OutOfMemory { ino });
            }
            self.stats.entry_created();
            debug!(ino, "Inode entry created");
        }
        Ok(table.entry(ino).or_default())
    }

    #[cfg(not(test))]
    fn reserve_slot(&self, table: &mut Table) -> Result<(), std::collections::TryReserveError> {
        table.try_reserve(1)
    }

    #[cfg(test)]
    fn reserve_slot(&self, table: &mut Table) -> Result<(), std::collections::TryReserveError> {
        if self.fail_allocs.load(std::sync::atomic::Ordering::Relaxed) {
            // Forces a genuine TryReserveError (capacity overflow).
            return table.try_reserve(usize::MAX);
        }
        table.try_reserve(1)
    }
}

impl Default for InodeCache {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InodeCache {
    fn drop(&mut self) {
        let table = std::mem::take(self.table.get_mut());
        if !table.is_empty() {
            warn!(
                leaked = table.len(),
                "Inode cache dropped without destroy()"
            );
            report_leaks(&drain_sorted(table), self.leak_report_limit);
        }
    }
}

fn drain_sorted(table: Table) -> Vec<InodeEntry> {
    let mut entries: Vec<InodeEntry> = table
        .into_iter()
        .map(|(ino, state)| state.snapshot(ino))
        .collect();
    entries.sort_unstable_by_key(|entry| entry.key);
    entries
}

fn report_leaks(leaked: &[InodeEntry], limit: usize) {
    for entry in leaked.iter().take(limit) {
        warn!(
            ino = entry.key,
            open_count = entry.open_count,
            unlinked = entry.unlinked,
            "Leaked inode reference at cache teardown"
        );
    }
    if leaked.len() > limit {
        warn!(
            omitted = leaked.len() - limit,
            total = leaked.len(),
            "Further leaked inode references not listed"
        );
    }
}
