//! Storage engine boundary.
//!
//! The cache only decides *when* an inode may be deleted; the storage engine
//! does the deleting. [`InodeStore`] is the one call the dispatch glue needs
//! from it.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use thiserror::Error;
use tracing::trace;

use crate::cache::InodeId;

/// Errors reported by a storage engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The inode is not known to the store.
    #[error("Inode {ino} not found")]
    NotFound { ino: InodeId },

    /// The inode was already deleted once.
    #[error("Inode {ino} already deleted")]
    AlreadyDeleted { ino: InodeId },

    /// Backend-specific failure.
    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Errno the protocol layer should hand back to its client.
    pub fn errno(&self) -> i32 {
        match self {
            StoreError::NotFound { .. } | StoreError::AlreadyDeleted { .. } => libc::ENOENT,
            StoreError::Backend(_) => libc::EIO,
        }
    }
}

/// Deletes inode objects from backing storage.
///
/// Implementations must be `Send + Sync`; deletions are issued from
/// whichever dispatch thread released the last reference.
pub trait InodeStore: Send + Sync {
    /// Free the storage object backing `ino`.
    fn delete_inode(&self, ino: InodeId) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
struct MemoryStoreState {
    live: HashSet<InodeId>,
    deleted: HashSet<InodeId>,
}

/// In-memory [`InodeStore`] that records every deletion.
///
/// Deleting an inode twice is reported as [`StoreError::AlreadyDeleted`],
/// which makes double-frees visible to callers.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryStoreState>,
    deletions: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding `inodes`.
    pub fn with_inodes(inodes: impl IntoIterator<Item = InodeId>) -> Self {
        let store = Self::new();
        store.state.lock().live.extend(inodes);
        store
    }

    /// Whether `ino` exists and has not been deleted.
    pub fn is_live(&self, ino: InodeId) -> bool {
        self.state.lock().live.contains(&ino)
    }

    /// Whether `ino` was deleted.
    pub fn is_deleted(&self, ino: InodeId) -> bool {
        self.state.lock().deleted.contains(&ino)
    }

    /// Number of live inodes.
    pub fn live_count(&self) -> usize {
        self.state.lock().live.len()
    }

    /// Successful deletions so far.
    pub fn deletions(&self) -> u64 {
        self.deletions.load(Ordering::Relaxed)
    }
}

impl InodeStore for MemoryStore {
    fn delete_inode(&self, ino: InodeId) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        if state.deleted.contains(&ino) {
            return Err(StoreError::AlreadyDeleted { ino });
        }
        if !state.live.remove(&ino) {
            return Err(StoreError::NotFound { ino });
        }
        state.deleted.insert(ino);
        self.deletions.fetch_add(1, Ordering::Relaxed);
        trace!(ino, "Inode deleted from memory store");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_live_inode() {
        let store = MemoryStore::with_inodes([1, 2]);
        store.delete_inode(1).unwrap();

        assert!(!store.is_live(1));
        assert!(store.is_deleted(1));
        assert!(store.is_live(2));
        assert_eq!(store.deletions(), 1);
        assert_eq!(store.live_count(), 1);
    }

    #[test]
    fn test_double_delete_is_reported() {
        let store = MemoryStore::with_inodes([1]);
        store.delete_inode(1).unwrap();

        assert_eq!(
            store.delete_inode(1),
            Err(StoreError::AlreadyDeleted { ino: 1 })
        );
        assert_eq!(store.deletions(), 1);
    }

    #[test]
    fn test_delete_unknown_inode() {
        let store = MemoryStore::new();
        assert_eq!(store.delete_inode(5), Err(StoreError::NotFound { ino: 5 }));
    }

    #[test]
    fn test_store_error_errno() {
        assert_eq!(StoreError::NotFound { ino: 1 }.errno(), libc::ENOENT);
        assert_eq!(StoreError::Backend("disk".into()).errno(), libc::EIO);
    }
}
