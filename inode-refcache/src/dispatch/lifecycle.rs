//! Open/unlink/release handling on top of the cache.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use super::store::{InodeStore, StoreError};
use crate::cache::{InodeCache, InodeCacheError, InodeEntry, InodeId};

/// What happened to the storage object after an unlink or release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The storage object was deleted.
    Deleted,
    /// Unlinked while open; deletion waits for the last release.
    Deferred,
    /// Released but still referenced, or drained without being unlinked.
    Retained,
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Disposition::Deleted => "deleted",
            Disposition::Deferred => "deferred",
            Disposition::Retained => "retained",
        };
        f.write_str(name)
    }
}

/// Routes filesystem callbacks through the cache and into the store.
///
/// The cache lock is never held while the store runs: the cache decides,
/// returns, and only then is `delete_inode` called. By that point the entry
/// is already gone, so exactly one caller ever sees the delete signal for a
/// given unlink.
pub struct InodeLifecycle<S: InodeStore> {
    cache: Arc<InodeCache>,
    store: Arc<S>,
}

impl<S: InodeStore> Clone for InodeLifecycle<S> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: InodeStore> InodeLifecycle<S> {
    pub fn new(cache: Arc<InodeCache>, store: Arc<S>) -> Self {
        Self { cache, store }
    }

    pub fn cache(&self) -> &Arc<InodeCache> {
        &self.cache
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Lookup callback: cache the inode without opening it.
    pub fn lookup(&self, ino: InodeId) -> Result<InodeEntry, InodeCacheError> {
        self.cache.get(ino)
    }

    /// Open/create callback: grant one handle.
    pub fn open(&self, ino: InodeId) -> Result<InodeEntry, InodeCacheError> {
        self.cache.get_ref(ino).inspect_err(|e| {
            warn!(ino, error = %e, "Open refused");
        })
    }

    /// Unlink callback for the inode's last name.
    pub fn unlink(&self, ino: InodeId) -> Result<Disposition, StoreError> {
        if self.cache.mark_unlinked(ino) {
            self.delete(ino)
        } else {
            debug!(ino, "Unlinked while open, deletion deferred");
            Ok(Disposition::Deferred)
        }
    }

    /// Release callback for `count` handles.
    pub fn release(&self, ino: InodeId, count: u64) -> Result<Disposition, StoreError> {
        if self.cache.put(ino, count) {
            self.delete(ino)
        } else {
            Ok(Disposition::Retained)
        }
    }

    /// Forget callback: the kernel dropped its lookup references.
    ///
    /// Pairs with [`lookup`](Self::lookup). An entry that was only looked
    /// up has no handles for a release to drain, so an unlink while it is
    /// cached is deferred to here. Open entries are left to `release`.
    pub fn forget(&self, ino: InodeId) -> Result<Disposition, StoreError> {
        if self.cache.forget(ino) {
            self.delete(ino)
        } else {
            Ok(Disposition::Retained)
        }
    }

    fn delete(&self, ino: InodeId) -> Result<Disposition, StoreError> {
        match self.store.delete_inode(ino) {
            Ok(()) => {
                debug!(ino, "Inode deleted");
                Ok(Disposition::Deleted)
            }
            Err(e) => {
                warn!(ino, error = %e, "Inode delete failed");
                Err(e)
            }
        }
    }
}
