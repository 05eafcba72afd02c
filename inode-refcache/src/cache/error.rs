//! Recoverable cache errors.
//!
//! Only resource exhaustion is reported through this type. Accounting
//! violations (releasing references that were never taken) are bugs in the
//! caller and abort via panic instead.

use thiserror::Error;

use super::entry::InodeId;

/// Errors returned by [`InodeCache`](super::InodeCache) lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InodeCacheError {
    /// The table could not grow to hold a new entry.
    #[error("Out of memory allocating cache entry for inode {ino}")]
    OutOfMemory { ino: InodeId },
}

impl InodeCacheError {
    /// Errno the protocol layer should hand back to its client.
    pub fn errno(&self) -> i32 {
        match self {
            InodeCacheError::OutOfMemory { .. } => libc::ENOMEM,
        }
    }
}
