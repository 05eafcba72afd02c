//! Inode open/unlink reference cache.
//!
//! Tracks, per inode identifier, how many open handles the filesystem has
//! granted and whether the inode's last name has been removed. The protocol
//! layer consults it to implement POSIX unlink-while-open: an unlinked inode
//! is only deleted from storage once its last open handle is released.
//!
//! # Lifecycle of an entry
//!
//! ```text
//!  get/get_ref          get_ref            mark_unlinked          put → 0
//! ───────────► Created ────────► Open(k) ──────────────► Open(k, unlinked) ──────► Destroyed
//!             (0, linked)                                                          (put returns true)
//! ```
//!
//! A `put` that drains an entry that was never unlinked returns `false`.
//! Destroyed is terminal; the same identifier may be cached again later with
//! no memory of its previous state.
//!
//! # Concurrency
//!
//! Every operation runs under one table-wide lock. See [`InodeCache`].

mod entry;
mod error;
mod stats;
mod table;

pub use entry::{InodeEntry, InodeId};
pub use error::InodeCacheError;
pub use stats::CacheStatsSnapshot;
pub use table::InodeCache;
