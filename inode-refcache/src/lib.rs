//! Inode reference cache for user-space filesystems.
//!
//! Tracks open handles and unlink state per inode so a FUSE-style protocol
//! layer can implement POSIX unlink-while-open: an inode whose last name is
//! removed survives until its last open handle is released, and is then
//! deleted exactly once.
//!
//! # Modules
//!
//! - [`cache`] - the [`InodeCache`] itself
//! - [`dispatch`] - callback glue that turns cache decisions into storage deletes
//! - [`config`] - INI configuration
//! - [`logging`] - tracing subscriber setup

pub mod cache;
pub mod config;
pub mod dispatch;
pub mod logging;

pub use cache::{CacheStatsSnapshot, InodeCache, InodeCacheError, InodeEntry, InodeId};
pub use dispatch::{Disposition, InodeLifecycle, InodeStore, MemoryStore, StoreError};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
