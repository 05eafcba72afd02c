//! Glue between filesystem callbacks, the cache, and the storage engine.
//!
//! A protocol layer maps its callbacks onto [`InodeLifecycle`]:
//!
//! | Callback        | Call                      |
//! |-----------------|---------------------------|
//! | lookup          | [`InodeLifecycle::lookup`]  |
//! | open / create   | [`InodeLifecycle::open`]    |
//! | unlink          | [`InodeLifecycle::unlink`]  |
//! | release         | [`InodeLifecycle::release`] |
//! | forget          | [`InodeLifecycle::forget`]  |
//!
//! Every `lookup` must eventually be followed by a `forget` once the kernel
//! drops the inode, just as every `open` is followed by a `release`. An
//! inode unlinked while only looked up is deleted by that `forget`.
//!
//! Errors carry an `errno()` for replying to the kernel.

mod lifecycle;
mod store;

pub use lifecycle::{Disposition, InodeLifecycle};
pub use store::{InodeStore, MemoryStore, StoreError};
