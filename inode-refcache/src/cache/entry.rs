//! Per-inode open/unlink state.

/// Opaque 64-bit inode identifier assigned by the storage engine.
pub type InodeId = u64;

/// Point-in-time copy of one inode's cached state.
///
/// Callers never hold a reference into the cache table; every operation
/// hands back one of these by value, so a concurrent `put` that destroys
/// the entry cannot leave a caller looking at freed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InodeEntry {
    /// Inode identifier.
    pub key: InodeId,
    /// Outstanding open handles.
    pub open_count: u64,
    /// Last name removed while the inode may still be open.
    pub unlinked: bool,
}

/// Mutable state stored in the table. Keyed by [`InodeId`], so the key
/// itself is not repeated here.
#[derive(Debug, Default)]
pub(crate) struct EntryState {
    pub(crate) open_count: u64,
    pub(crate) unlinked: bool,
}

impl EntryState {
    pub(crate) fn snapshot(&self, key: InodeId) -> InodeEntry {
        InodeEntry {
            key,
            open_count: self.open_count,
            unlinked: self.unlinked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_closed_and_linked() {
        let state = EntryState::default();
        let entry = state.snapshot(7);

        assert_eq!(entry.key, 7);
        assert_eq!(entry.open_count, 0);
        assert!(!entry.unlinked);
    }

    #[test]
    fn test_snapshot_is_detached_from_state() {
        let mut state = EntryState::default();
        state.open_count = 2;
        let before = state.snapshot(1);

        state.open_count = 5;
        state.unlinked = true;

        assert_eq!(before.open_count, 2);
        assert!(!before.unlinked);
        assert_eq!(state.snapshot(1).open_count, 5);
    }
}
