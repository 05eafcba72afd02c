//! Property tests for open/release accounting.
//!
//! Run with: `cargo test --test refcount_properties`

use proptest::prelude::*;

use inode_refcache::InodeCache;

#[derive(Debug, Clone)]
enum Op {
    Open,
    Release(u64),
    Unlink,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => Just(Op::Open),
        3 => (1u64..4).prop_map(Op::Release),
        1 => Just(Op::Unlink),
    ]
}

proptest! {
    /// Count tracks acquired minus released; the entry exists iff it is positive.
    #[test]
    fn test_open_count_matches_model(ops in prop::collection::vec(op_strategy(), 0..200)) {
        let cache = InodeCache::new();
        let ino = 42;
        let mut held: u64 = 0;

        for op in ops {
            match op {
                Op::Open => {
                    let entry = cache.get_ref(ino).unwrap();
                    held += 1;
                    prop_assert_eq!(entry.open_count, held);
                }
                Op::Release(n) => {
                    // Only valid releases; over-release is a contract violation.
                    if n <= held {
                        cache.put(ino, n);
                        held -= n;
                    }
                }
                Op::Unlink => {
                    let immediate = cache.mark_unlinked(ino);
                    prop_assert_eq!(immediate, held == 0);
                }
            }

            prop_assert_eq!(cache.contains(ino), held > 0);
            prop_assert_eq!(cache.open_handles(), held);
        }
    }

    /// The draining put reports true iff an unlink happened while open.
    #[test]
    fn test_drain_reports_unlink(opens in 1u64..20, unlink_after in 0u64..20) {
        let cache = InodeCache::new();
        let ino = 7;
        let unlink_at = unlink_after.min(opens - 1);
        let mut unlinked = false;

        for _ in 0..opens {
            cache.get_ref(ino).unwrap();
        }
        for released in 0..opens {
            if released == unlink_at {
                prop_assert!(!cache.mark_unlinked(ino));
                unlinked = true;
            }
            let delete = cache.put(ino, 1);
            let last = released + 1 == opens;
            prop_assert_eq!(delete, last && unlinked);
        }

        prop_assert!(cache.is_empty());
    }

    /// Inodes never interfere with each other.
    #[test]
    fn test_inodes_are_independent(
        counts in prop::collection::vec(0u64..8, 1..16)
    ) {
        let cache = InodeCache::new();

        for (ino, count) in counts.iter().enumerate() {
            for _ in 0..*count {
                cache.get_ref(ino as u64).unwrap();
            }
        }

        for (ino, count) in counts.iter().enumerate() {
            let ino = ino as u64;
            match cache.peek(ino) {
                Some(entry) => prop_assert_eq!(entry.open_count, *count),
                None => prop_assert_eq!(*count, 0),
            }
        }

        let live = counts.iter().filter(|c| **c > 0).count();
        prop_assert_eq!(cache.len(), live);
    }
}
