//! Multi-threaded tests for the inode cache and its dispatch glue.
//!
//! These tests verify, under real thread interleavings:
//! - no lost updates on a single hot inode
//! - unlink-while-open deletes each inode exactly once
//! - teardown after balanced traffic finds nothing leaked
//!
//! Run with: `cargo test --test concurrent_refcount`

use std::collections::HashMap;
use std::sync::{Arc, Barrier};
use std::thread;

use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use inode_refcache::{Disposition, InodeCache, InodeLifecycle, MemoryStore};

// ============================================================================
// Helper Functions
// ============================================================================

fn run_threads<F>(threads: usize, body: F)
where
    F: Fn(usize) + Send + Sync + 'static,
{
    let body = Arc::new(body);
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let body = Arc::clone(&body);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                body(t);
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

// ============================================================================
// Integration Tests
// ============================================================================

#[test]
fn test_hot_inode_no_lost_updates() {
    let cache = Arc::new(InodeCache::new());
    let threads = 16;
    let per_thread = 2_000;

    let shared = Arc::clone(&cache);
    run_threads(threads, move |_| {
        for _ in 0..per_thread {
            shared.get_ref(42).unwrap();
            shared.put(42, 1);
        }
    });

    assert!(!cache.contains(42));
    assert_eq!(cache.open_handles(), 0);
    let stats = cache.stats();
    assert_eq!(stats.refs_acquired, (threads * per_thread) as u64);
    assert_eq!(stats.refs_released, (threads * per_thread) as u64);
    assert_eq!(stats.outstanding_refs(), 0);
}

#[test]
fn test_held_references_survive_concurrent_churn() {
    let cache = Arc::new(InodeCache::new());
    // One long-lived handle keeps the entry alive while others churn.
    cache.get_ref(1).unwrap();

    let shared = Arc::clone(&cache);
    run_threads(8, move |_| {
        for _ in 0..1_000 {
            shared.get_ref(1).unwrap();
            assert!(!shared.put(1, 1));
        }
    });

    assert_eq!(cache.peek(1).unwrap().open_count, 1);
    assert!(!cache.mark_unlinked(1));
    assert!(cache.put(1, 1));
}

#[test]
fn test_unlink_races_release_deletes_once() {
    for round in 0..50u64 {
        let ino = 1_000 + round;
        let fs = InodeLifecycle::new(
            Arc::new(InodeCache::new()),
            Arc::new(MemoryStore::with_inodes([ino])),
        );
        let openers = 4;
        for _ in 0..openers {
            fs.open(ino).unwrap();
        }

        let shared = fs.clone();
        run_threads(openers + 1, move |t| {
            if t == 0 {
                shared.unlink(ino).unwrap();
            } else {
                shared.release(ino, 1).unwrap();
            }
        });

        assert!(fs.store().is_deleted(ino), "round {round}");
        assert_eq!(fs.store().deletions(), 1, "round {round}");
        assert!(fs.cache().is_empty());
    }
}

/// Random open/release/unlink traffic over a small inode set.
///
/// Per-inode name locks model the directory: an inode can only be opened
/// while it still has a name, and unlink removes the name under the write
/// lock. Every unlinked inode must be deleted exactly once by the end.
#[test]
fn test_random_traffic_deletes_every_unlinked_inode_once() {
    let inodes: u64 = 64;
    let threads = 8;
    let ops = 5_000;

    let store = Arc::new(MemoryStore::with_inodes(0..inodes));
    let fs = InodeLifecycle::new(Arc::new(InodeCache::new()), Arc::clone(&store));
    let names: Arc<Vec<RwLock<bool>>> = Arc::new((0..inodes).map(|_| RwLock::new(true)).collect());

    let shared = fs.clone();
    let shared_names = Arc::clone(&names);
    run_threads(threads, move |t| {
        let mut rng = StdRng::seed_from_u64(0x5eed + t as u64);
        let mut held: HashMap<u64, u64> = HashMap::new();

        for _ in 0..ops {
            let ino = rng.random_range(0..inodes);
            match rng.random_range(0..100) {
                0..=54 => {
                    let name = shared_names[ino as usize].read();
                    if *name {
                        shared.open(ino).unwrap();
                        *held.entry(ino).or_default() += 1;
                    }
                }
                55..=97 => {
                    if let Some(count) = held.get_mut(&ino) {
                        let n = rng.random_range(1..=*count);
                        *count -= n;
                        if *count == 0 {
                            held.remove(&ino);
                        }
                        shared.release(ino, n).unwrap();
                    }
                }
                _ => {
                    let mut name = shared_names[ino as usize].write();
                    if *name {
                        *name = false;
                        shared.unlink(ino).unwrap();
                    }
                }
            }
        }

        for (ino, count) in held {
            shared.release(ino, count).unwrap();
        }
    });

    let unlinked = names.iter().filter(|name| !*name.read()).count();
    assert_eq!(store.deletions() as usize, unlinked);
    for ino in 0..inodes {
        assert_eq!(store.is_deleted(ino), !*names[ino as usize].read());
    }

    let cache = Arc::clone(fs.cache());
    drop(fs);
    let cache = Arc::try_unwrap(cache).unwrap_or_else(|_| panic!("cache still shared"));
    assert!(cache.destroy().is_empty());
}

#[test]
fn test_release_disposition_sequence() {
    let fs = InodeLifecycle::new(
        Arc::new(InodeCache::new()),
        Arc::new(MemoryStore::with_inodes([5])),
    );
    fs.open(5).unwrap();
    fs.open(5).unwrap();

    assert_eq!(fs.unlink(5).unwrap(), Disposition::Deferred);
    assert_eq!(fs.release(5, 1).unwrap(), Disposition::Retained);
    assert_eq!(fs.release(5, 1).unwrap(), Disposition::Deleted);
}

#[test]
fn test_forget_races_release_without_panic_or_double_delete() {
    for round in 0..50u64 {
        let ino = 2_000 + round;
        let fs = InodeLifecycle::new(
            Arc::new(InodeCache::new()),
            Arc::new(MemoryStore::with_inodes([ino])),
        );
        fs.lookup(ino).unwrap();
        fs.open(ino).unwrap();
        assert_eq!(fs.unlink(ino).unwrap(), Disposition::Deferred);

        let shared = fs.clone();
        run_threads(2, move |t| {
            if t == 0 {
                shared.release(ino, 1).unwrap();
            } else {
                shared.forget(ino).unwrap();
            }
        });

        assert!(fs.store().is_deleted(ino), "round {round}");
        assert_eq!(fs.store().deletions(), 1, "round {round}");
        assert!(fs.cache().is_empty());
    }
}
