//! Multi-threaded soak run against the inode cache.
//!
//! Worker threads issue random open, release and unlink callbacks over a
//! fixed set of inodes backed by an in-memory store. Each inode has a name
//! lock standing in for its directory entry: opens take it shared and only
//! succeed while the name exists; unlink takes it exclusive and removes the
//! name. At the end every thread releases what it still holds and the run
//! checks that each unlinked inode was deleted exactly once, no linked inode
//! was deleted, and the cache is empty.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::Args;
use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use inode_refcache::config::CacheConfig;
use inode_refcache::{CacheStatsSnapshot, InodeCache, InodeId, InodeLifecycle, MemoryStore};

use crate::error::CliError;

/// Percent of operations that are opens.
const OPEN_PERCENT: u32 = 55;
/// Percent of operations that are releases.
const RELEASE_PERCENT: u32 = 43;

/// Soak run arguments.
#[derive(Debug, Clone, Args)]
pub struct SoakArgs {
    /// Worker threads
    #[arg(long, default_value_t = 8)]
    pub threads: usize,

    /// Distinct inodes in play
    #[arg(long, default_value_t = 256)]
    pub inodes: u64,

    /// Operations per thread
    #[arg(long, default_value_t = 100_000)]
    pub ops: usize,

    /// RNG seed (each thread derives its own from this)
    #[arg(long, default_value_t = 0x5eed)]
    pub seed: u64,
}

/// Outcome of a soak run.
#[derive(Debug, Clone)]
pub struct SoakReport {
    pub elapsed: Duration,
    pub unlinked: usize,
    pub deleted: u64,
    pub leaked: usize,
    pub stats: CacheStatsSnapshot,
}

/// Run the soak command.
pub fn run(args: SoakArgs, cache_config: &CacheConfig) -> Result<(), CliError> {
    let report = soak(&args, cache_config)?;

    println!("Soak finished in {:.2?}", report.elapsed);
    println!("  Inodes unlinked: {}", report.unlinked);
    println!("  Inodes deleted:  {}", report.deleted);
    println!("  Leaked entries:  {}", report.leaked);
    println!("  {}", report.stats);

    verify(&report)
}

/// Drive the cache and collect a report.
pub fn soak(args: &SoakArgs, cache_config: &CacheConfig) -> Result<SoakReport, CliError> {
    if args.threads == 0 || args.inodes == 0 {
        return Err(CliError::InvalidArgument(
            "--threads and --inodes must be at least 1".to_string(),
        ));
    }

    info!(
        threads = args.threads,
        inodes = args.inodes,
        ops = args.ops,
        seed = args.seed,
        "Starting soak run"
    );

    let store = Arc::new(MemoryStore::with_inodes(0..args.inodes));
    let cache = Arc::new(InodeCache::with_config(cache_config));
    let fs = InodeLifecycle::new(Arc::clone(&cache), Arc::clone(&store));
    let names: Arc<Vec<RwLock<bool>>> =
        Arc::new((0..args.inodes).map(|_| RwLock::new(true)).collect());

    let started = Instant::now();
    let workers: Vec<_> = (0..args.threads)
        .map(|t| {
            let fs = fs.clone();
            let names = Arc::clone(&names);
            let seed = args.seed.wrapping_add(t as u64);
            let inodes = args.inodes;
            let ops = args.ops;
            thread::spawn(move || worker(&fs, &names, inodes, ops, seed))
        })
        .collect();

    for handle in workers {
        handle
            .join()
            .map_err(|_| CliError::SoakFailed("worker thread panicked".to_string()))??;
    }
    let elapsed = started.elapsed();

    let unlinked = names.iter().filter(|name| !*name.read()).count();
    let wrongly_deleted = (0..args.inodes)
        .filter(|ino| *names[*ino as usize].read() && store.is_deleted(*ino))
        .count();
    if wrongly_deleted > 0 {
        return Err(CliError::SoakFailed(format!(
            "{} linked inodes were deleted",
            wrongly_deleted
        )));
    }

    let stats = cache.stats();
    drop(fs);
    let leaked = match Arc::try_unwrap(cache) {
        Ok(cache) => cache.destroy().len(),
        Err(cache) => cache.len(),
    };

    Ok(SoakReport {
        elapsed,
        unlinked,
        deleted: store.deletions(),
        leaked,
        stats,
    })
}

fn worker(
    fs: &InodeLifecycle<MemoryStore>,
    names: &[RwLock<bool>],
    inodes: u64,
    ops: usize,
    seed: u64,
) -> Result<(), CliError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut held: HashMap<InodeId, u64> = HashMap::new();

    for _ in 0..ops {
        let ino = rng.random_range(0..inodes);
        let roll = rng.random_range(0..100u32);

        if roll < OPEN_PERCENT {
            let name = names[ino as usize].read();
            if *name {
                fs.open(ino)?;
                *held.entry(ino).or_default() += 1;
            }
        } else if roll < OPEN_PERCENT + RELEASE_PERCENT {
            if let Some(count) = held.get_mut(&ino) {
                let n = rng.random_range(1..=*count);
                *count -= n;
                if *count == 0 {
                    held.remove(&ino);
                }
                fs.release(ino, n)?;
            }
        } else {
            let mut name = names[ino as usize].write();
            if *name {
                *name = false;
                fs.unlink(ino)?;
            }
        }
    }

    debug!(seed, remaining = held.len(), "Worker draining held handles");
    for (ino, count) in held {
        fs.release(ino, count)?;
    }
    Ok(())
}

/// Check the report's accounting.
pub fn verify(report: &SoakReport) -> Result<(), CliError> {
    if report.deleted != report.unlinked as u64 {
        return Err(CliError::SoakFailed(format!(
            "{} inodes unlinked but {} deleted",
            report.unlinked, report.deleted
        )));
    }
    if report.leaked > 0 {
        return Err(CliError::SoakFailed(format!(
            "{} cache entries leaked",
            report.leaked
        )));
    }
    if report.stats.outstanding_refs() > 0 {
        return Err(CliError::SoakFailed(format!(
            "{} references never released",
            report.stats.outstanding_refs()
        )));
    }
    Ok(())
}
