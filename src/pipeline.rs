//! One cache refresh run, end to end
//!
//! ```text
//! load ─► reconcile ─► ┌ stale tasks ─┐                 ┌──────────┐
//!                      │              ├─► task queue ─► │ workers  │─► result queue ─► collector ─► save
//!                      └ dir scan ────┘   (bounded)     └──────────┘     (bounded)
//! ```
//!
//! Reconciliation runs to completion before any thread starts, so its
//! deletions and the known-path set are settled before the scan compares
//! against them and before the collector writes anything. Every result is
//! merged before the cache is saved: the task queue closes, the workers are
//! joined (dropping the last result senders), then the collector is joined.

use crate::collector::ResultCollector;
use crate::config::Config;
use crate::error::{HashCacheError, Result};
use crate::scanner::DirectoryScanner;
use crate::staleness::{self, Reconciliation};
use crate::types::{Cache, RunReport};
use crate::worker_pool::WorkerPool;
use std::thread;
use tracing::{debug, info, instrument};

/// Load, refresh and save the cache described by `config`
///
/// # Errors
///
/// Only fatal conditions are returned: an invalid configuration or root, an
/// unreadable input cache, or an unwritable output. Per-file problems are
/// logged and skipped.
///
/// # Example
///
/// ```rust,no_run
/// use model_hash_cache::{run, Config};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::new("/models/Stable-diffusion", "cache.json").with_input("cache.json");
/// let report = run(&config)?;
/// println!("{} entries", report.entries);
/// # Ok(())
/// # }
/// ```
#[instrument(skip(config), fields(root = ?config.root))]
pub fn run(config: &Config) -> Result<RunReport> {
    config.validate()?;

    let mut cache = Cache::load_optional(config.input.as_deref())?;
    info!("Processing {:?}", config.root);

    let report = refresh(&mut cache, config)?;
    cache.save(&config.output)?;

    Ok(report)
}

/// Bring an in-memory cache up to date with the filesystem
///
/// Drops entries whose file vanished, rehashes drifted and newly found files,
/// and leaves everything else (including `extra_hashes`) untouched.
pub fn refresh(cache: &mut Cache, config: &Config) -> Result<RunReport> {
    let Reconciliation { stale, known, removed } = staleness::reconcile(cache, config);
    let stale_count = stale.len();

    let scanner = DirectoryScanner::from_config(config);
    let collector = ResultCollector::from_config(config);
    let (results_tx, results_rx) = crossbeam_channel::bounded(config.queue_capacity);
    let hashes = &mut cache.hashes;

    let (discovered, stats, merged) = thread::scope(|scope| {
        let collecting = scope.spawn(move || collector.run(results_rx, hashes));
        let pool = WorkerPool::spawn(scope, config, results_tx)?;

        let mut open = true;
        for task in stale {
            if !pool.submit(task) {
                open = false;
                break;
            }
        }
        let discovered = if open {
            scanner.scan(&known, |task| pool.submit(task))
        } else {
            0
        };

        let stats = pool.finish();
        let merged = collecting
            .join()
            .map_err(|_| HashCacheError::internal("result collector panicked"))?;

        Ok::<_, HashCacheError>((discovered, stats, merged))
    })?;

    let report = RunReport {
        removed,
        stale: stale_count,
        discovered,
        hashed: stats.hashed,
        failed: stats.failed,
        merged,
        entries: cache.hashes.len(),
    };
    debug!("Refresh finished: {:?}", report);

    Ok(report)
}
