//! Reconciling a loaded cache with the filesystem
//!
//! Every cached key is resolved back to a path and `stat`-ed:
//!
//! - the file is gone or inaccessible: the entry is dropped
//! - its modification time drifted past the tolerance: a [`Task`] is emitted
//! - otherwise the entry is kept as is
//!
//! Every resolved path lands in the known set, which the directory scanner
//! consults so nothing is hashed twice. Reconciliation finishes before any
//! worker starts, so the deletions here never race the result collector.

use crate::config::Config;
use crate::types::{Cache, CacheEntry, Task};
use crate::utils;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Outcome of reconciling the cache against the filesystem
#[derive(Debug, Default)]
pub struct Reconciliation {
    /// Cached files whose modification time drifted, to be rehashed
    pub stale: Vec<Task>,
    /// Every path the cache accounted for, kept or removed
    pub known: HashSet<PathBuf>,
    /// Number of entries dropped because their file vanished
    pub removed: usize,
}

/// Whether an entry's stored time disagrees with the file's actual time
///
/// The margin is taken back out of the stored time before comparing, and a
/// drift equal to the tolerance still counts as fresh.
pub fn is_stale(entry: &CacheEntry, actual_mtime: f64, config: &Config) -> bool {
    (actual_mtime - entry.raw_mtime(config.mtime_margin)).abs() > config.staleness_tolerance
}

/// Drop vanished entries from `cache` and collect stale files
pub fn reconcile(cache: &mut Cache, config: &Config) -> Reconciliation {
    let mut result = Reconciliation::default();

    cache.hashes.retain(|key, entry| {
        let path = utils::key_to_path(key, &config.root, &config.key_prefix);

        let keep = match fs::metadata(&path) {
            Err(e) => {
                warn!("Error accessing file {:?}: {}, removing cache entry", path, e);
                result.removed += 1;
                false
            }
            Ok(metadata) => {
                match utils::mtime_secs(&metadata) {
                    Ok(actual) if !is_stale(entry, actual, config) => {}
                    Ok(_) => {
                        info!("File {:?} changed, rehashing...", path);
                        result.stale.push(Task::with_metadata(path.clone(), metadata));
                    }
                    Err(e) => {
                        // No usable timestamp: let the worker retry the stat
                        warn!("Error reading modification time of {:?}: {}, rehashing", path, e);
                        result.stale.push(Task::new(path.clone()));
                    }
                }
                true
            }
        };

        result.known.insert(path);
        keep
    });

    debug!(
        "Reconciled cache: {} kept, {} stale, {} removed",
        cache.hashes.len(),
        result.stale.len(),
        result.removed
    );

    result
}
