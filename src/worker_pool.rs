//! Fixed-size pool of hashing threads
//!
//! Tasks travel to the workers over a bounded channel and results leave over
//! another bounded channel. A producer that outruns the workers blocks in
//! [`WorkerPool::submit`] until a slot frees up, which keeps memory flat no
//! matter how fast the directory walk is.
//!
//! Workers never touch the cache map. A per-file failure is logged and the
//! task is dropped; the file keeps whatever cache state it had.
//!
//! ## Shutdown
//!
//! [`WorkerPool::finish`] closes the task queue and joins every worker. Each
//! worker owns a clone of the result sender, so once `finish` returns the
//! result queue closes as soon as the caller drops its own sender (if any).

use crate::config::Config;
use crate::error::{HashCacheError, Result};
use crate::hasher;
use crate::types::{CacheEntry, HashedFile, Task};
use crate::utils;
use crossbeam_channel::{Receiver, Sender};
use std::thread::{self, Scope, ScopedJoinHandle};
use tracing::{debug, info, warn};

/// Per-worker tallies, summed by [`WorkerPool::finish`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Tasks that produced a result
    pub hashed: usize,
    /// Tasks dropped after an error
    pub failed: usize,
}

impl std::ops::AddAssign for PoolStats {
    fn add_assign(&mut self, other: Self) {
        self.hashed += other.hashed;
        self.failed += other.failed;
    }
}

/// Hash one task into a cache entry
///
/// The modification time comes from the task's cached metadata when present,
/// otherwise from a fresh `stat`, and has the configured margin added.
///
/// # Errors
///
/// - [`HashCacheError::Io`](crate::HashCacheError::Io) if the file cannot be stat-ed, opened or read
pub fn hash_task(task: &Task, config: &Config) -> Result<HashedFile> {
    let mtime = utils::resolve_mtime(&task.path, task.metadata.as_ref())? + config.mtime_margin;
    info!("Hashing {:?}", task.path);
    let sha256 = hasher::hash_file(&task.path, config.chunk_size)?;

    Ok(HashedFile {
        path: task.path.clone(),
        entry: CacheEntry { mtime, sha256 },
    })
}

/// Bounded pool of hashing threads living inside a [`std::thread::scope`]
pub struct WorkerPool<'scope> {
    tasks: Sender<Task>,
    workers: Vec<ScopedJoinHandle<'scope, PoolStats>>,
}

impl<'scope> WorkerPool<'scope> {
    /// Start `config.workers` threads sending results to `results`
    ///
    /// The task queue holds at most `config.queue_capacity` pending tasks.
    ///
    /// # Errors
    ///
    /// - [`HashCacheError::WorkerSpawn`] if the OS refuses a thread. Workers
    ///   already started see the queue close and exit.
    pub fn spawn<'env>(
        scope: &'scope Scope<'scope, 'env>,
        config: &'env Config,
        results: Sender<HashedFile>,
    ) -> Result<Self> {
        Self::spawn_with(scope, config, results, |id| {
            thread::Builder::new().name(format!("hasher-{}", id))
        })
    }

    fn spawn_with<'env, B>(
        scope: &'scope Scope<'scope, 'env>,
        config: &'env Config,
        results: Sender<HashedFile>,
        builder: B,
    ) -> Result<Self>
    where
        B: Fn(usize) -> thread::Builder,
    {
        let (tasks, queue) = crossbeam_channel::bounded::<Task>(config.queue_capacity);
        let count = config.workers.max(1);
        let mut workers = Vec::with_capacity(count);

        for id in 0..count {
            let queue = queue.clone();
            let results = results.clone();
            let handle = builder(id)
                .spawn_scoped(scope, move || worker_loop(id, queue, results, config))
                .map_err(|source| HashCacheError::WorkerSpawn { worker: id, source })?;
            workers.push(handle);
        }

        debug!("Started {} hashing workers", count);
        Ok(Self { tasks, workers })
    }

    /// Queue a task, blocking while the queue is full
    ///
    /// Returns `false` if no worker is left to receive it.
    pub fn submit(&self, task: Task) -> bool {
        self.tasks.send(task).is_ok()
    }

    /// Close the queue, wait for every worker and sum their tallies
    pub fn finish(self) -> PoolStats {
        drop(self.tasks);

        let mut total = PoolStats::default();
        for handle in self.workers {
            match handle.join() {
                Ok(stats) => total += stats,
                Err(_) => warn!("Hashing worker panicked"),
            }
        }
        total
    }
}

fn worker_loop(id: usize, queue: Receiver<Task>, results: Sender<HashedFile>, config: &Config) -> PoolStats {
    let mut stats = PoolStats::default();

    for task in queue.iter() {
        match hash_task(&task, config) {
            Ok(hashed) => {
                stats.hashed += 1;
                if results.send(hashed).is_err() {
                    warn!("Result queue closed, worker {} stopping", id);
                    break;
                }
            }
            Err(e) => {
                warn!("Error hashing {:?}: {}", task.path, e);
                stats.failed += 1;
            }
        }
    }

    debug!("Worker {} done: {} hashed, {} failed", id, stats.hashed, stats.failed);
    stats
}
