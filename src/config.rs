//! Run configuration
//!
//! A [`Config`] is built once (usually by the CLI) and passed by reference to
//! every component of the pipeline. Nothing in the crate reads process-wide
//! state.

use crate::error::{HashCacheError, Result};
use std::fs;
use std::path::PathBuf;

/// Namespace tag prepended to every root-relative path to form a cache key
pub const DEFAULT_KEY_PREFIX: &str = "checkpoint/";

/// Seconds added to the raw modification time before it is stored.
///
/// The cache stores times as JSON floats with 7 fractional digits, which loses
/// precision on round trip.
pub const MTIME_MARGIN_SECS: f64 = 1.0;

/// Maximum drift between stored and actual modification time (after removing
/// the margin) before a cached file is considered changed.
pub const STALENESS_TOLERANCE_SECS: f64 = 2.0;

/// Capacity of the task queue and of the result queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Read buffer size used when streaming a file through the digest
pub const DEFAULT_CHUNK_SIZE: usize = 16 * 1024;

/// Model file extensions picked up by the directory scanner
pub const DEFAULT_EXTENSIONS: &[&str] = &["safetensors", "ckpt"];

/// Configuration for one cache refresh run
///
/// # Example
///
/// ```rust
/// use model_hash_cache::Config;
///
/// let config = Config::new("/models/Stable-diffusion", "cache.json")
///     .with_input("cache.json")
///     .with_workers(4);
/// assert_eq!(config.workers, 4);
/// assert_eq!(config.queue_capacity, 100);
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory tree to scan
    pub root: PathBuf,
    /// Prior cache to start from (empty cache when `None`)
    pub input: Option<PathBuf>,
    /// Where the merged cache is written
    pub output: PathBuf,
    /// Number of hashing threads
    pub workers: usize,
    /// Capacity of the bounded task and result queues
    pub queue_capacity: usize,
    /// Read buffer size for hashing
    pub chunk_size: usize,
    /// Recognized extensions, lowercase, without the leading dot
    pub extensions: Vec<String>,
    /// Prefix of every cache key
    pub key_prefix: String,
    /// Seconds added to modification times before storage
    pub mtime_margin: f64,
    /// Allowed drift in seconds before a cached file is rehashed
    pub staleness_tolerance: f64,
}

impl Config {
    /// Create a configuration with defaults for everything but the paths
    ///
    /// The worker count defaults to the number of logical CPUs.
    pub fn new(root: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            input: None,
            output: output.into(),
            workers: num_cpus::get(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            chunk_size: DEFAULT_CHUNK_SIZE,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            mtime_margin: MTIME_MARGIN_SECS,
            staleness_tolerance: STALENESS_TOLERANCE_SECS,
        }
    }

    /// Start from a previously written cache file
    pub fn with_input(mut self, input: impl Into<PathBuf>) -> Self {
        self.input = Some(input.into());
        self
    }

    /// Set number of hashing threads
    ///
    /// Zero means "use host parallelism", matching the CLI flag.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = if workers == 0 { num_cpus::get() } else { workers };
        self
    }

    /// Set capacity of the task and result queues
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Set the hashing read buffer size
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Replace the extension allow-list
    ///
    /// Leading dots are stripped and matching is case-insensitive.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .collect();
        self
    }

    /// Set the cache key namespace prefix
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Override the stored-time margin and staleness tolerance
    pub fn with_time_tolerance(mut self, margin: f64, tolerance: f64) -> Self {
        self.mtime_margin = margin;
        self.staleness_tolerance = tolerance;
        self
    }

    /// Check the configuration before a run
    ///
    /// # Errors
    ///
    /// - [`HashCacheError::InvalidRoot`] if the root is not an existing directory
    /// - [`HashCacheError::UnreadableRoot`] if the root cannot be listed or traversed
    /// - [`HashCacheError::InvalidConfiguration`] for out-of-range settings
    pub fn validate(&self) -> Result<()> {
        if !self.root.is_dir() {
            return Err(HashCacheError::InvalidRoot(self.root.clone()));
        }
        // Listing needs read permission, resolving paths below it needs search
        fs::read_dir(&self.root)
            .and_then(|_| fs::metadata(self.root.join(".")))
            .map_err(|source| HashCacheError::UnreadableRoot {
                path: self.root.clone(),
                source,
            })?;
        if self.workers == 0 {
            return Err(HashCacheError::config("worker count must be at least 1"));
        }
        if self.queue_capacity == 0 {
            return Err(HashCacheError::config("queue capacity must be at least 1"));
        }
        if self.chunk_size == 0 {
            return Err(HashCacheError::config("chunk size must be at least 1 byte"));
        }
        if self.extensions.is_empty() {
            return Err(HashCacheError::config("extension allow-list is empty"));
        }
        if !self.mtime_margin.is_finite() || self.mtime_margin < 0.0 {
            return Err(HashCacheError::config(format!(
                "mtime margin must be a non-negative number, got {}",
                self.mtime_margin
            )));
        }
        if !self.staleness_tolerance.is_finite() || self.staleness_tolerance < 0.0 {
            return Err(HashCacheError::config(format!(
                "staleness tolerance must be a non-negative number, got {}",
                self.staleness_tolerance
            )));
        }
        Ok(())
    }
}
