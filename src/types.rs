//! Core data types shared by the pipeline components
//!
//! - **Persisted state**: [`Cache`], [`CacheEntry`]
//! - **In-flight work**: [`Task`], [`HashedFile`]
//! - **Outcome**: [`RunReport`]

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::Metadata;
use std::path::PathBuf;

/// Map from logical key (`"checkpoint/<relative path>"`) to entry.
///
/// Ordered so that the serialized cache is byte-for-byte reproducible.
pub type HashMapping = BTreeMap<String, CacheEntry>;

/// One hashed file as stored in the cache
///
/// # Examples
///
/// ```rust
/// # use model_hash_cache::CacheEntry;
/// let entry = CacheEntry {
///     mtime: 1_700_000_001.25,
///     sha256: "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855".to_string(),
/// };
/// assert_eq!(entry.raw_mtime(1.0), 1_700_000_000.25);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheEntry {
    /// Modification time in seconds since the Unix epoch, margin included
    #[serde(serialize_with = "crate::store::serialize_mtime")]
    pub mtime: f64,
    /// Lowercase hex SHA-256 of the whole file
    pub sha256: String,
}

impl CacheEntry {
    /// Stored modification time with the margin taken back out
    pub fn raw_mtime(&self, margin: f64) -> f64 {
        self.mtime - margin
    }
}

/// The persisted cache document
///
/// `extra_hashes` is read and written back untouched; nothing in the
/// pipeline modifies it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cache {
    /// Primary mapping maintained by the pipeline
    #[serde(default)]
    pub hashes: HashMapping,
    /// Secondary mapping carried through verbatim
    #[serde(
        rename = "hashes-addnet",
        default,
        skip_serializing_if = "is_absent_or_empty"
    )]
    pub extra_hashes: Option<HashMapping>,
}

fn is_absent_or_empty(mapping: &Option<HashMapping>) -> bool {
    mapping.as_ref().map_or(true, |m| m.is_empty())
}

impl Cache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries in the primary mapping
    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    /// Whether the primary mapping is empty
    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

/// A unit of hashing work
///
/// Carries the metadata the producer already had, if any, so the worker
/// does not stat the file a second time.
#[derive(Debug, Clone)]
pub struct Task {
    /// File to hash
    pub path: PathBuf,
    /// Metadata captured when the task was created
    pub metadata: Option<Metadata>,
}

impl Task {
    /// Task with no cached metadata
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            metadata: None,
        }
    }

    /// Task that reuses metadata the producer already read
    pub fn with_metadata(path: impl Into<PathBuf>, metadata: Metadata) -> Self {
        Self {
            path: path.into(),
            metadata: Some(metadata),
        }
    }
}

/// A completed task on its way to the result collector
#[derive(Debug, Clone, PartialEq)]
pub struct HashedFile {
    /// Where the file was read from
    pub path: PathBuf,
    /// Entry to store, margin already applied
    pub entry: CacheEntry,
}

/// Counts describing what one run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Cached entries dropped because their file vanished
    pub removed: usize,
    /// Cached files re-queued because their modification time drifted
    pub stale: usize,
    /// Uncached files found by the directory scan
    pub discovered: usize,
    /// Tasks that produced a digest
    pub hashed: usize,
    /// Tasks dropped after a per-file error
    pub failed: usize,
    /// Results written into the cache map
    pub merged: usize,
    /// Entries in the final cache
    pub entries: usize,
}
