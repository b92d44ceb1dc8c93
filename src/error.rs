//! Error types for model-hash-cache
//!
//! Two classes of failure exist. Per-file failures (a file that cannot be
//! stat-ed, opened or read, a walk entry that cannot be visited) are logged
//! where they happen and never leave the component that hit them. Fatal
//! failures (an unreadable input cache, an invalid root, an unwritable output)
//! are returned as [`HashCacheError`] and end the run.

use std::path::PathBuf;
use thiserror::Error;

/// Type alias for Results in this crate
pub type Result<T> = std::result::Result<T, HashCacheError>;

/// Main error type for all cache operations
#[derive(Debug, Error)]
pub enum HashCacheError {
    /// I/O errors during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors during JSON serialization/deserialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The input cache could not be opened or decoded
    #[error("Error reading cache {path:?}: {source}")]
    CacheLoad {
        /// Path of the input cache file
        path: PathBuf,
        /// Underlying cause
        #[source]
        source: Box<HashCacheError>,
    },

    /// The output cache could not be created or written
    #[error("Error writing cache {path:?}: {source}")]
    CacheSave {
        /// Path of the output cache file
        path: PathBuf,
        /// Underlying cause
        #[source]
        source: Box<HashCacheError>,
    },

    /// The models root is missing or not a directory
    #[error("Models root is not a directory: {0:?}")]
    InvalidRoot(PathBuf),

    /// The models root exists but cannot be listed or traversed
    #[error("Models root {path:?} is not readable: {source}")]
    UnreadableRoot {
        /// Models root
        path: PathBuf,
        /// Underlying cause
        #[source]
        source: std::io::Error,
    },

    /// The OS refused to start a hashing thread
    #[error("Failed to start hashing worker {worker}: {source}")]
    WorkerSpawn {
        /// Index of the worker that could not start
        worker: usize,
        /// Underlying cause
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A hashed file does not live under the models root
    #[error("Path {path:?} is not relative to {base:?}")]
    PathNotRelative {
        /// Offending path
        path: PathBuf,
        /// Root it was expected under
        base: PathBuf,
    },

    /// Generic error for unexpected conditions
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HashCacheError {
    /// Create an internal error with a custom message
    pub fn internal(msg: impl Into<String>) -> Self {
        HashCacheError::Internal(msg.into())
    }

    /// Create a configuration error with a custom message
    pub fn config(msg: impl Into<String>) -> Self {
        HashCacheError::InvalidConfiguration(msg.into())
    }

    /// Wrap an error raised while loading the input cache
    pub fn cache_load(path: impl Into<PathBuf>, source: impl Into<HashCacheError>) -> Self {
        HashCacheError::CacheLoad {
            path: path.into(),
            source: Box::new(source.into()),
        }
    }

    /// Wrap an error raised while writing the output cache
    pub fn cache_save(path: impl Into<PathBuf>, source: impl Into<HashCacheError>) -> Self {
        HashCacheError::CacheSave {
            path: path.into(),
            source: Box::new(source.into()),
        }
    }

    /// Check if this error must end the run
    ///
    /// Everything that reaches the top of a run is fatal except the per-file
    /// classes, which components log and swallow themselves.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            HashCacheError::Io(_) | HashCacheError::PathNotRelative { .. }
        )
    }

    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            HashCacheError::CacheLoad { path, source } => {
                format!(
                    "Could not read cache {:?} ({}). Fix or remove the file, or run without --input.",
                    path, source
                )
            }
            HashCacheError::CacheSave { path, source } => {
                format!(
                    "Could not write cache {:?} ({}). Check that the directory exists and is writable.",
                    path, source
                )
            }
            HashCacheError::InvalidRoot(path) => {
                format!("{:?} is not a directory. Pass the models directory with --path.", path)
            }
            HashCacheError::UnreadableRoot { path, source } => {
                format!("Cannot read {:?} ({}). Check its permissions.", path, source)
            }
            HashCacheError::WorkerSpawn { source, .. } => {
                format!("Could not start hashing threads ({}). Try a smaller --max-hashers.", source)
            }
            _ => self.to_string(),
        }
    }
}
