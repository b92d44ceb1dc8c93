//! Path and timestamp helpers
//!
//! Conversions between filesystem paths and cache keys, and between
//! `SystemTime` and the floating-point seconds stored in the cache.

use crate::error::{HashCacheError, Result};
use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Convert a timestamp to fractional seconds since the Unix epoch
///
/// Times before the epoch come out negative.
pub fn system_time_to_secs(time: SystemTime) -> f64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => after.as_secs_f64(),
        Err(before) => -before.duration().as_secs_f64(),
    }
}

/// Modification time of a file as fractional epoch seconds
pub fn mtime_secs(metadata: &Metadata) -> Result<f64> {
    Ok(system_time_to_secs(metadata.modified()?))
}

/// Modification time from cached metadata, falling back to a fresh `stat`
pub fn resolve_mtime(path: &Path, cached: Option<&Metadata>) -> Result<f64> {
    match cached {
        Some(metadata) => mtime_secs(metadata),
        None => mtime_secs(&fs::metadata(path)?),
    }
}

/// Make a path relative to a base path
///
/// Tries a lexical strip first so symbolic links keep their own name, and
/// only canonicalizes both sides when that fails.
///
/// # Errors
///
/// - [`HashCacheError::Io`] if canonicalization fails
/// - [`HashCacheError::PathNotRelative`] if `path` is not under `base`
pub fn make_relative(path: &Path, base: &Path) -> Result<PathBuf> {
    if let Ok(relative) = path.strip_prefix(base) {
        return Ok(relative.to_path_buf());
    }

    let path_canon = path.canonicalize()?;
    let base_canon = base.canonicalize()?;

    path_canon
        .strip_prefix(&base_canon)
        .map(|p| p.to_path_buf())
        .map_err(|_| HashCacheError::PathNotRelative {
            path: path_canon.clone(),
            base: base_canon.clone(),
        })
}

/// Build the logical cache key for a file under `root`
pub fn cache_key(path: &Path, root: &Path, prefix: &str) -> Result<String> {
    let relative = make_relative(path, root)?;
    Ok(format!("{}{}", prefix, relative.to_string_lossy()))
}

/// Resolve a logical cache key back to a path under `root`
///
/// Keys without the prefix are taken as already root-relative.
pub fn key_to_path(key: &str, root: &Path, prefix: &str) -> PathBuf {
    root.join(key.strip_prefix(prefix).unwrap_or(key))
}

/// Whether `path` ends in one of `extensions` (lowercase, no dot)
pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy();
            extensions.iter().any(|e| ext.eq_ignore_ascii_case(e))
        })
        .unwrap_or(false)
}
