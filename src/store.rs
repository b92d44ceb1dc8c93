//! Loading and saving the cache document
//!
//! The on-disk format is a JSON object indented with four spaces. Modification
//! times are written by [`format_mtime`] as fixed-point decimals with seven
//! fractional digits rather than through serde_json's shortest-float
//! formatting, so a cache read and written back without changes is
//! byte-for-byte identical.

use crate::error::{HashCacheError, Result};
use crate::types::Cache;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::value::RawValue;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Fractional digits written for every modification time
pub const MTIME_PRECISION: usize = 7;

const INDENT: &[u8] = b"    ";

/// Render a modification time as fixed-point decimal text
///
/// ```rust
/// use model_hash_cache::store::format_mtime;
///
/// assert_eq!(format_mtime(1.5), "1.5000000");
/// assert_eq!(format_mtime(1_700_000_000.0), "1700000000.0000000");
/// ```
pub fn format_mtime(mtime: f64) -> String {
    format!("{:.*}", MTIME_PRECISION, mtime)
}

/// Serde hook for `CacheEntry::mtime`
pub(crate) fn serialize_mtime<S>(mtime: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let raw = RawValue::from_string(format_mtime(*mtime)).map_err(serde::ser::Error::custom)?;
    raw.serialize(serializer)
}

impl Cache {
    /// Read a cache document from disk
    ///
    /// A missing `hashes` member decodes as an empty mapping.
    ///
    /// # Errors
    ///
    /// - [`HashCacheError::CacheLoad`] if the file cannot be opened or decoded
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| HashCacheError::cache_load(path, e))?;
        let cache: Cache = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| HashCacheError::cache_load(path, e))?;
        debug!("Loaded {} cache entries from {:?}", cache.hashes.len(), path);
        Ok(cache)
    }

    /// Read the cache at `path`, or start empty when there is none
    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::new()),
        }
    }

    /// Encode the cache in its on-disk form, trailing newline included
    pub fn to_json(&self) -> Result<String> {
        let mut buf = Vec::new();
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(INDENT));
        self.serialize(&mut ser)?;
        buf.push(b'\n');
        String::from_utf8(buf).map_err(|e| HashCacheError::internal(format!("cache encoded as invalid UTF-8: {}", e)))
    }

    /// Write the cache to `path`, replacing any existing file
    ///
    /// # Errors
    ///
    /// - [`HashCacheError::CacheSave`] if encoding, creating or writing fails
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = self.to_json().map_err(|e| HashCacheError::cache_save(path, e))?;
        let file = File::create(path).map_err(|e| HashCacheError::cache_save(path, e))?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(json.as_bytes())
            .and_then(|_| writer.flush())
            .map_err(|e| HashCacheError::cache_save(path, e))?;
        debug!("Wrote {} cache entries to {:?}", self.hashes.len(), path);
        Ok(())
    }
}
