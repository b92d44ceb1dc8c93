//! Streaming SHA-256 of file contents
//!
//! Model checkpoints routinely run to several gigabytes, so content is fed to
//! the digest through a fixed-size buffer and never loaded whole.

use crate::error::Result;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

/// Hash everything a reader yields, `chunk_size` bytes at a time
///
/// Returns the digest as a 64-character lowercase hex string. The result does
/// not depend on `chunk_size`.
///
/// # Errors
///
/// - [`HashCacheError::Io`](crate::HashCacheError::Io) if a read fails
///
/// # Example
///
/// ```rust
/// use model_hash_cache::hasher::hash_reader;
///
/// let digest = hash_reader(&b"abc"[..], 2).unwrap();
/// assert_eq!(
///     digest,
///     "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
/// );
/// ```
pub fn hash_reader<R: Read>(mut reader: R, chunk_size: usize) -> Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; chunk_size.max(1)];

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Hash a file's content using SHA-256
///
/// # Errors
///
/// - [`HashCacheError::Io`](crate::HashCacheError::Io) if the file cannot be opened or read
pub fn hash_file(path: &Path, chunk_size: usize) -> Result<String> {
    let file = File::open(path)?;
    hash_reader(file, chunk_size)
}
