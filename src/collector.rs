//! Single-writer merge of hashing results into the cache map
//!
//! The collector is the only code that writes the primary mapping while the
//! pipeline runs. It holds the map's unique `&mut` borrow on its own thread
//! and receives every result by message, so no lock guards the map.

use crate::config::Config;
use crate::error::Result;
use crate::types::{HashMapping, HashedFile};
use crate::utils;
use crossbeam_channel::Receiver;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Drains completed hashes into the cache map
#[derive(Debug, Clone)]
pub struct ResultCollector {
    /// Root the logical keys are relative to
    root: PathBuf,
    /// Namespace prefix of every key
    key_prefix: String,
}

impl ResultCollector {
    /// Create a collector for files under `root`
    pub fn new(root: impl Into<PathBuf>, key_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            key_prefix: key_prefix.into(),
        }
    }

    /// Create a collector using the root and key prefix of a run
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.root.clone(), config.key_prefix.clone())
    }

    /// Store one result under its logical key, replacing any previous entry
    ///
    /// Returns the key that was written.
    ///
    /// # Errors
    ///
    /// Fails if the result's path cannot be expressed relative to the root.
    pub fn merge(&self, hashes: &mut HashMapping, result: HashedFile) -> Result<String> {
        let key = utils::cache_key(&result.path, &self.root, &self.key_prefix)?;
        info!("{:?} | {}", result.path, result.entry.sha256);
        hashes.insert(key.clone(), result.entry);
        Ok(key)
    }

    /// Merge results until every sender is gone
    ///
    /// Returns the number of results written into `hashes`.
    pub fn run(&self, results: Receiver<HashedFile>, hashes: &mut HashMapping) -> usize {
        let mut merged = 0;

        for result in results.iter() {
            let path = result.path.clone();
            match self.merge(hashes, result) {
                Ok(_) => merged += 1,
                Err(e) => warn!("Error getting relative path for {:?}: {}", path, e),
            }
        }

        debug!("Result collector merged {} entries", merged);
        merged
    }
}
