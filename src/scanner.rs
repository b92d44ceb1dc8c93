//! Discovery of uncached model files
//!
//! [`DirectoryScanner`] walks the models root and hands every recognized file
//! that the cache does not already account for to a caller-supplied sink.
//! Walk errors on individual entries are logged and skipped; a scan never
//! aborts part way because one directory could not be read.

use crate::config::{Config, DEFAULT_EXTENSIONS};
use crate::types::Task;
use crate::utils;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};
use walkdir::WalkDir;

/// Recursive scanner for model files under a root directory
///
/// # Example
///
/// ```rust,no_run
/// use model_hash_cache::scanner::DirectoryScanner;
/// use std::collections::HashSet;
///
/// let scanner = DirectoryScanner::new("/models").with_extensions(["safetensors"]);
/// let mut found = Vec::new();
/// scanner.scan(&HashSet::new(), |task| {
///     found.push(task.path);
///     true
/// });
/// ```
#[derive(Debug, Clone)]
pub struct DirectoryScanner {
    /// Root directory to walk
    root: PathBuf,
    /// Allowed extensions, lowercase, no leading dot
    extensions: Vec<String>,
    /// Whether to descend through symbolic links to directories
    follow_symlinks: bool,
}

impl DirectoryScanner {
    /// Create a scanner with the default extension allow-list
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            follow_symlinks: false,
        }
    }

    /// Create a scanner for the root and allow-list of a run
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.root.clone()).with_extensions(&config.extensions)
    }

    /// Replace the extension allow-list
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

    /// Set symbolic link following behavior
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Walk the root and emit a task for every unknown recognized file
    ///
    /// `emit` returns `false` once the consumer stops accepting work, which
    /// ends the walk early. Returns the number of tasks emitted.
    pub fn scan<F>(&self, known: &HashSet<PathBuf>, mut emit: F) -> usize
    where
        F: FnMut(Task) -> bool,
    {
        let mut emitted = 0;

        for entry in WalkDir::new(&self.root).follow_links(self.follow_symlinks) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| self.root.clone());
                    warn!("Error visiting {:?}: {}", path, e);
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                continue;
            }

            let path = entry.path();
            if !utils::has_extension(path, &self.extensions) {
                trace!("Skipping unrecognized file {:?}", path);
                continue;
            }
            if known.contains(path) {
                continue;
            }

            emitted += 1;
            if !emit(Task::new(entry.into_path())) {
                warn!("Task queue closed, stopping directory scan");
                break;
            }
        }

        debug!("Directory scan of {:?} queued {} new files", self.root, emitted);
        emitted
    }
}
