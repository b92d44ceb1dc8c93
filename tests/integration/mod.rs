//! Multi-run integration tests
//!
//! Each test drives several runs over the same models directory, feeding each
//! run's output into the next the way a long-lived installation would.

use ::model_hash_cache::*;
use filetime::FileTime;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Test harness holding a models tree and a directory for cache files
pub struct CacheTestHarness {
    pub models: TempDir,
    pub state: TempDir,
    pub generator: ModelGenerator,
    runs: usize,
    last_output: Option<PathBuf>,
}

impl CacheTestHarness {
    /// Create an empty harness
    pub fn new() -> Self {
        Self {
            models: TempDir::new().unwrap(),
            state: TempDir::new().unwrap(),
            generator: ModelGenerator::new(42),
            runs: 0,
            last_output: None,
        }
    }

    pub fn root(&self) -> &Path {
        self.models.path()
    }

    /// Write a model file with generated content, returning the content
    pub fn add_model(&mut self, relative: &str, size: usize) -> Vec<u8> {
        let path = self.models.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let content = self.generator.content(size);
        fs::write(&path, &content).unwrap();
        content
    }

    /// Shift a file's modification time by `delta` seconds
    pub fn shift_mtime(&self, relative: &str, delta: i64) {
        let path = self.models.path().join(relative);
        let current = FileTime::from_last_modification_time(&fs::metadata(&path).unwrap());
        let shifted = FileTime::from_unix_time(current.unix_seconds() + delta, current.nanoseconds());
        filetime::set_file_mtime(&path, shifted).unwrap();
    }

    /// Run once, chaining from the previous run's output
    pub fn run_with(&mut self, configure: impl FnOnce(Config) -> Config) -> (RunReport, PathBuf) {
        self.runs += 1;
        let output = self.state.path().join(format!("cache-{}.json", self.runs));
        let mut config = Config::new(self.models.path(), &output);
        if let Some(previous) = &self.last_output {
            config = config.with_input(previous);
        }
        let report = run(&configure(config)).unwrap();
        self.last_output = Some(output.clone());
        (report, output)
    }

    pub fn run(&mut self) -> (RunReport, PathBuf) {
        self.run_with(|config| config)
    }
}

/// Deterministic pseudo-random model content
pub struct ModelGenerator {
    rng: StdRng,
}

impl ModelGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn content(&mut self, size: usize) -> Vec<u8> {
        let mut buf = vec![0u8; size];
        self.rng.fill(&mut buf[..]);
        buf
    }
}

fn sha(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

#[test]
fn test_idempotent_second_run() {
    let mut harness = CacheTestHarness::new();
    harness.add_model("sd/v1-5.safetensors", 64 * 1024);
    harness.add_model("sd/xl/base.safetensors", 100_000);
    harness.add_model("old.ckpt", 3);

    let (first_report, first) = harness.run();
    assert_eq!(first_report.hashed, 3);

    let (second_report, second) = harness.run();
    assert_eq!(second_report.hashed, 0);
    assert_eq!(second_report.stale, 0);
    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());

    let (_, third) = harness.run();
    assert_eq!(fs::read(&second).unwrap(), fs::read(&third).unwrap());
}

#[test]
fn test_large_drift_forces_rehash_of_same_bytes() {
    let mut harness = CacheTestHarness::new();
    let content = harness.add_model("model.safetensors", 4096);
    let (_, first) = harness.run();

    // Corrupt the cached digest so a rehash is observable
    let mut cache = Cache::load(&first).unwrap();
    cache
        .hashes
        .get_mut("checkpoint/model.safetensors")
        .unwrap()
        .sha256 = "stale-digest".to_string();
    cache.save(&first).unwrap();

    harness.shift_mtime("model.safetensors", 10);
    let (report, output) = harness.run();

    assert_eq!(report.stale, 1);
    assert_eq!(report.hashed, 1);
    let cache = Cache::load(&output).unwrap();
    assert_eq!(cache.hashes["checkpoint/model.safetensors"].sha256, sha(&content));
}

#[test]
fn test_small_drift_keeps_cached_digest() {
    let mut harness = CacheTestHarness::new();
    harness.add_model("model.ckpt", 1024);
    let (_, first) = harness.run();

    let mut cache = Cache::load(&first).unwrap();
    cache.hashes.get_mut("checkpoint/model.ckpt").unwrap().sha256 = "kept".to_string();
    cache.save(&first).unwrap();

    harness.shift_mtime("model.ckpt", 1);
    let (report, output) = harness.run();
    assert_eq!(report.hashed, 0);
    assert_eq!(Cache::load(&output).unwrap().hashes["checkpoint/model.ckpt"].sha256, "kept");

    harness.shift_mtime("model.ckpt", -2);
    let (report, _) = harness.run();
    assert_eq!(report.hashed, 0);
}

#[test]
fn test_backpressure_with_tiny_queues() {
    let mut harness = CacheTestHarness::new();
    let mut expected = Vec::new();
    for i in 0..60 {
        let name = format!("batch{}/model{:02}.safetensors", i % 4, i);
        let content = harness.add_model(&name, 512 + i * 37);
        expected.push((format!("checkpoint/{}", name), sha(&content)));
    }

    let (report, output) = harness.run_with(|config| config.with_workers(3).with_queue_capacity(1).with_chunk_size(64));
    assert_eq!(report.discovered, 60);
    assert_eq!(report.merged, 60);

    let cache = Cache::load(&output).unwrap();
    assert_eq!(cache.len(), 60);
    for (key, digest) in expected {
        assert_eq!(cache.hashes[&key].sha256, digest, "digest mismatch for {}", key);
    }
}

#[test]
fn test_rehash_and_discovery_in_one_run() {
    let mut harness = CacheTestHarness::new();
    harness.add_model("a.ckpt", 100);
    harness.add_model("b.ckpt", 100);
    harness.run();

    fs::remove_file(harness.root().join("a.ckpt")).unwrap();
    let changed = harness.add_model("b.ckpt", 200);
    harness.shift_mtime("b.ckpt", 60);
    let added = harness.add_model("nested/c.safetensors", 50);

    let (report, output) = harness.run();
    assert_eq!(report.removed, 1);
    assert_eq!(report.stale, 1);
    assert_eq!(report.discovered, 1);
    assert_eq!(report.entries, 2);

    let cache = Cache::load(&output).unwrap();
    assert_eq!(cache.hashes["checkpoint/b.ckpt"].sha256, sha(&changed));
    assert_eq!(cache.hashes["checkpoint/nested/c.safetensors"].sha256, sha(&added));
    assert!(!cache.hashes.contains_key("checkpoint/a.ckpt"));
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_is_skipped_not_fatal() {
    use std::os::unix::fs::PermissionsExt;

    let mut harness = CacheTestHarness::new();
    harness.add_model("ok.ckpt", 10);
    harness.add_model("locked.ckpt", 10);
    let locked = harness.root().join("locked.ckpt");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Root can read anything; only check when the lock actually bites
    let lock_effective = fs::File::open(&locked).is_err();
    let (report, output) = harness.run();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

    let cache = Cache::load(&output).unwrap();
    assert!(cache.hashes.contains_key("checkpoint/ok.ckpt"));
    if lock_effective {
        assert_eq!(report.failed, 1);
        assert!(!cache.hashes.contains_key("checkpoint/locked.ckpt"));
    }
}
