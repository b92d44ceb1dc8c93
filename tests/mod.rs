//! Main test module for model-hash-cache
//!
//! This module includes all test suites:
//! - Integration tests for multi-run scenarios
//! - Property-based tests for invariants
//! - Edge cases for the cache format and the scanner

pub mod integration;

#[cfg(test)]
mod edge_cases {
    use ::model_hash_cache::*;
    use sha2::{Digest, Sha256};
    use std::fs;
    use tempfile::TempDir;

    fn sha(data: &[u8]) -> String {
        hex::encode(Sha256::digest(data))
    }

    #[test]
    fn test_empty_directory_no_input() {
        let models = TempDir::new().unwrap();
        let output = models.path().join("cache.json");

        let report = run(&Config::new(models.path(), &output)).unwrap();
        assert_eq!(report, RunReport::default());
        assert_eq!(fs::read_to_string(&output).unwrap(), "{\n    \"hashes\": {}\n}\n");
    }

    #[test]
    fn test_two_models_no_input() {
        let models = TempDir::new().unwrap();
        let state = TempDir::new().unwrap();
        let output = state.path().join("cache.json");
        fs::write(models.path().join("one.safetensors"), b"first model").unwrap();
        fs::write(models.path().join("two.ckpt"), b"second model").unwrap();

        run(&Config::new(models.path(), &output)).unwrap();

        let cache = Cache::load(&output).unwrap();
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.hashes["checkpoint/one.safetensors"].sha256, sha(b"first model"));
        assert_eq!(cache.hashes["checkpoint/two.ckpt"].sha256, sha(b"second model"));
    }

    #[test]
    fn test_deleted_file_drops_entry() {
        let models = TempDir::new().unwrap();
        let state = TempDir::new().unwrap();
        let input = state.path().join("in.json");
        let output = state.path().join("out.json");
        fs::write(
            &input,
            r#"{"hashes": {"checkpoint/gone.ckpt": {"mtime": 1700000001.0, "sha256": "aa"}}}"#,
        )
        .unwrap();

        let report = run(&Config::new(models.path(), &output).with_input(&input)).unwrap();
        assert_eq!(report.removed, 1);
        assert!(Cache::load(&output).unwrap().is_empty());
    }

    #[test]
    fn test_unrecognized_extensions_never_cached() {
        let models = TempDir::new().unwrap();
        let state = TempDir::new().unwrap();
        let output = state.path().join("out.json");

        for name in ["model.pt", "model.bin", "model.safetensors.tmp", "README", "config.yaml"] {
            fs::write(models.path().join(name), name).unwrap();
        }
        fs::write(models.path().join("UPPER.SAFETENSORS"), b"upper").unwrap();

        run(&Config::new(models.path(), &output)).unwrap();

        let cache = Cache::load(&output).unwrap();
        let keys: Vec<_> = cache.hashes.keys().cloned().collect();
        assert_eq!(keys, vec!["checkpoint/UPPER.SAFETENSORS"]);
    }

    #[test]
    fn test_addnet_mapping_passes_through() {
        let models = TempDir::new().unwrap();
        let state = TempDir::new().unwrap();
        let input = state.path().join("in.json");
        let output = state.path().join("out.json");
        fs::write(models.path().join("m.ckpt"), b"m").unwrap();
        fs::write(
            &input,
            r#"{
                "hashes": {},
                "hashes-addnet": {
                    "lora/style.safetensors": {"mtime": 1690000000.5, "sha256": "0123abcd"},
                    "lora/missing-on-disk.pt": {"mtime": 1, "sha256": "ffff"}
                }
            }"#,
        )
        .unwrap();

        run(&Config::new(models.path(), &output).with_input(&input)).unwrap();

        let before = Cache::load(&input).unwrap();
        let after = Cache::load(&output).unwrap();
        assert_eq!(after.extra_hashes, before.extra_hashes);
        assert_eq!(after.len(), 1);

        let text = fs::read_to_string(&output).unwrap();
        assert!(text.contains("\"mtime\": 1690000000.5000000"));
        assert!(text.contains("\"mtime\": 1.0000000"));
    }

    #[test]
    fn test_unprefixed_key_still_reconciled() {
        let models = TempDir::new().unwrap();
        let state = TempDir::new().unwrap();
        let input = state.path().join("in.json");
        let output = state.path().join("out.json");
        fs::write(
            &input,
            r#"{"hashes": {"legacy.ckpt": {"mtime": 1700000001.0, "sha256": "aa"}}}"#,
        )
        .unwrap();

        let report = run(&Config::new(models.path(), &output).with_input(&input)).unwrap();
        assert_eq!(report.removed, 1);
    }

    #[test]
    fn test_unwritable_output_is_fatal() {
        let models = TempDir::new().unwrap();
        let output = models.path().join("missing-dir").join("cache.json");

        let err = run(&Config::new(models.path(), &output)).unwrap_err();
        assert!(matches!(err, HashCacheError::CacheSave { .. }));
        assert!(err.is_fatal());
    }
}
