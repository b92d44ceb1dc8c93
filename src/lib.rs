//! # model-hash-cache - SHA-256 cache for model checkpoint directories
//!
//! Keeps a JSON cache of content hashes for a tree of large model files
//! (`.safetensors`, `.ckpt`) so consumers can identify a file by checksum
//! without rehashing gigabytes of unchanged weights on every start.
//!
//! ## Overview
//!
//! A run takes a prior cache (optional) and the current state of the models
//! directory and produces a new cache:
//! - Entries whose file disappeared are dropped
//! - Files whose modification time drifted are rehashed
//! - Recognized files the cache has never seen are hashed and added
//! - Everything else, including the `hashes-addnet` mapping, is carried over
//!
//! ## Architecture
//!
//! - **Staleness detection** ([`staleness`]): reconciles the loaded cache with
//!   the filesystem before any hashing starts
//! - **Directory scanning** ([`scanner`]): finds recognized files the cache
//!   does not know about
//! - **Worker pool** ([`worker_pool`]): a fixed number of threads draining a
//!   bounded task queue, streaming each file through SHA-256 ([`hasher`])
//! - **Result collection** ([`collector`]): the single writer of the cache map
//! - **Persistence** ([`store`]): stable, four-space-indented JSON with
//!   seven-digit modification times
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use model_hash_cache::{run, Config};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::new("./models/Stable-diffusion", "./cache.json")
//!     .with_input("./cache.json")
//!     .with_workers(8);
//!
//! let report = run(&config)?;
//! println!("cache now holds {} entries", report.entries);
//! # Ok(())
//! # }
//! ```
//!
//! ## Cache Format
//!
//! ```text
//! {
//!     "hashes": {
//!         "checkpoint/sd/v1-5-pruned.safetensors": {
//!             "mtime": 1699999999.1234567,
//!             "sha256": "6ce0161689b3853acaa03779ec93eafe75a02f4ced659bee03f50797806fa2fa"
//!         }
//!     }
//! }
//! ```
//!
//! `mtime` is the file's modification time plus a one second margin. A cached
//! file is rehashed when its actual modification time differs from the stored
//! one (margin removed) by more than two seconds.
//!
//! ## Error Handling
//!
//! Fatal problems (bad input cache, invalid root, unwritable output) come back
//! as [`HashCacheError`]. Per-file problems are logged through `tracing` and
//! the file is skipped for this run.
//!
//! ## Module Organization
//!
//! - [`config`]: run configuration and default constants
//! - [`types`]: cache document, tasks and results
//! - [`pipeline`]: the end-to-end run
//! - [`error`]: error types and handling

pub mod collector;
pub mod config;
pub mod error;
pub mod hasher;
pub mod pipeline;
pub mod scanner;
pub mod staleness;
pub mod store;
pub mod types;
pub mod worker_pool;

mod utils;

pub use config::Config;
pub use error::{HashCacheError, Result};
pub use pipeline::{refresh, run};
pub use types::*;
