//! # model-hash-cache CLI
//!
//! Refreshes the SHA-256 cache for a directory of model checkpoints.
//!
//! ## Usage
//! ```bash
//! # Build a cache from scratch
//! model-hash-cache -p models/Stable-diffusion -o cache.json
//!
//! # Refresh an existing cache in place with 4 hashing threads
//! model-hash-cache -p models/Stable-diffusion -i cache.json -o cache.json -m 4
//! ```

use clap::Parser;
use colored::*;
use model_hash_cache::{Config, Result};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Populate and maintain a content-hash cache for model files
#[derive(Parser)]
#[command(name = "model-hash-cache")]
#[command(version)]
#[command(about = "Hash new and changed model files into a cache.json")]
#[command(long_about = None)]
struct Cli {
    /// Path to the models directory
    #[arg(short, long)]
    path: PathBuf,

    /// Path to source cache.json file
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Path to resulting cache.json file
    #[arg(short, long)]
    output: PathBuf,

    /// Max number of hashing tasks (0 = number of CPUs)
    #[arg(short, long, default_value_t = 0)]
    max_hashers: usize,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    // Set up logging; RUST_LOG overrides the default level
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Disable colors if needed
    if std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    }

    if let Err(e) = run(cli) {
        tracing::error!("{}", e);
        eprintln!("{}: {}", "Error".red().bold(), e.user_message());
        std::process::exit(1);
    }
}

/// Build the run configuration from flags and execute it
fn run(cli: Cli) -> Result<()> {
    let mut config = Config::new(cli.path, cli.output).with_workers(cli.max_hashers);
    if let Some(input) = cli.input {
        config = config.with_input(input);
    }

    model_hash_cache::run(&config)?;
    Ok(())
}
