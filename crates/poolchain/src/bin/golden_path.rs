//! # Golden Path
//!
//! Runs the reference walkthrough and prints each step.
//!
//! ```text
//! golden_path [CONFIG.toml]
//! ```
//!
//! Without a config file the arena holds exactly four nodes. Log output is
//! controlled through `RUST_LOG` (default `warn`).

use std::process::ExitCode;

use poolchain::golden_path;
use poolchain::PoolConfig;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => match PoolConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("failed to load {path}: {err}");
                return ExitCode::FAILURE;
            }
        },
        None => PoolConfig::for_nodes(4),
    };

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                  POOLCHAIN - GOLDEN PATH                     ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
    println!("  arena capacity: {} bytes", config.capacity);
    println!();

    match golden_path::run(&config) {
        Ok(steps) => {
            for step in &steps {
                println!("  {:<28} {}", step.action, step.outcome);
            }
            println!();
            println!("  ✓ {} steps completed", steps.len());
            ExitCode::SUCCESS
        }
        Err(err) => {
            println!("  ✗ golden path failed: {err}");
            ExitCode::FAILURE
        }
    }
}
