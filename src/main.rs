//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `api_throttle` library that handles:
//! - Command-line argument parsing
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use api_throttle::initialization::init_logger_with;
use api_throttle::{run_demo, DemoOptions};

#[tokio::main]
async fn main() -> Result<()> {
    let opts = DemoOptions::parse();

    init_logger_with(opts.log_level.clone().into(), opts.log_format.clone())
        .context("Failed to initialize logger")?;

    match run_demo(opts.demo_config()).await {
        Ok(report) => {
            if opts.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&report).context("Failed to serialize report")?
                );
            } else {
                println!(
                    "✅ Ran {} call{} ({} succeeded, {} failed, {} service requests) in {:.1}s",
                    report.total_calls,
                    if report.total_calls == 1 { "" } else { "s" },
                    report.successful,
                    report.failed,
                    report.service_calls,
                    report.elapsed_seconds
                );
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("throttle_demo error: {:#}", e);
            process::exit(1);
        }
    }
}
