//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `geoip_heatmap` library that handles
//! command-line argument parsing, logger initialization, and user-facing
//! error output. All functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use geoip_heatmap::logging::init_logger;
use geoip_heatmap::{run_server, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();

    init_logger(config.log_level.into(), config.log_format)
        .context("Failed to initialize logger")?;

    if let Err(e) = run_server(config).await {
        eprintln!("geoip_heatmap error: {:#}", e);
        process::exit(1);
    }

    Ok(())
}
