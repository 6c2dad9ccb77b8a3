//! MediaGrid CLI Binary
//!
//! Command-line interface for the MediaGrid media catalog.

use anyhow::Context;
use clap::Parser;
use mediagrid::config::paths::resolve_data_dir;
use mediagrid::config::{ConfigLoader, StoragePaths};
use mediagrid::logging::init_logging;
use mediagrid::tooling::cli::{Cli, CliContext};
use std::process;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let data_dir = resolve_data_dir(cli.data_dir.clone())?;
    let paths = StoragePaths::under(&data_dir);
    paths
        .ensure()
        .with_context(|| format!("Failed to prepare data directory {}", data_dir.display()))?;

    // Loaded once up front so logging can honour the configured section.
    let config = ConfigLoader::load_or_init(&paths.config_file)
        .with_context(|| format!("Failed to load {}", paths.config_file.display()))?;
    init_logging(Some(&cli.logging_config(&config.logging)))?;

    let context = CliContext::new(paths, &config).context("Failed to open catalog")?;
    let result = context.execute(&cli.command).await;
    context.close()?;

    println!("{}", result?);
    Ok(())
}
