//! Enrich the DMA feature collection with display names and put `dma_id` /
//! `dma_name` first in every feature.
//!
//! Source paths are fixed at deploy time: a `dmamap.toml` shipped next to the
//! binary, or the compiled-in defaults when there is none.

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dmamap_core::{config, Config};

#[derive(Parser)]
#[command(name = "dmamap", about = "Attach DMA names to a GeoJSON feature collection")]
#[command(version)]
struct Cli {
    /// Load and normalize, report, but do not write the output file
    #[arg(long)]
    dry_run: bool,
}

fn main() -> ExitCode {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("dmamap=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = deploy_config()?;

    info!(
        mapping = %config.mapping.path.display(),
        input = %config.geojson.input.display(),
        output = %config.geojson.output_path().display(),
        dry_run = cli.dry_run,
        "DMA map normalization starting"
    );

    if cli.dry_run {
        let report = dmamap_core::dry_run(&config).context("Dry run failed")?;
        println!(
            "Dry run: {} features ({} matched, {} unmapped, {} without id); {} not written.",
            report.stats.features,
            report.stats.matched,
            report.stats.unmapped,
            report.stats.missing_identifier,
            report.output.display()
        );
        return Ok(());
    }

    let report = dmamap_core::run(&config).with_context(|| {
        format!(
            "Failed to normalize {}",
            config.geojson.input.display()
        )
    })?;
    println!("{}", report.completion_message());
    Ok(())
}

fn deploy_config() -> Result<Config> {
    let exe = std::env::current_exe().context("Failed to locate the running binary")?;
    let dir = exe
        .parent()
        .context("binary must have a parent directory")?;

    info!(dir = %dir.display(), file = config::CONFIG_FILE_NAME, "Resolving deploy-time config");
    let config = Config::resolve_in(dir)?;
    Ok(config)
}
