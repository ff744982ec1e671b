// Command-line front end: config loading, measurement import, reporting.
mod cli;
mod report;
mod settings;

use std::fs::File;
use std::path::Path;

use anyhow::Context;
use clap::Parser;
use pipe_core::measurements::MeasurementSet;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, OutputFormat};
use crate::report::Report;

fn read_measurements(path: &Path) -> anyhow::Result<MeasurementSet> {
    let file = File::open(path)
        .with_context(|| format!("failed to open measurements {}", path.display()))?;
    let set = MeasurementSet::from_csv_reader(file)
        .with_context(|| format!("failed to read measurements {}", path.display()))?;
    tracing::info!("Loaded {} measurements from {}", set.len(), path.display());
    Ok(set)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut params = settings::load_scenario(cli.config.as_deref())?;
    cli.apply_overrides(&mut params);
    params
        .validate()
        .context("scenario parameters out of range")?;

    if cli.print_config {
        print!("{}", toml::to_string_pretty(&params)?);
        return Ok(());
    }

    let measurements = cli
        .measurements
        .as_deref()
        .map(read_measurements)
        .transpose()?;

    let result = pipe_core::compute(&params, measurements.as_ref());

    let report = Report::new(&params, &result, measurements.as_ref());
    match cli.format {
        OutputFormat::Table => print!("{}", report.to_table(&cli.probes())),
        OutputFormat::Json => println!("{}", report.to_json()?),
    }

    Ok(())
}
