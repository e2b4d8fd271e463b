//! Training CLI.
//!
//! Fits the feature pipeline on a raw transaction CSV, writes the
//! transformed matrix plus label, and persists the pipeline artifact the
//! service loads at startup.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use fraud_scoring::{config::AppConfig, train};
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "train", about = "Fit the fraud scoring feature pipeline")]
struct Args {
    /// Raw transaction CSV (header included, FraudResult required).
    #[arg(long)]
    input: PathBuf,

    /// Where to write the transformed CSV.
    #[arg(long)]
    output: PathBuf,

    /// Where to persist the fitted pipeline artifact. Defaults to the
    /// path the service loads from.
    #[arg(long)]
    pipeline_out: Option<PathBuf>,

    /// Service configuration file (pipeline options are read from it).
    #[arg(long, default_value = "config/config.toml")]
    config: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fraud_scoring=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let config = if args.config.exists() {
        AppConfig::load_from_path(&args.config)?
    } else {
        warn!(path = %args.config.display(), "Config file not found, using defaults");
        AppConfig::default()
    };

    let pipeline_out = args
        .pipeline_out
        .unwrap_or_else(|| PathBuf::from(&config.artifacts.pipeline_path));

    let summary = train::run_training(&args.input, &args.output, &pipeline_out, config.pipeline)?;
    info!(
        rows = summary.rows,
        columns = summary.output_columns,
        "Pipeline fitted and persisted"
    );
    Ok(())
}
