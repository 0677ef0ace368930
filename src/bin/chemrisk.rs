//! Batch entry point: CSV inventory in, JSON artifact out

use anyhow::Context;
use chemrisk::{export, ingest, Pipeline, PipelineConfig, SensitiveReceptor};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Score a chemical-release inventory and flag anomalous facilities
#[derive(Debug, Parser)]
#[command(name = "chemrisk", version, about)]
struct Args {
    /// Path to the release inventory CSV
    #[arg(long)]
    input: PathBuf,

    /// Path the facilities JSON artifact is written to
    #[arg(long)]
    output: PathBuf,

    /// Seed for the randomized detectors
    #[arg(long)]
    seed: Option<u64>,

    /// JSON file with a custom sensitive-receptor list
    #[arg(long)]
    receptors: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut config = PipelineConfig::default();
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    if let Some(path) = &args.receptors {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("cannot read receptor list {}", path.display()))?;
        let receptors: Vec<SensitiveReceptor> = serde_json::from_str(&contents)
            .with_context(|| format!("invalid receptor list {}", path.display()))?;
        config = config.with_receptors(receptors);
    }

    let (facilities, ingest_summary) = ingest::read_csv_path(&args.input)
        .with_context(|| format!("ingest failed for {}", args.input.display()))?;

    let pipeline = Pipeline::new(config).context("invalid pipeline configuration")?;
    let output = pipeline.run(facilities).context("pipeline run failed")?;

    let records = export::to_records(&output.scored, pipeline.toxicity_table());
    export::write_json(&args.output, &records)
        .with_context(|| format!("cannot write artifact {}", args.output.display()))?;

    info!(
        facilities = output.summary.facilities,
        scored = output.summary.scored,
        unscored = output.summary.unscored,
        anomalies = output.summary.anomalies,
        rows_skipped = ingest_summary.rows_skipped,
        artifact = %args.output.display(),
        "done"
    );
    Ok(())
}
