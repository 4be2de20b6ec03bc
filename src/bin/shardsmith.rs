//! Shardsmith CLI - corpus normalization, deduplication, and quality gating.
//!
//! Reads extracted function records from JSON-lines files, runs the
//! deduplication pipeline, and writes kept records plus a run summary.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing::info;

use shardsmith::core::records::FunctionRecord;
use shardsmith::{CorpusPipeline, JsonlSink, ShardsmithConfig};

#[derive(Parser)]
#[command(
    name = "shardsmith",
    version,
    about = "Build a deduplicated, quality-gated corpus from extracted code records"
)]
struct Cli {
    /// JSON-lines files of extracted function records
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// YAML configuration file (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output path for kept records
    #[arg(short, long, default_value = "kept_records.jsonl")]
    output: PathBuf,

    /// Output path for the run summary JSON (stdout when omitted)
    #[arg(short, long)]
    summary: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing/logging
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    let config = match &cli.config {
        Some(path) => ShardsmithConfig::from_yaml_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ShardsmithConfig::default(),
    };
    let pipeline = CorpusPipeline::new(config)?;

    let mut records = Vec::new();
    for path in &cli.inputs {
        read_records(path, &mut records)
            .with_context(|| format!("reading records from {}", path.display()))?;
    }
    info!(
        files = cli.inputs.len(),
        records = records.len(),
        "loaded input records"
    );

    let mut sink = JsonlSink::create(&cli.output)?;
    let report = pipeline.run(records, &mut sink)?;

    let summary_json = serde_json::to_string_pretty(&report.summary)?;
    match &cli.summary {
        Some(path) => std::fs::write(path, summary_json)
            .with_context(|| format!("writing summary to {}", path.display()))?,
        None => println!("{summary_json}"),
    }

    info!(
        kept = report.summary.kept,
        total = report.summary.total,
        output = %cli.output.display(),
        "wrote kept records"
    );
    Ok(())
}

fn read_records(path: &Path, out: &mut Vec<FunctionRecord>) -> anyhow::Result<()> {
    let file = File::open(path)?;
    for (lineno, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: FunctionRecord =
            serde_json::from_str(&line).with_context(|| format!("malformed line {}", lineno + 1))?;
        out.push(record);
    }
    Ok(())
}
