//! Ingest command - register a submission and run its batch.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Args;
use console::style;

use farex_core::Submission;

use super::Context;
use super::sync::{batch_spinner, print_report};

/// Arguments for the ingest command.
#[derive(Args)]
pub struct IngestArgs {
    /// Submission JSON file captured from the ride platform
    file: PathBuf,

    /// Register only; skip the download/extraction batch
    #[arg(long)]
    no_fetch: bool,
}

pub async fn run(args: IngestArgs, ctx: &Context) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let submission: Submission =
        serde_json::from_str(&content).context("failed to parse submission JSON")?;

    let pipeline = ctx.pipeline()?;
    let trip_ids = pipeline.ingest(&submission)?;
    println!("{} Registered {} trips", style("✓").green(), trip_ids.len());

    if args.no_fetch || trip_ids.is_empty() {
        return Ok(());
    }

    let spinner = batch_spinner("Downloading and extracting receipts");
    let report = pipeline.sync_trips(&trip_ids).await?;
    spinner.finish_and_clear();
    print_report(&report);
    Ok(())
}
