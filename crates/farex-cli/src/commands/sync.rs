//! Sync and sweep commands - run download/extraction batches.

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use farex_core::BatchReport;

use super::Context;

/// Arguments for the sync command.
#[derive(Args)]
pub struct SyncArgs {
    /// Trip identifiers to download and extract
    #[arg(required = true)]
    trip_ids: Vec<String>,
}

pub async fn run(args: SyncArgs, ctx: &Context) -> anyhow::Result<()> {
    let pipeline = ctx.pipeline()?;

    let spinner = batch_spinner("Downloading and extracting receipts");
    let report = pipeline.sync_trips(&args.trip_ids).await?;
    spinner.finish_and_clear();

    print_report(&report);
    Ok(())
}

pub async fn sweep(ctx: &Context) -> anyhow::Result<()> {
    let pipeline = ctx.pipeline()?;

    let spinner = batch_spinner("Sweeping backlog");
    let report = pipeline.sweep_backlog().await?;
    spinner.finish_and_clear();

    print_report(&report);
    Ok(())
}

pub fn batch_spinner(message: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    spinner
}

pub fn print_report(report: &BatchReport) {
    println!(
        "{} {} selected, {} downloaded, {} processed",
        style("✓").green(),
        report.selected,
        report.downloaded,
        report.processed
    );
    if report.excluded > 0 {
        println!(
            "   {} excluded by layout rules",
            style(report.excluded).yellow()
        );
    }
    if report.deferred > 0 {
        println!("   {} left pending", style(report.deferred).red());
    }
}
