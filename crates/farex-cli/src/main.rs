//! CLI application for ride-receipt ingestion and extraction.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{ingest, process, report, sync};

/// farex - fetch ride receipts and extract their financial fields
#[derive(Parser)]
#[command(name = "farex")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Path of the store snapshot (overrides config)
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    /// Root directory for fetched documents (overrides config)
    #[arg(long, global = true)]
    media_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a submission file, then download and extract its receipts
    Ingest(ingest::IngestArgs),

    /// Download and extract the receipts of specific trips
    Sync(sync::SyncArgs),

    /// Sweep the backlog: retry failed downloads and pending extractions
    Sweep,

    /// Extract a single local receipt file and print the record
    Process(process::ProcessArgs),

    /// Export extracted records as CSV
    Export(report::ExportArgs),

    /// Show store counters
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let ctx = commands::Context::new(cli.config.as_deref(), cli.state, cli.media_root)?;

    match cli.command {
        Commands::Ingest(args) => ingest::run(args, &ctx).await,
        Commands::Sync(args) => sync::run(args, &ctx).await,
        Commands::Sweep => sync::sweep(&ctx).await,
        Commands::Process(args) => process::run(args, &ctx),
        Commands::Export(args) => report::export(args, &ctx),
        Commands::Status => report::status(&ctx),
    }
}
