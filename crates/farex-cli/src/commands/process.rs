//! Process command - one-shot extraction of a local receipt file.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, ValueEnum};
use console::style;

use farex_core::{InvoiceData, ReceiptParser, ReceiptPdf};

use super::Context;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Receipt PDF to extract
    input: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

pub fn run(args: ProcessArgs, ctx: &Context) -> anyhow::Result<()> {
    let bytes = std::fs::read(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let pdf = ReceiptPdf::load(&bytes)?;
    let lines = pdf.first_page_lines()?;

    let parser = ReceiptParser::from_config(&ctx.config.extraction);
    if parser.is_excluded(&lines) {
        println!("{} Excluded layout; not extracting", style("⚠").yellow());
        return Ok(());
    }

    let trip_id = args
        .input
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("local");
    let Some(data) = parser.parse(trip_id, &lines)? else {
        println!("{} Fare line absent; nothing extracted", style("⚠").yellow());
        return Ok(());
    };

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&data)?),
        OutputFormat::Text => print_record(&data),
    }
    Ok(())
}

fn print_record(data: &InvoiceData) {
    match data {
        InvoiceData::Driver(record) => {
            println!("{}", style("Driver invoice").bold());
            println!("  Fare:           {}", record.fare);
            println!("  Tax:            {}", record.tax);
            println!("  Net amount:     {}", record.net_amount);
            println!("  Amount payable: {}", record.amount_payable);
        }
        InvoiceData::Aggregator(record) => {
            println!("{}", style("Aggregator invoice").bold());
            println!("  Fees:           {}", record.fees);
            println!("  Rounding:       {}", record.rounding);
            println!("  Tax:            {}", record.tax);
            println!("  Net amount:     {}", record.net_amount);
            println!("  Amount payable: {}", record.amount_payable);
        }
    }
}
