//! Export and status commands - reporting over the store.

use std::path::PathBuf;

use clap::Args;
use console::style;

use farex_core::InvoiceStore;

use super::Context;

/// Arguments for the export command.
#[derive(Args)]
pub struct ExportArgs {
    /// Output CSV path (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub fn export(args: ExportArgs, ctx: &Context) -> anyhow::Result<()> {
    let pipeline = ctx.pipeline()?;
    let rows = pipeline.store().extracted_rows()?;

    let mut wtr: csv::Writer<Box<dyn std::io::Write>> = match &args.output {
        Some(path) => csv::Writer::from_writer(Box::new(std::fs::File::create(path)?)),
        None => csv::Writer::from_writer(Box::new(std::io::stdout())),
    };

    wtr.write_record([
        "trip_id",
        "quoted_fare",
        "driver_fare",
        "driver_tax",
        "driver_net_amount",
        "driver_amount_payable",
        "aggregator_fees",
        "aggregator_rounding",
        "aggregator_tax",
        "aggregator_net_amount",
        "aggregator_amount_payable",
        "total_payable",
        "matches_quote",
    ])?;

    for row in &rows {
        // A trip reconciles when both invoices are in and their payable
        // amounts sum to the quoted fare.
        let total_payable = match (&row.driver, &row.aggregator) {
            (Some(driver), Some(aggregator)) => {
                Some(driver.amount_payable + aggregator.amount_payable)
            }
            _ => None,
        };
        let matches_quote = match (total_payable, row.quoted_fare) {
            (Some(total), Some(quote)) => Some(total == quote),
            _ => None,
        };

        wtr.write_record([
            row.trip_id.clone(),
            opt(row.quoted_fare),
            opt(row.driver.as_ref().map(|record| record.fare)),
            opt(row.driver.as_ref().map(|record| record.tax)),
            opt(row.driver.as_ref().map(|record| record.net_amount)),
            opt(row.driver.as_ref().map(|record| record.amount_payable)),
            opt(row.aggregator.as_ref().map(|record| record.fees)),
            opt(row.aggregator.as_ref().map(|record| record.rounding)),
            opt(row.aggregator.as_ref().map(|record| record.tax)),
            opt(row.aggregator.as_ref().map(|record| record.net_amount)),
            opt(row.aggregator.as_ref().map(|record| record.amount_payable)),
            opt(total_payable),
            opt(matches_quote),
        ])?;
    }
    wtr.flush()?;

    if let Some(path) = &args.output {
        println!(
            "{} Exported {} rows to {}",
            style("✓").green(),
            rows.len(),
            path.display()
        );
    }
    Ok(())
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

pub fn status(ctx: &Context) -> anyhow::Result<()> {
    let pipeline = ctx.pipeline()?;
    let store = pipeline.store();

    let trips = store.trips()?.len();
    let undownloaded = store.undownloaded()?.len();
    let pending = store.pending_extraction()?.len();
    let rows = store.extracted_rows()?;
    let driver = rows.iter().filter(|row| row.driver.is_some()).count();
    let aggregator = rows.iter().filter(|row| row.aggregator.is_some()).count();

    println!("{}", style("Store status").bold());
    println!("  Trips:               {trips}");
    println!("  Awaiting download:   {undownloaded}");
    println!("  Awaiting extraction: {pending}");
    println!("  Driver records:      {driver}");
    println!("  Aggregator records:  {aggregator}");
    Ok(())
}
