//! Batch orchestration: selection, download, extraction, commit.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::download::{DownloadJob, DownloadManager};
use crate::error::Result;
use crate::extract::ReceiptParser;
use crate::models::config::FarexConfig;
use crate::models::invoice::{InvoiceData, InvoiceRef, Trip};
use crate::models::submission::Submission;
use crate::pdf::ReceiptPdf;
use crate::store::{InvoiceStore, MediaPaths};

/// Counters for one batch run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    /// Documents selected as batch candidates.
    pub selected: usize,
    /// Documents newly downloaded in this run.
    pub downloaded: usize,
    /// Documents extracted and committed in this run.
    pub processed: usize,
    /// Documents vetoed by the exclusion filter.
    pub excluded: usize,
    /// Documents left pending: extraction failed or a required field was
    /// absent.
    pub deferred: usize,
}

/// Per-document extraction outcome, before persistence.
enum Outcome {
    Extracted(InvoiceData),
    Excluded,
    Deferred,
}

/// Drives the acquisition-and-extraction pipeline over a store.
///
/// All engine state (admission gate, retry policy, parser, path resolver)
/// is owned here and passed down explicitly. This is also the only
/// boundary where per-document failures are swallowed: anything that goes
/// wrong with one document is logged and the batch moves on.
pub struct Pipeline<S> {
    store: S,
    downloader: DownloadManager,
    parser: ReceiptParser,
    media: MediaPaths,
}

impl<S: InvoiceStore> Pipeline<S> {
    pub fn new(config: &FarexConfig, store: S) -> Result<Self> {
        Ok(Self {
            downloader: DownloadManager::new(&config.download)?,
            parser: ReceiptParser::from_config(&config.extraction),
            media: MediaPaths::new(&config.storage.media_root),
            store,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Register every trip in a submission, returning the new trip ids.
    ///
    /// Entries without a trip identifier are skipped with a warning;
    /// intake never fails on a single malformed entry.
    pub fn ingest(&self, submission: &Submission) -> Result<Vec<String>> {
        let mut trip_ids = Vec::new();

        for item in &submission.data {
            let Some(trip_id) = item.trip_id() else {
                warn!("submission entry without a summary uuid, skipping");
                continue;
            };

            self.store.insert_trip(Trip {
                trip_id: trip_id.to_string(),
                user_id: submission.user_id.clone(),
                summary: item.summary.clone(),
                details: item.details.clone(),
                fare: item.quoted_fare(),
                last_updated: Utc::now(),
            })?;

            for invoice in &item.invoices {
                self.store.insert_invoice(trip_id, &invoice.download_url)?;
            }
            trip_ids.push(trip_id.to_string());
        }

        info!(trips = trip_ids.len(), "submission ingested");
        Ok(trip_ids)
    }

    /// "New" batch: download and extract the documents of the given trips.
    pub async fn sync_trips(&self, trip_ids: &[String]) -> Result<BatchReport> {
        let candidates = self.store.invoices_for_trips(trip_ids)?;
        self.run_batch(candidates).await
    }

    /// Backlog sweep: retry every undownloaded document, then extract
    /// anything downloaded but unprocessed, including leftovers from
    /// earlier batches.
    pub async fn sweep_backlog(&self) -> Result<BatchReport> {
        let mut report = BatchReport::default();

        let undownloaded = self.store.undownloaded()?;
        let mut candidate_ids: Vec<i64> =
            undownloaded.iter().map(|invoice| invoice.id).collect();
        self.download(undownloaded, &mut report).await?;

        let pending = self.store.pending_extraction()?;
        for invoice in &pending {
            if !candidate_ids.contains(&invoice.id) {
                candidate_ids.push(invoice.id);
            }
        }
        report.selected = candidate_ids.len();
        self.process(pending, &mut report)?;

        Ok(report)
    }

    async fn run_batch(&self, candidates: Vec<InvoiceRef>) -> Result<BatchReport> {
        let mut report = BatchReport {
            selected: candidates.len(),
            ..BatchReport::default()
        };

        // A document is never re-fetched once downloaded.
        let to_fetch: Vec<InvoiceRef> = candidates
            .iter()
            .filter(|invoice| !invoice.downloaded)
            .cloned()
            .collect();
        self.download(to_fetch, &mut report).await?;

        let ids: Vec<i64> = candidates.iter().map(|invoice| invoice.id).collect();
        let pending: Vec<InvoiceRef> = self
            .store
            .invoices_by_ids(&ids)?
            .into_iter()
            .filter(|invoice| invoice.downloaded && !invoice.processed)
            .collect();
        self.process(pending, &mut report)?;

        Ok(report)
    }

    /// Fetch the given documents and persist their flags, one commit per
    /// document. The flags are the only error channel.
    async fn download(&self, invoices: Vec<InvoiceRef>, report: &mut BatchReport) -> Result<()> {
        if invoices.is_empty() {
            return Ok(());
        }

        let mut jobs: Vec<DownloadJob> = invoices
            .into_iter()
            .map(|invoice| {
                let dest = self.media.invoice_path(&invoice.trip_id, &invoice.download_url);
                DownloadJob { invoice, dest }
            })
            .collect();

        self.downloader.fetch_batch(&mut jobs).await;

        for job in &jobs {
            self.store.save_invoice(&job.invoice)?;
            if job.invoice.downloaded {
                report.downloaded += 1;
            }
        }
        Ok(())
    }

    /// Extract the given documents sequentially, committing each success
    /// immediately. A failure only ever affects its own document.
    fn process(&self, invoices: Vec<InvoiceRef>, report: &mut BatchReport) -> Result<()> {
        for invoice in invoices {
            match self.process_one(&invoice) {
                Ok(Outcome::Extracted(data)) => {
                    self.store.commit_extraction(&invoice, &data)?;
                    report.processed += 1;
                    info!(
                        trip_id = %invoice.trip_id,
                        kind = ?data.kind(),
                        "invoice processed"
                    );
                }
                Ok(Outcome::Excluded) => {
                    report.excluded += 1;
                    debug!(trip_id = %invoice.trip_id, "excluded layout, leaving unprocessed");
                }
                Ok(Outcome::Deferred) => {
                    report.deferred += 1;
                    warn!(
                        trip_id = %invoice.trip_id,
                        "required fare line absent, leaving unprocessed"
                    );
                }
                Err(e) => {
                    report.deferred += 1;
                    warn!(
                        trip_id = %invoice.trip_id,
                        url = %invoice.download_url,
                        error = %e,
                        "extraction failed, leaving unprocessed"
                    );
                }
            }
        }
        Ok(())
    }

    fn process_one(&self, invoice: &InvoiceRef) -> Result<Outcome> {
        let path = self.media.invoice_path(&invoice.trip_id, &invoice.download_url);
        let bytes = std::fs::read(&path)?;
        let pdf = ReceiptPdf::load(&bytes)?;
        let lines = pdf.first_page_lines()?;

        if self.parser.is_excluded(&lines) {
            return Ok(Outcome::Excluded);
        }

        match self.parser.parse(&invoice.trip_id, &lines)? {
            Some(data) => Ok(Outcome::Extracted(data)),
            None => Ok(Outcome::Deferred),
        }
    }
}
