//! Core library for ride-receipt acquisition and extraction.
//!
//! This crate provides:
//! - Submission intake (trips and their receipt document references)
//! - Concurrency-bounded document downloading with retry
//! - PDF first-page text recovery
//! - Receipt classification and financial field extraction
//! - A persistence boundary with per-document commit semantics

pub mod error;
pub mod models;
pub mod pdf;
pub mod extract;
pub mod download;
pub mod store;
pub mod pipeline;

pub use error::{
    DownloadError, ExtractionError, FarexError, PdfError, Result, StoreError,
};
pub use models::config::{DownloadConfig, ExtractionConfig, FarexConfig, StorageConfig};
pub use models::invoice::{
    AggregatorInvoiceData, DriverInvoiceData, InvoiceData, InvoiceKind, InvoiceRef, Trip,
};
pub use models::submission::Submission;
pub use pdf::ReceiptPdf;
pub use extract::{ReceiptParser, extract_tax, lookup_decimal};
pub use download::{DownloadJob, DownloadManager, RetryPolicy};
pub use store::{ExtractedRow, InvoiceStore, JsonStore, MediaPaths};
pub use pipeline::{BatchReport, Pipeline};
