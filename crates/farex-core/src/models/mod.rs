//! Data models: configuration, trips, invoice references and records.

pub mod config;
pub mod invoice;
pub mod submission;

pub use config::{DownloadConfig, ExtractionConfig, FarexConfig, StorageConfig};
pub use invoice::{
    AggregatorInvoiceData, DriverInvoiceData, InvoiceData, InvoiceKind, InvoiceRef, Trip,
};
pub use submission::{InvoiceSubmission, Submission, TripSubmission};
