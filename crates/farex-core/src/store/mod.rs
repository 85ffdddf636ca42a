//! Persistence boundary for trips, invoice references and extracted
//! records.

mod json;
mod paths;

pub use json::JsonStore;
pub use paths::MediaPaths;

use rust_decimal::Decimal;

use crate::error::StoreError;
use crate::models::invoice::{
    AggregatorInvoiceData, DriverInvoiceData, InvoiceData, InvoiceRef, Trip,
};

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// One trip's extracted records joined with its quoted fare, for
/// reconciliation reporting.
#[derive(Debug, Clone)]
pub struct ExtractedRow {
    pub trip_id: String,
    pub quoted_fare: Option<Decimal>,
    pub driver: Option<DriverInvoiceData>,
    pub aggregator: Option<AggregatorInvoiceData>,
}

/// Transactional store over trips, invoice references and typed records.
///
/// Every mutating call commits before returning; the pipeline relies on
/// that per-document granularity so one document's failure can never roll
/// back another's committed success. Implementations only need
/// per-document write atomicity, never cross-document locking.
pub trait InvoiceStore {
    /// Register a trip; replaces an existing trip with the same id.
    fn insert_trip(&self, trip: Trip) -> Result<()>;

    /// Register an invoice reference, assigning its id.
    fn insert_invoice(&self, trip_id: &str, download_url: &str) -> Result<InvoiceRef>;

    fn trips(&self) -> Result<Vec<Trip>>;

    /// Invoice references belonging to any of the given trips.
    fn invoices_for_trips(&self, trip_ids: &[String]) -> Result<Vec<InvoiceRef>>;

    fn invoices_by_ids(&self, ids: &[i64]) -> Result<Vec<InvoiceRef>>;

    /// Invoices that have never been fetched successfully.
    fn undownloaded(&self) -> Result<Vec<InvoiceRef>>;

    /// Invoices fetched but not yet extracted.
    fn pending_extraction(&self) -> Result<Vec<InvoiceRef>>;

    /// Upsert an invoice's flags and timestamp.
    fn save_invoice(&self, invoice: &InvoiceRef) -> Result<()>;

    /// Persist a typed record and mark its invoice processed, as one
    /// commit.
    fn commit_extraction(&self, invoice: &InvoiceRef, data: &InvoiceData) -> Result<()>;

    /// Joined per-trip view of everything extracted so far.
    fn extracted_rows(&self) -> Result<Vec<ExtractedRow>>;
}
