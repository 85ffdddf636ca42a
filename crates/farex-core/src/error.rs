//! Error types for the farex-core library.

use thiserror::Error;

/// Main error type for the farex library.
#[derive(Error, Debug)]
pub enum FarexError {
    /// PDF text recovery error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Financial field extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Document download error.
    #[error("download error: {0}")]
    Download(#[from] DownloadError),

    /// Persistence error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF text recovery.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF bytes.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from the PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,
}

/// Errors related to financial field extraction.
///
/// These are field-level: the orchestrator catches them per document and
/// leaves the document unprocessed. An absent label is not an error (see
/// [`crate::extract::lookup_decimal`]).
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// A required labelled field was not present in the document.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The value line for a label lies beyond the end of the page.
    #[error("value for {label:?} at offset {offset} is out of range")]
    ValueOutOfRange { label: String, offset: usize },

    /// The value token could not be parsed as a decimal amount.
    #[error("failed to parse {label}: {value:?}")]
    Parse { label: String, value: String },
}

/// Errors raised while fetching a document.
#[derive(Error, Debug)]
pub enum DownloadError {
    /// Transport-level failure from the HTTP client.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status} for {url}")]
    Http {
        status: reqwest::StatusCode,
        url: String,
    },

    /// Failed writing the fetched bytes to disk.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The admission gate was closed while waiting for a permit.
    #[error("admission gate closed")]
    GateClosed,
}

/// Errors from the persistence layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// I/O error reading or writing the snapshot.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot could not be encoded or decoded.
    #[error("failed to encode store state: {0}")]
    Serde(#[from] serde_json::Error),

    /// An invoice was referenced by an id the store does not know.
    #[error("unknown invoice id: {0}")]
    UnknownInvoice(i64),
}

/// Result type for the farex library.
pub type Result<T> = std::result::Result<T, FarexError>;
