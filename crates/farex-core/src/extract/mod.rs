//! Financial field extraction from receipt line sequences.
//!
//! Both known receipt layouts render a label and its amount on separate,
//! positionally stable lines once the PDF is flattened to text, so values
//! are located by line offset from their label rather than by any table
//! structure. Classification between the two layouts and the exclusion
//! veto live in the parser.

mod fields;
mod parser;

pub use fields::{FieldOffset, FieldSpec, extract_tax, lookup_decimal};
pub use parser::{AGGREGATOR_MARKERS, EXCLUDED_MARKERS, ReceiptParser};

use crate::error::ExtractionError;

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;
