//! Trip, invoice reference and extracted-record models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which of the two known receipt families a document belongs to.
///
/// Derived per extraction attempt, never stored on its own; it is implicit
/// in which record shape ends up persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceKind {
    /// Invoice issued by the driver for the transportation service itself.
    Driver,
    /// Invoice issued by the platform for its fees.
    Aggregator,
}

/// A ride registered through intake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    pub trip_id: String,
    pub user_id: String,

    /// Raw ride summary as submitted.
    #[serde(default)]
    pub summary: serde_json::Value,

    /// Raw ride details as submitted.
    #[serde(default)]
    pub details: serde_json::Value,

    /// Fare quoted in the ride details, when it parsed cleanly.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fare: Option<Decimal>,

    pub last_updated: DateTime<Utc>,
}

/// A receipt document referenced by URL, with its acquisition state.
///
/// The two flags drive batch selection: `downloaded = false` documents are
/// fetch candidates, `downloaded && !processed` documents are extraction
/// candidates. Neither flag ever goes back from true to false.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceRef {
    pub id: i64,
    pub trip_id: String,
    pub download_url: String,

    /// Set once the document bytes have been written under the media root.
    #[serde(default)]
    pub downloaded: bool,

    /// Set once a typed record has been committed for this document.
    #[serde(default)]
    pub processed: bool,

    /// Refreshed on every download attempt, success or failure.
    pub last_updated: DateTime<Utc>,
}

/// Financial fields of a driver (transportation service) invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverInvoiceData {
    pub trip_id: String,
    pub fare: Decimal,
    pub net_amount: Decimal,
    pub tax: Decimal,
    pub amount_payable: Decimal,
}

/// Financial fields of an aggregator (platform fee) invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatorInvoiceData {
    pub trip_id: String,
    pub rounding: Decimal,
    pub fees: Decimal,
    pub net_amount: Decimal,
    pub tax: Decimal,
    pub amount_payable: Decimal,
}

/// Typed record produced by the extraction engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvoiceData {
    Driver(DriverInvoiceData),
    Aggregator(AggregatorInvoiceData),
}

impl InvoiceData {
    pub fn kind(&self) -> InvoiceKind {
        match self {
            InvoiceData::Driver(_) => InvoiceKind::Driver,
            InvoiceData::Aggregator(_) => InvoiceKind::Aggregator,
        }
    }

    pub fn trip_id(&self) -> &str {
        match self {
            InvoiceData::Driver(data) => &data.trip_id,
            InvoiceData::Aggregator(data) => &data.trip_id,
        }
    }
}
