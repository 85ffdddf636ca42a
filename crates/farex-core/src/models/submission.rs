//! Intake payload types.
//!
//! Submissions arrive as JSON captured from the ride platform's own API;
//! only the trip identifier and the invoice download URLs are structural,
//! the rest is kept verbatim on the [`crate::models::invoice::Trip`].

use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;

/// A batch of trips submitted for ingestion.
#[derive(Debug, Clone, Deserialize)]
pub struct Submission {
    pub user_id: String,
    pub data: Vec<TripSubmission>,
}

/// One trip inside a submission.
#[derive(Debug, Clone, Deserialize)]
pub struct TripSubmission {
    pub summary: serde_json::Value,
    pub details: serde_json::Value,
    #[serde(default)]
    pub invoices: Vec<InvoiceSubmission>,
}

/// One receipt document attached to a submitted trip.
#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceSubmission {
    #[serde(rename = "downloadURL")]
    pub download_url: String,
}

impl TripSubmission {
    /// Trip identifier carried in the submitted summary.
    pub fn trip_id(&self) -> Option<&str> {
        self.summary.get("uuid").and_then(|value| value.as_str())
    }

    /// Fare quoted in the ride details, with the currency glyph stripped.
    ///
    /// An unparseable fare is `None`, never an intake failure.
    pub fn quoted_fare(&self) -> Option<Decimal> {
        let fare = self.details.get("trip")?.get("fare")?.as_str()?;
        Decimal::from_str(fare.replace('₹', "").trim()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn submission(fare: &str) -> TripSubmission {
        serde_json::from_value(serde_json::json!({
            "summary": { "uuid": "trip-1" },
            "details": { "trip": { "fare": fare } },
            "invoices": [ { "downloadURL": "https://host/invoice.pdf" } ],
        }))
        .unwrap()
    }

    #[test]
    fn trip_id_comes_from_summary_uuid() {
        assert_eq!(submission("₹100").trip_id(), Some("trip-1"));
    }

    #[test]
    fn quoted_fare_strips_currency_glyph() {
        assert_eq!(
            submission("₹249.93").quoted_fare(),
            Some(Decimal::from_str("249.93").unwrap())
        );
    }

    #[test]
    fn unparseable_fare_is_none() {
        assert_eq!(submission("about 250").quoted_fare(), None);
    }
}
