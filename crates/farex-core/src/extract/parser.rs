//! Receipt classification and family-specific field extraction.

use rust_decimal::Decimal;
use tracing::debug;

use super::Result;
use super::fields::{FieldOffset, FieldSpec, extract_tax};
use crate::error::ExtractionError;
use crate::models::config::ExtractionConfig;
use crate::models::invoice::{
    AggregatorInvoiceData, DriverInvoiceData, InvoiceData, InvoiceKind,
};

/// Jurisdiction and document-variant markers that make extraction unsafe.
///
/// Receipts from these regions use incompatible layouts, and a credit note
/// reverses rather than charges; both are left unprocessed for manual
/// handling or future rules.
pub const EXCLUDED_MARKERS: [&str; 3] = ["Australia", "United Kingdom", "Credit Note"];

/// Fee labels that only ever appear on aggregator invoices.
pub const AGGREGATOR_MARKERS: [&str; 3] = ["Uber Fees", "Booking Fee", "Convenience Fee"];

const NET_AMOUNT: FieldSpec = FieldSpec::required("Total net amount", FieldOffset::Fixed(2));
const AMOUNT_PAYABLE: FieldSpec =
    FieldSpec::required("Total amount payable", FieldOffset::Fixed(2));
const FARE: FieldSpec =
    FieldSpec::required("Transportation service fare", FieldOffset::TaxCursor);
const ROUNDING: FieldSpec = FieldSpec::lenient("Rounding", FieldOffset::TaxCursor);

/// A receipt may carry any subset of these fee lines; absent components
/// count as zero.
const FEE_COMPONENTS: [FieldSpec; 3] = [
    FieldSpec::defaulted("Uber Fees", FieldOffset::TaxCursor),
    FieldSpec::defaulted("Booking Fee", FieldOffset::TaxCursor),
    FieldSpec::defaulted("Convenience Fee", FieldOffset::TaxCursor),
];

/// One classification rule: if any of its markers appears on any line, the
/// document belongs to `kind`. Rules are evaluated in order; the list is
/// open to extension as new layout families show up.
#[derive(Debug, Clone)]
struct ClassRule {
    /// Lowercased marker substrings.
    markers: Vec<String>,
    kind: InvoiceKind,
}

/// Classifier and field extraction engine for receipt line sequences.
///
/// Pure and stateless between calls: the same line sequence always yields
/// the same outcome.
#[derive(Debug, Clone)]
pub struct ReceiptParser {
    /// Lowercased exclusion markers.
    excluded_markers: Vec<String>,
    rules: Vec<ClassRule>,
}

impl ReceiptParser {
    /// Parser with the built-in marker sets.
    pub fn new() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }

    /// Parser with configured marker sets.
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            excluded_markers: lowercase(&config.excluded_markers),
            rules: vec![ClassRule {
                markers: lowercase(&config.aggregator_markers),
                kind: InvoiceKind::Aggregator,
            }],
        }
    }

    /// True when the document must not be extracted at all.
    ///
    /// Pure veto: the caller leaves vetoed documents unprocessed so they
    /// stay visible for manual handling.
    pub fn is_excluded(&self, lines: &[String]) -> bool {
        any_marker(lines, &self.excluded_markers)
    }

    /// Decide which invoice family the lines belong to.
    ///
    /// Total over non-excluded documents: rules are tried top to bottom
    /// and anything unmatched is a driver invoice.
    pub fn classify(&self, lines: &[String]) -> InvoiceKind {
        for rule in &self.rules {
            if any_marker(lines, &rule.markers) {
                return rule.kind;
            }
        }
        InvoiceKind::Driver
    }

    /// Run family-specific extraction over a line sequence.
    ///
    /// `Ok(None)` is the deferral outcome: the document classified as a
    /// driver invoice but its fare line was absent, so no record can be
    /// created yet.
    pub fn parse(&self, trip_id: &str, lines: &[String]) -> Result<Option<InvoiceData>> {
        match self.classify(lines) {
            InvoiceKind::Aggregator => self
                .parse_aggregator(trip_id, lines)
                .map(|data| Some(InvoiceData::Aggregator(data))),
            InvoiceKind::Driver => Ok(self
                .parse_driver(trip_id, lines)?
                .map(InvoiceData::Driver)),
        }
    }

    fn parse_driver(&self, trip_id: &str, lines: &[String]) -> Result<Option<DriverInvoiceData>> {
        let (tax, cursor) = extract_tax(lines)?;

        let Some(fare) = FARE.resolve(lines, cursor)? else {
            debug!(trip_id, "fare line absent, deferring document");
            return Ok(None);
        };

        Ok(Some(DriverInvoiceData {
            trip_id: trip_id.to_string(),
            fare,
            net_amount: require(&NET_AMOUNT, lines, cursor)?,
            tax,
            amount_payable: require(&AMOUNT_PAYABLE, lines, cursor)?,
        }))
    }

    fn parse_aggregator(&self, trip_id: &str, lines: &[String]) -> Result<AggregatorInvoiceData> {
        let (tax, cursor) = extract_tax(lines)?;

        let mut fees = Decimal::ZERO;
        for spec in &FEE_COMPONENTS {
            if let Some(component) = spec.resolve(lines, cursor)? {
                fees += component;
            }
        }

        Ok(AggregatorInvoiceData {
            trip_id: trip_id.to_string(),
            rounding: ROUNDING.resolve(lines, cursor)?.unwrap_or(Decimal::ZERO),
            fees,
            net_amount: require(&NET_AMOUNT, lines, cursor)?,
            tax,
            amount_payable: require(&AMOUNT_PAYABLE, lines, cursor)?,
        })
    }
}

impl Default for ReceiptParser {
    fn default() -> Self {
        Self::new()
    }
}

fn require(spec: &FieldSpec, lines: &[String], cursor: usize) -> Result<Decimal> {
    spec.resolve(lines, cursor)?
        .ok_or(ExtractionError::MissingField(spec.label))
}

fn lowercase(markers: &[String]) -> Vec<String> {
    markers.iter().map(|marker| marker.to_lowercase()).collect()
}

/// Case-insensitive "any line contains any marker".
fn any_marker(lines: &[String], markers: &[String]) -> bool {
    lines.iter().any(|line| {
        let line = line.to_lowercase();
        markers.iter().any(|marker| line.contains(marker))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|line| line.to_string()).collect()
    }

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    /// Aggregator receipt without tax lines: the tax cursor defaults to 6,
    /// so fee values sit six lines past their labels.
    fn aggregator_receipt() -> Vec<String> {
        lines(&[
            "Tax Invoice",
            "Uber Fees", // value at index 7, masked negative
            "x",
            "x",
            "x",
            "x",
            "x",
            "-",
            "250.00",
            "Rounding", // value at index 15
            "x",
            "x",
            "x",
            "x",
            "x",
            "0.10",
            "Total net amount", // value at index 18
            "x",
            "1,000.00",
            "Total amount payable", // value at index 21
            "x",
            "1,050.00",
        ])
    }

    #[test]
    fn classifies_by_marker_and_defaults_to_driver() {
        let parser = ReceiptParser::new();
        assert_eq!(
            parser.classify(&lines(&["blah", "UBER FEES", "blah"])),
            InvoiceKind::Aggregator
        );
        assert_eq!(
            parser.classify(&lines(&["Transportation service fare"])),
            InvoiceKind::Driver
        );
    }

    #[test]
    fn classification_is_deterministic() {
        let parser = ReceiptParser::new();
        let doc = lines(&["some line", "Booking Fee", "other"]);
        assert_eq!(parser.classify(&doc), parser.classify(&doc));
    }

    #[test]
    fn credit_notes_are_excluded_in_any_case() {
        let parser = ReceiptParser::new();
        assert!(parser.is_excluded(&lines(&["CREDIT note no. 42"])));
        assert!(parser.is_excluded(&lines(&["Sydney, Australia"])));
        assert!(!parser.is_excluded(&lines(&["Tax Invoice"])));
    }

    #[test]
    fn extracts_an_aggregator_receipt_with_masked_fees_and_no_tax() {
        let parser = ReceiptParser::new();
        let doc = aggregator_receipt();

        let data = match parser.parse("trip-a", &doc).unwrap().unwrap() {
            InvoiceData::Aggregator(data) => data,
            other => panic!("expected aggregator record, got {other:?}"),
        };

        assert_eq!(data.fees, dec("-250.00"));
        assert_eq!(data.rounding, dec("0.10"));
        assert_eq!(data.tax, Decimal::ZERO);
        assert_eq!(data.net_amount, dec("1000.00"));
        assert_eq!(data.amount_payable, dec("1050.00"));
    }

    #[test]
    fn extracts_a_driver_receipt_with_a_dual_tax_block() {
        let parser = ReceiptParser::new();
        // CGST at index 3; components at +2 and +5; cursor = 9. The fare
        // label at index 2 reads its value at 2 + 9 = 11.
        let doc = lines(&[
            "Tax Invoice",
            "x",
            "Transportation service fare", // value at idx 11
            "Total CGST",
            "x",
            "2.50",
            "x",
            "x",
            "5.00",
            "x",
            "x",
            "500.00",
            "Total net amount",
            "x",
            "497.50",
            "Total amount payable",
            "x",
            "505.00",
        ]);

        let data = match parser.parse("trip-b", &doc).unwrap().unwrap() {
            InvoiceData::Driver(data) => data,
            other => panic!("expected driver record, got {other:?}"),
        };

        assert_eq!(data.fare, dec("500.00"));
        assert_eq!(data.tax, dec("7.50"));
        assert_eq!(data.net_amount, dec("497.50"));
        assert_eq!(data.amount_payable, dec("505.00"));
    }

    #[test]
    fn driver_receipt_without_a_fare_line_is_deferred() {
        let parser = ReceiptParser::new();
        let doc = lines(&[
            "Tax Invoice",
            "Total net amount",
            "x",
            "100.00",
            "Total amount payable",
            "x",
            "100.00",
        ]);
        assert_eq!(parser.parse("trip-c", &doc).unwrap(), None);
    }

    #[test]
    fn aggregator_receipt_with_no_fee_lines_still_yields_a_record() {
        let parser = ReceiptParser::new();
        // Classified aggregator via "Convenience Fee" in running text, but
        // none of the fee labels resolve to a value... the marker line
        // itself is the label match, so give it a parseable value line.
        let doc = lines(&[
            "Convenience Fee",
            "x",
            "x",
            "x",
            "x",
            "x",
            "0.00",
            "Total net amount",
            "x",
            "100.00",
            "Total amount payable",
            "x",
            "100.00",
        ]);

        let data = match parser.parse("trip-d", &doc).unwrap().unwrap() {
            InvoiceData::Aggregator(data) => data,
            other => panic!("expected aggregator record, got {other:?}"),
        };
        assert_eq!(data.fees, Decimal::ZERO);
        assert_eq!(data.rounding, Decimal::ZERO);
    }

    #[test]
    fn missing_net_amount_is_a_field_error() {
        let parser = ReceiptParser::new();
        let doc = lines(&[
            "Transportation service fare",
            "x",
            "x",
            "x",
            "x",
            "x",
            "500.00",
        ]);
        let err = parser.parse("trip-e", &doc).unwrap_err();
        assert!(matches!(
            err,
            ExtractionError::MissingField("Total net amount")
        ));
    }
}
