//! Label-relative positional lookup over flattened receipt text.
//!
//! Negative amounts may be masked as a lone `-` line with the magnitude on
//! the following line; every read here unmasks that convention and keeps
//! the running offset aligned for later fields.

use rust_decimal::Decimal;
use std::str::FromStr;

use super::Result;
use crate::error::ExtractionError;

/// Labels of the intra-state tax pair. A receipt carries either this pair
/// or the single inter-state line, never both.
const DUAL_TAX_LABELS: [&str; 2] = ["Total CGST", "Total SGST"];

/// Label of the single inter-state tax line.
const SINGLE_TAX_LABEL: &str = "Total IGST";

/// Cursor offset used when a receipt has no tax lines at all.
const NO_TAX_CURSOR: usize = 6;

/// Find the amount located `offset` lines after the first line containing
/// `label` (case-insensitive substring match).
///
/// Returns `Ok(None)` when no line carries the label; absence is a normal
/// layout variation, and the caller decides whether it is fatal.
/// Out-of-range reads and malformed tokens are field-level errors.
pub fn lookup_decimal(lines: &[String], label: &str, offset: usize) -> Result<Option<Decimal>> {
    let needle = label.to_lowercase();
    let Some(idx) = lines
        .iter()
        .position(|line| line.to_lowercase().contains(&needle))
    else {
        return Ok(None);
    };

    let mut offset = offset;
    read_amount(lines, label, idx, &mut offset).map(Some)
}

/// Read the amount token at `lines[idx + *offset]`, unmasking a lone `-`.
///
/// A masked negative advances `*offset` by one so that follow-up reads
/// keyed off the same cursor stay aligned with the shifted layout.
fn read_amount(lines: &[String], label: &str, idx: usize, offset: &mut usize) -> Result<Decimal> {
    let mut token = value_at(lines, label, idx, *offset)?.to_string();
    if token == "-" {
        *offset += 1;
        token = format!("-{}", value_at(lines, label, idx, *offset)?);
    }

    let cleaned = token.replace(',', "");
    Decimal::from_str(&cleaned).map_err(|_| ExtractionError::Parse {
        label: label.to_string(),
        value: token,
    })
}

fn value_at<'a>(lines: &'a [String], label: &str, idx: usize, offset: usize) -> Result<&'a str> {
    lines
        .get(idx + offset)
        .map(String::as_str)
        .ok_or_else(|| ExtractionError::ValueOutOfRange {
            label: label.to_string(),
            offset,
        })
}

/// Extract the total tax and the cursor offset for fields positioned after
/// the tax block.
///
/// Scans top to bottom and takes the first matching tax line. The returned
/// cursor is `4 + offset-after-last-component`, accounting for any mask
/// lines consumed, so fee and fare labels whose position shifts with the
/// size of the tax block can be resolved against it. Receipts without tax
/// lines yield `(0, 6)`.
pub fn extract_tax(lines: &[String]) -> Result<(Decimal, usize)> {
    for (idx, line) in lines.iter().enumerate() {
        if let Some(label) = DUAL_TAX_LABELS
            .iter()
            .copied()
            .find(|label| line.contains(label))
        {
            let mut offset = 2;
            let first = read_amount(lines, label, idx, &mut offset)?;
            offset += 3;
            let second = read_amount(lines, label, idx, &mut offset)?;
            return Ok((first + second, 4 + offset));
        }

        if line.contains(SINGLE_TAX_LABEL) {
            let mut offset = 2;
            let value = read_amount(lines, SINGLE_TAX_LABEL, idx, &mut offset)?;
            return Ok((value, 4 + offset));
        }
    }

    Ok((Decimal::ZERO, NO_TAX_CURSOR))
}

/// Where a field's label-relative lookup starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOffset {
    /// A fixed number of lines past the label.
    Fixed(usize),
    /// The cursor returned by [`extract_tax`]; these fields shift with the
    /// number of tax lines preceding them.
    TaxCursor,
}

/// Declarative lookup rule for one monetary field.
///
/// New layout quirks are absorbed here, by adding or adjusting specs,
/// rather than by new branching in the extraction code.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Label substring that anchors the lookup.
    pub label: &'static str,
    pub offset: FieldOffset,
    /// Value used when the label is absent; `None` leaves absence to the
    /// caller.
    pub default: Option<Decimal>,
    /// Fall back to the default on parse failure too, not just absence.
    pub lenient: bool,
}

impl FieldSpec {
    /// A field whose absence the caller must handle.
    pub const fn required(label: &'static str, offset: FieldOffset) -> Self {
        Self {
            label,
            offset,
            default: None,
            lenient: false,
        }
    }

    /// A field that reads as zero when its label is absent.
    pub const fn defaulted(label: &'static str, offset: FieldOffset) -> Self {
        Self {
            label,
            offset,
            default: Some(Decimal::ZERO),
            lenient: false,
        }
    }

    /// A field that reads as zero on absence or parse failure.
    pub const fn lenient(label: &'static str, offset: FieldOffset) -> Self {
        Self {
            label,
            offset,
            default: Some(Decimal::ZERO),
            lenient: true,
        }
    }

    /// Resolve this spec against a line sequence.
    ///
    /// `tax_cursor` is the offset produced by [`extract_tax`] for the same
    /// document.
    pub fn resolve(&self, lines: &[String], tax_cursor: usize) -> Result<Option<Decimal>> {
        let offset = match self.offset {
            FieldOffset::Fixed(n) => n,
            FieldOffset::TaxCursor => tax_cursor,
        };

        match lookup_decimal(lines, self.label, offset) {
            Ok(Some(value)) => Ok(Some(value)),
            Ok(None) => Ok(self.default),
            Err(_) if self.lenient && self.default.is_some() => Ok(self.default),
            Err(e) => Err(e),
        }
    }
}
