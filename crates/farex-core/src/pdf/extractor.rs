//! First-page line recovery using lopdf and pdf-extract.

use lopdf::Document;
use tracing::debug;

use super::Result;
use crate::error::PdfError;

/// A loaded receipt document.
///
/// lopdf provides the structure (page count, decryption); the flattened
/// text comes from pdf-extract over the raw bytes.
#[derive(Debug)]
pub struct ReceiptPdf {
    document: Document,
    raw_data: Vec<u8>,
}

impl ReceiptPdf {
    /// Load a receipt from raw PDF bytes.
    pub fn load(data: &[u8]) -> Result<Self> {
        let mut document =
            Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Receipts are occasionally shipped with empty-password encryption.
        let raw_data = if document.is_encrypted() {
            if document.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("decrypted PDF with empty password");
            let mut decrypted = Vec::new();
            document
                .save_to(&mut decrypted)
                .map_err(|e| PdfError::Parse(format!("failed to save decrypted PDF: {e}")))?;
            decrypted
        } else {
            data.to_vec()
        };

        if document.get_pages().is_empty() {
            return Err(PdfError::NoPages);
        }

        Ok(Self { document, raw_data })
    }

    pub fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    /// Extract the embedded text of the whole document.
    pub fn extract_text(&self) -> Result<String> {
        pdf_extract::extract_text_from_mem(&self.raw_data)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }

    /// Non-blank, trimmed text lines of the first page.
    ///
    /// The financial summary of both known receipt layouts sits on the
    /// first page; later pages carry boilerplate only.
    pub fn first_page_lines(&self) -> Result<Vec<String>> {
        let text = self.extract_text()?;
        Ok(page_lines(&text, self.page_count(), 1))
    }
}

/// Apportion flattened text lines to one page and normalize them.
///
/// pdf-extract flattens the whole document; lines are split evenly across
/// pages, then trimmed with blanks dropped.
fn page_lines(text: &str, page_count: u32, page: u32) -> Vec<String> {
    let lines: Vec<&str> = text.lines().collect();
    let pages = (page_count as usize).max(1);

    let per_page = lines.len() / pages;
    let start = ((page - 1) as usize * per_page).min(lines.len());
    let end = if page as usize == pages {
        lines.len()
    } else {
        (page as usize * per_page).min(lines.len())
    };

    lines[start..end]
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
