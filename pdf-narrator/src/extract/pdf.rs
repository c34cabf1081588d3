//! Direct access to a PDF's embedded text layer using lopdf.

use crate::error::{NarratorError, Result};
use lopdf::Document;
use std::path::Path;

/// Page-by-page text access to a PDF.
pub trait PdfSource {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Text of a 1-based page. `None` when the page has no text layer.
    fn page_text(&self, page: usize) -> Result<Option<String>>;
}

/// PDF loaded with lopdf.
pub struct LopdfSource {
    document: Document,
    /// lopdf page numbers in document order
    page_numbers: Vec<u32>,
}

impl LopdfSource {
    /// Load a PDF document from disk.
    pub fn open(path: &Path) -> Result<Self> {
        let document = Document::load(path).map_err(|e| {
            NarratorError::Input(format!("Failed to open PDF {}: {}", path.display(), e))
        })?;
        let page_numbers = document.get_pages().keys().copied().collect();

        Ok(Self {
            document,
            page_numbers,
        })
    }
}

impl PdfSource for LopdfSource {
    fn page_count(&self) -> usize {
        self.page_numbers.len()
    }

    fn page_text(&self, page: usize) -> Result<Option<String>> {
        let Some(&number) = page.checked_sub(1).and_then(|i| self.page_numbers.get(i)) else {
            return Ok(None);
        };

        let text = self
            .document
            .extract_text(&[number])
            .map_err(|e| NarratorError::Input(format!("Failed to read page {}: {}", page, e)))?;

        Ok(if text.is_empty() { None } else { Some(text) })
    }
}
