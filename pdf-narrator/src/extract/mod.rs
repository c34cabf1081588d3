//! Full-document text extraction with OCR fallback for scanned PDFs.

pub mod ocr;
pub mod pdf;

use crate::config::PathsConfig;
use crate::error::{NarratorError, Result};
use crate::text::{clean_text, strip_trailing_references};
use ocr::{OCR_DPI, OcrTools, PageRasterizer, TextRecognizer};
use pdf::{LopdfSource, PdfSource};
use std::path::Path;
use tempfile::TempDir;

/// Pages inspected to decide whether a PDF has a text layer.
pub const SCAN_CHECK_PAGES: usize = 3;

/// How text is obtained from a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMode {
    /// Embedded text layer
    DirectText,
    /// Rasterize pages and recognize text
    Ocr,
}

/// Decide the extraction mode from the first pages of a document.
///
/// A document is treated as scanned when every inspected page is blank.
/// Pages that fail to extract count as blank.
pub fn detect_mode(source: &dyn PdfSource) -> Result<ExtractionMode> {
    let page_count = source.page_count();
    if page_count == 0 {
        return Err(NarratorError::Input("PDF has no pages".to_string()));
    }

    let checked = page_count.min(SCAN_CHECK_PAGES);
    let blank_pages = (1..=checked)
        .filter(|&page| match source.page_text(page) {
            Ok(Some(text)) => {
                log::debug!("[Scan check] page {} text: {:?}", page, text);
                text.trim().is_empty()
            }
            Ok(None) => true,
            Err(e) => {
                log::debug!("[Scan check] page {} unreadable: {}", page, e);
                true
            }
        })
        .count();

    if blank_pages == checked {
        log::info!(
            "First {} page(s) are blank; likely an image-based PDF. Switching to OCR",
            checked
        );
        Ok(ExtractionMode::Ocr)
    } else {
        log::info!("Text found in the first {} page(s)", checked);
        Ok(ExtractionMode::DirectText)
    }
}

/// Assemble cleaned text from the embedded text layer.
pub fn extract_direct(source: &dyn PdfSource) -> String {
    let mut full_text = String::new();

    for page in 1..=source.page_count() {
        match source.page_text(page) {
            Ok(Some(text)) if !text.is_empty() => {
                log::debug!("Adding page {}", page);
                full_text.push('\n');
                full_text.push_str(&clean_text(&text));
            }
            Ok(_) => log::debug!("Page {} has no text", page),
            Err(e) => log::warn!("Skipping page {}: {}", page, e),
        }
    }

    strip_trailing_references(&full_text)
}

/// Assemble cleaned text by rasterizing pages and running OCR on each.
///
/// Any rasterization failure aborts the whole extraction.
pub fn extract_ocr(
    pdf_path: &Path,
    rasterizer: &dyn PageRasterizer,
    recognizer: &dyn TextRecognizer,
) -> Result<String> {
    let image_dir = TempDir::new()
        .map_err(|e| NarratorError::Conversion(format!("cannot create image directory: {}", e)))?;

    let images = rasterizer.rasterize(pdf_path, OCR_DPI, image_dir.path())?;

    let mut full_text = String::new();
    for (i, image) in images.iter().enumerate() {
        let page = i + 1;
        log::info!("Running OCR on page {}", page);
        let text = recognizer.recognize(image)?;
        if page == 1 {
            log::debug!("OCR text of page 1: {}", text);
        }
        full_text.push_str(&format!("\n\n[Page {}]\n{}", page, clean_text(&text)));
    }

    Ok(full_text)
}

/// Extracts the narration text of a PDF.
pub struct PageExtractor {
    paths: PathsConfig,
    ocr_strip_references: bool,
}

impl PageExtractor {
    pub fn new(paths: PathsConfig, ocr_strip_references: bool) -> Self {
        Self {
            paths,
            ocr_strip_references,
        }
    }

    /// Open `pdf_path` and return its cleaned full text.
    pub fn extract_full_text(&self, pdf_path: &Path) -> Result<String> {
        let source = LopdfSource::open(pdf_path)?;
        log::info!("Total pages: {}", source.page_count());

        match detect_mode(&source)? {
            ExtractionMode::DirectText => Ok(extract_direct(&source)),
            ExtractionMode::Ocr => {
                let tools = OcrTools::from_paths(&self.paths)?;
                let text = extract_ocr(pdf_path, &tools.rasterizer(), &tools.recognizer())?;
                Ok(self.finish_ocr_text(text))
            }
        }
    }

    fn finish_ocr_text(&self, text: String) -> String {
        if self.ocr_strip_references {
            strip_trailing_references(&text)
        } else {
            text
        }
    }
}
