//! OCR fallback for image-based PDFs: poppler's `pdftoppm` renders pages,
//! `tesseract` recognizes their text.

use crate::config::PathsConfig;
use crate::error::{NarratorError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Resolution used when rendering pages for OCR.
pub const OCR_DPI: u32 = 300;

/// Renders every page of a PDF to an image file.
pub trait PageRasterizer {
    /// Write one image per page into `out_dir`, returned in page order.
    fn rasterize(&self, pdf_path: &Path, dpi: u32, out_dir: &Path) -> Result<Vec<PathBuf>>;
}

/// Recognizes plain text in a page image.
pub trait TextRecognizer {
    fn recognize(&self, image: &Path) -> Result<String>;
}

/// Rasterizer backed by poppler's `pdftoppm`.
pub struct PdftoppmRasterizer {
    executable: PathBuf,
}

impl PdftoppmRasterizer {
    pub fn new(poppler_bin: &Path) -> Self {
        Self {
            executable: poppler_bin.join(format!("pdftoppm{}", std::env::consts::EXE_SUFFIX)),
        }
    }
}

static PAGE_IMAGE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-(\d+)\.png$").expect("page image pattern should compile"));

/// Page number from a `pdftoppm` output name such as `page-07.png`.
fn page_image_number(name: &str) -> Option<u32> {
    PAGE_IMAGE_NUMBER
        .captures(name)
        .and_then(|c| c[1].parse().ok())
}

impl PageRasterizer for PdftoppmRasterizer {
    fn rasterize(&self, pdf_path: &Path, dpi: u32, out_dir: &Path) -> Result<Vec<PathBuf>> {
        let output = Command::new(&self.executable)
            .args(["-r", &dpi.to_string(), "-png"])
            .arg(pdf_path)
            .arg(out_dir.join("page"))
            .output()
            .map_err(|e| {
                NarratorError::Conversion(format!(
                    "failed to run {}: {}",
                    self.executable.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(NarratorError::Conversion(format!(
                "pdftoppm failed ({}): {}",
                output.status,
                stderr.trim()
            )));
        }

        let mut pages: Vec<(u32, PathBuf)> = std::fs::read_dir(out_dir)
            .map_err(|e| NarratorError::Conversion(format!("cannot list page images: {}", e)))?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name();
                page_image_number(&name.to_string_lossy()).map(|n| (n, entry.path()))
            })
            .collect();
        pages.sort_by_key(|(n, _)| *n);

        if pages.is_empty() {
            return Err(NarratorError::Conversion(
                "pdftoppm produced no page images".to_string(),
            ));
        }

        Ok(pages.into_iter().map(|(_, path)| path).collect())
    }
}

/// Recognizer backed by the `tesseract` CLI.
pub struct TesseractRecognizer {
    executable: PathBuf,
}

impl TesseractRecognizer {
    pub fn new(executable: &Path) -> Self {
        Self {
            executable: executable.to_path_buf(),
        }
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, image: &Path) -> Result<String> {
        let output = Command::new(&self.executable)
            .arg(image)
            .arg("stdout")
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(NarratorError::Conversion(format!(
                "tesseract failed on {}: {}",
                image.display(),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Validated OCR tool locations.
#[derive(Debug, Clone)]
pub struct OcrTools {
    pub tesseract: PathBuf,
    pub poppler_bin: PathBuf,
}

impl OcrTools {
    /// Check that both OCR tools are configured and present.
    pub fn from_paths(paths: &PathsConfig) -> Result<Self> {
        let tesseract = require_path(paths.tesseract_path.as_deref(), "tesseract_path")?;
        if !tesseract.is_file() {
            return Err(NarratorError::Configuration(format!(
                "tesseract_path is set to '{}', but that file does not exist",
                tesseract.display()
            )));
        }

        let poppler_bin = require_path(paths.poppler_bin.as_deref(), "poppler_bin")?;
        if !poppler_bin.is_dir() {
            return Err(NarratorError::Configuration(format!(
                "poppler_bin is set to '{}', but that directory does not exist",
                poppler_bin.display()
            )));
        }

        Ok(Self {
            tesseract,
            poppler_bin,
        })
    }

    pub fn rasterizer(&self) -> PdftoppmRasterizer {
        PdftoppmRasterizer::new(&self.poppler_bin)
    }

    pub fn recognizer(&self) -> TesseractRecognizer {
        TesseractRecognizer::new(&self.tesseract)
    }
}

/// A configured, non-blank path or a configuration error naming the key.
pub(crate) fn require_path(value: Option<&Path>, key: &str) -> Result<PathBuf> {
    match value {
        Some(path) if !path.as_os_str().to_string_lossy().trim().is_empty() => {
            Ok(path.to_path_buf())
        }
        _ => Err(NarratorError::Configuration(format!(
            "{} is not configured in [paths]; it is required to read scanned PDFs",
            key
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_page_image_number() {
        assert_eq!(page_image_number("page-1.png"), Some(1));
        assert_eq!(page_image_number("page-012.png"), Some(12));
        assert_eq!(page_image_number("page.png"), None);
        assert_eq!(page_image_number("page-3.ppm"), None);
    }

    #[test]
    fn test_missing_tesseract_is_configuration_error() {
        let paths = PathsConfig::default();
        let err = OcrTools::from_paths(&paths).unwrap_err();
        assert!(matches!(err, NarratorError::Configuration(ref m) if m.contains("tesseract_path")));
    }

    #[test]
    fn test_blank_path_is_configuration_error() {
        let paths = PathsConfig {
            tesseract_path: Some(PathBuf::from("   ")),
            ..Default::default()
        };
        let err = OcrTools::from_paths(&paths).unwrap_err();
        assert!(matches!(err, NarratorError::Configuration(_)));
    }

    #[test]
    fn test_missing_poppler_is_configuration_error() {
        let temp_dir = TempDir::new().unwrap();
        let tesseract = temp_dir.path().join("tesseract");
        std::fs::write(&tesseract, "").unwrap();

        let paths = PathsConfig {
            tesseract_path: Some(tesseract),
            ..Default::default()
        };
        let err = OcrTools::from_paths(&paths).unwrap_err();
        assert!(matches!(err, NarratorError::Configuration(ref m) if m.contains("poppler_bin")));
    }

    #[test]
    fn test_nonexistent_tesseract_is_configuration_error() {
        let temp_dir = TempDir::new().unwrap();
        let paths = PathsConfig {
            tesseract_path: Some(temp_dir.path().join("no-such-binary")),
            poppler_bin: Some(temp_dir.path().to_path_buf()),
            ..Default::default()
        };
        let err = OcrTools::from_paths(&paths).unwrap_err();
        assert!(matches!(err, NarratorError::Configuration(ref m) if m.contains("does not exist")));
    }

    #[test]
    fn test_valid_tools() {
        let temp_dir = TempDir::new().unwrap();
        let tesseract = temp_dir.path().join("tesseract");
        std::fs::write(&tesseract, "").unwrap();

        let paths = PathsConfig {
            tesseract_path: Some(tesseract.clone()),
            poppler_bin: Some(temp_dir.path().to_path_buf()),
            ..Default::default()
        };
        let tools = OcrTools::from_paths(&paths).unwrap();
        assert_eq!(tools.tesseract, tesseract);
        assert!(
            tools
                .rasterizer()
                .executable
                .starts_with(temp_dir.path())
        );
    }

    #[test]
    fn test_rasterizer_failure_is_conversion_error() {
        let temp_dir = TempDir::new().unwrap();
        let rasterizer = PdftoppmRasterizer::new(&temp_dir.path().join("no-poppler-here"));
        let err = rasterizer
            .rasterize(Path::new("doc.pdf"), OCR_DPI, temp_dir.path())
            .unwrap_err();
        assert!(matches!(err, NarratorError::Conversion(_)));
    }
}
