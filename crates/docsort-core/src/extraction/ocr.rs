use crate::error::DocsortError;
use crate::extraction::OcrEngine;
use std::io::Write;
use std::path::Path;
use std::process::Command;

pub const DEFAULT_OCR_LANGUAGES: &str = "eng+swe";
pub const DEFAULT_OCR_DPI: u32 = 300;

/// OCR backend that rasterizes pages with `pdftoppm` and recognizes them with
/// the `tesseract` command line tool.
pub struct TesseractOcr {
    languages: String,
    dpi: u32,
}

impl TesseractOcr {
    pub fn new(languages: impl Into<String>, dpi: u32) -> Self {
        TesseractOcr {
            languages: languages.into(),
            dpi,
        }
    }

    /// Check if both pdftoppm and tesseract can be launched.
    pub fn is_available() -> bool {
        let launches = |tool: &str, arg: &str| {
            Command::new(tool)
                .arg(arg)
                .output()
                .map(|o| o.status.success() || !o.stderr.is_empty())
                .unwrap_or(false)
        };
        launches("pdftoppm", "-v") && launches("tesseract", "--version")
    }

    fn render_and_recognize(
        &self,
        pdf_path: &Path,
        work_dir: &Path,
        page_number: usize,
    ) -> Result<String, DocsortError> {
        let prefix = work_dir.join(format!("page-{page_number}"));
        let page = page_number.to_string();

        let render = Command::new("pdftoppm")
            .args(["-f", &page, "-l", &page])
            .arg("-r")
            .arg(self.dpi.to_string())
            .args(["-gray", "-png", "-singlefile"])
            .arg(pdf_path)
            .arg(&prefix)
            .output()
            .map_err(|e| tool_error("pdftoppm", page_number, e))?;
        if !render.status.success() {
            return Err(DocsortError::Ocr {
                page: page_number,
                reason: format!(
                    "pdftoppm: {}",
                    String::from_utf8_lossy(&render.stderr).trim()
                ),
            });
        }

        let image = prefix.with_extension("png");
        let recognize = Command::new("tesseract")
            .arg(&image)
            .arg("stdout")
            .arg("-l")
            .arg(&self.languages)
            .output()
            .map_err(|e| tool_error("tesseract", page_number, e))?;
        if !recognize.status.success() {
            return Err(DocsortError::Ocr {
                page: page_number,
                reason: format!(
                    "tesseract: {}",
                    String::from_utf8_lossy(&recognize.stderr).trim()
                ),
            });
        }

        Ok(String::from_utf8_lossy(&recognize.stdout)
            .trim_end()
            .to_string())
    }
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self::new(DEFAULT_OCR_LANGUAGES, DEFAULT_OCR_DPI)
    }
}

impl OcrEngine for TesseractOcr {
    fn ocr_page(&self, pdf_bytes: &[u8], page_number: usize) -> Result<String, DocsortError> {
        // The rendered image lives in a scratch directory removed on drop.
        let mut tmpfile =
            tempfile::NamedTempFile::new().map_err(|e| DocsortError::Extraction(e.to_string()))?;
        tmpfile
            .write_all(pdf_bytes)
            .map_err(|e| DocsortError::Extraction(e.to_string()))?;
        let work_dir = tempfile::tempdir().map_err(|e| DocsortError::Extraction(e.to_string()))?;

        tracing::debug!(page = page_number, dpi = self.dpi, "running OCR");
        self.render_and_recognize(tmpfile.path(), work_dir.path(), page_number)
    }

    fn engine_name(&self) -> &str {
        "tesseract"
    }
}

fn tool_error(tool: &'static str, page: usize, e: std::io::Error) -> DocsortError {
    if e.kind() == std::io::ErrorKind::NotFound {
        DocsortError::OcrToolNotFound(tool)
    } else {
        DocsortError::Ocr {
            page,
            reason: format!("{tool}: {e}"),
        }
    }
}
