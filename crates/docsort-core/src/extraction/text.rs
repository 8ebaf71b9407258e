use crate::error::DocsortError;
use crate::extraction::{OcrEngine, PdfExtractor};
use crate::model::Page;

/// Pages whose trimmed text is shorter than this are treated as image-only.
pub const DEFAULT_MIN_PAGE_CHARS: usize = 25;

/// Below this share of letters among visible characters, a text layer is
/// considered OCR garbage and every page is re-recognized.
const MIN_ALPHA_RATIO: f64 = 0.5;

/// Per-page text extraction with OCR fallback for image-only pages.
pub struct TextExtractor {
    pdf: Box<dyn PdfExtractor>,
    ocr: Option<Box<dyn OcrEngine>>,
    min_page_chars: usize,
}

impl TextExtractor {
    pub fn new(pdf: Box<dyn PdfExtractor>) -> Self {
        TextExtractor {
            pdf,
            ocr: None,
            min_page_chars: DEFAULT_MIN_PAGE_CHARS,
        }
    }

    pub fn with_ocr(mut self, ocr: Box<dyn OcrEngine>) -> Self {
        self.ocr = Some(ocr);
        self
    }

    pub fn with_min_page_chars(mut self, min_page_chars: usize) -> Self {
        self.min_page_chars = min_page_chars;
        self
    }

    pub fn backend_name(&self) -> &str {
        self.pdf.backend_name()
    }

    /// Extract page-indexed text, at most `max_pages` pages.
    pub fn extract(
        &self,
        pdf_bytes: &[u8],
        filename: &str,
        max_pages: Option<usize>,
    ) -> Result<Vec<Page>, DocsortError> {
        if pdf_bytes.is_empty() {
            return Err(DocsortError::EmptyDocument("0 bytes".into()));
        }

        let cap = max_pages.filter(|&n| n > 0);
        let mut pages = self.pdf.extract_pages(pdf_bytes, cap)?;
        if let Some(cap) = cap {
            pages.truncate(cap);
        }
        if pages.is_empty() {
            return Err(DocsortError::EmptyDocument("0 pages".into()));
        }

        let garbage_layer = looks_scanned(&pages);
        let needs_ocr: Vec<usize> = pages
            .iter()
            .filter(|p| garbage_layer || p.text.trim().chars().count() < self.min_page_chars)
            .map(|p| p.page_number)
            .collect();

        if needs_ocr.is_empty() {
            return Ok(pages);
        }

        let Some(ocr) = self.ocr.as_deref() else {
            tracing::warn!(
                file = filename,
                pages = ?needs_ocr,
                "image-only pages found but no OCR engine is configured"
            );
            return Ok(pages);
        };

        tracing::info!(
            file = filename,
            engine = ocr.engine_name(),
            pages = ?needs_ocr,
            "falling back to OCR"
        );
        let mut first_failure = None;
        for page_number in needs_ocr {
            let Some(page) = pages.iter_mut().find(|p| p.page_number == page_number) else {
                continue;
            };
            match ocr.ocr_page(pdf_bytes, page_number) {
                Ok(text) => page.text = text,
                // A garbage layer has no direct text worth keeping.
                Err(e) if garbage_layer => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        file = filename,
                        page = page_number,
                        error = %e,
                        "OCR failed, keeping direct text"
                    );
                    first_failure.get_or_insert(e);
                }
            }
        }

        if let Some(e) = first_failure {
            if pages.iter().all(|p| p.text.trim().is_empty()) {
                return Err(e);
            }
        }
        Ok(pages)
    }
}

/// True when the text layer carries too few letters to be real text.
fn looks_scanned(pages: &[Page]) -> bool {
    let mut visible = 0usize;
    let mut letters = 0usize;
    for c in pages.iter().flat_map(|p| p.text.chars()) {
        if c.is_whitespace() {
            continue;
        }
        visible += 1;
        if c.is_alphabetic() {
            letters += 1;
        }
    }
    // An empty layer is handled page by page.
    visible > 0 && (letters as f64) < (visible as f64) * MIN_ALPHA_RATIO
}
