pub mod classify;
pub mod config;
pub mod error;
pub mod extraction;
pub mod fields;
pub mod model;
pub mod relocate;
pub mod triage;

use config::ExtractionConfig;
use error::DocsortError;
use extraction::ocr::TesseractOcr;
use extraction::pdftotext::PdftotextExtractor;
use extraction::table::detect_tables;
use extraction::text::TextExtractor;
use fields::{detect_language, FieldExtractor};
use model::{DocumentMetadata, ExtractionResult};

/// Main API entry point: turn PDF bytes into text, tables, fields and a
/// language guess.
///
/// Extraction is pure given its input. The same bytes and page cap always
/// produce the same result.
pub struct DocumentExtractor {
    text: TextExtractor,
    fields: FieldExtractor,
}

impl DocumentExtractor {
    pub fn new(text: TextExtractor, fields: FieldExtractor) -> Self {
        DocumentExtractor { text, fields }
    }

    /// Poppler-backed extractor with tesseract OCR fallback when enabled.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self, DocsortError> {
        let mut text = TextExtractor::new(Box::new(PdftotextExtractor::new()))
            .with_min_page_chars(config.min_page_chars);
        if config.ocr_enabled {
            text = text.with_ocr(Box::new(TesseractOcr::new(
                config.ocr_languages.as_str(),
                config.ocr_dpi,
            )));
        }
        Ok(Self::new(text, FieldExtractor::new()?))
    }

    /// Extract at most `max_pages` pages (`None` or `Some(0)` for all).
    pub fn extract(
        &self,
        pdf_bytes: &[u8],
        filename: &str,
        max_pages: Option<usize>,
    ) -> Result<ExtractionResult, DocsortError> {
        let pages = self.text.extract(pdf_bytes, filename, max_pages)?;

        let raw_text = pages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let tables = detect_tables(&pages);
        let fields = self.fields.extract(&raw_text);
        let detected_language = detect_language(&raw_text).to_string();

        tracing::debug!(
            file = filename,
            backend = self.text.backend_name(),
            pages = pages.len(),
            tables = tables.len(),
            language = %detected_language,
            "document extracted"
        );

        Ok(ExtractionResult {
            metadata: DocumentMetadata {
                filename: filename.to_string(),
                pages_count: pages.len(),
                detected_language,
            },
            raw_text,
            pages,
            tables,
            key_values: fields.values,
            key_values_confidence: fields.confidence,
        })
    }
}
