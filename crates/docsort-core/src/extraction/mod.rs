pub mod ocr;
pub mod pdftotext;
pub mod table;
pub mod text;

use crate::error::DocsortError;
use crate::model::Page;

/// Trait for PDF text-layer extraction backends.
pub trait PdfExtractor: Send + Sync {
    /// Extract text content from PDF bytes, one `Page` per physical page in
    /// order, stopping after `max_pages` pages when a cap is given.
    ///
    /// Pages without a text layer are still returned, with empty text.
    fn extract_pages(
        &self,
        pdf_bytes: &[u8],
        max_pages: Option<usize>,
    ) -> Result<Vec<Page>, DocsortError>;

    /// Name of this extraction backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// Trait for OCR backends used on image-only pages.
pub trait OcrEngine: Send + Sync {
    /// Render one page (1-based) of the PDF to an image and recognize its text.
    fn ocr_page(&self, pdf_bytes: &[u8], page_number: usize) -> Result<String, DocsortError>;

    fn engine_name(&self) -> &str;
}
