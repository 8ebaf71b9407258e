use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum DocsortError {
    #[error("PDF extraction failed: {0}")]
    Extraction(String),

    #[error("document is encrypted. Provide an unencrypted version")]
    Encrypted,

    #[error("document is empty ({0})")]
    EmptyDocument(String),

    #[error("pdftotext not found. Install poppler: brew install poppler (macOS) or apt install poppler-utils (Linux)")]
    PdftotextNotFound,

    #[error("{tool} failed with exit code {code}: {stderr}")]
    PdftotextFailed {
        tool: &'static str,
        code: i32,
        stderr: String,
    },

    #[error("{0} not found. Install poppler-utils and tesseract-ocr to enable OCR fallback")]
    OcrToolNotFound(&'static str),

    #[error("OCR failed on page {page}: {reason}")]
    Ocr { page: usize, reason: String },

    #[error("classification response was not valid JSON after {attempts} attempts: {reason}")]
    ClassificationFormat { attempts: u32, reason: String },

    #[error("classification service unavailable: {0}")]
    ClassificationService(String),

    #[error("file system error at {path}: {reason}")]
    FileSystem { path: PathBuf, reason: String },

    #[error("file is {size} bytes, above the {limit} byte limit")]
    SizeLimitExceeded { size: u64, limit: u64 },

    #[error("source folder {path} is not readable: {reason}")]
    SourceFolder { path: PathBuf, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DocsortError {
    /// Taxonomy label recorded in the audit trail.
    pub fn kind(&self) -> &'static str {
        match self {
            DocsortError::Extraction(_)
            | DocsortError::Encrypted
            | DocsortError::EmptyDocument(_)
            | DocsortError::PdftotextNotFound
            | DocsortError::PdftotextFailed { .. }
            | DocsortError::OcrToolNotFound(_)
            | DocsortError::Ocr { .. } => "ExtractionError",
            DocsortError::ClassificationFormat { .. } => "ClassificationFormatError",
            DocsortError::ClassificationService(_) => "ClassificationServiceError",
            DocsortError::FileSystem { .. } | DocsortError::Io(_) => "FileSystemError",
            DocsortError::SizeLimitExceeded { .. } => "SizeLimitExceeded",
            DocsortError::SourceFolder { .. } => "SourceFolderError",
            DocsortError::Config(_) => "ConfigError",
        }
    }

    pub(crate) fn fs(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        DocsortError::FileSystem {
            path: path.into(),
            reason: err.to_string(),
        }
    }
}
