//! Configuration file parsing.
//!
//! Every setting has a default, so an absent file or section is valid.
//! Command-line flags are applied on top by the caller.

use crate::classify::ollama::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};
use crate::classify::DEFAULT_MAX_TEXT_LENGTH;
use crate::error::DocsortError;
use crate::extraction::ocr::{DEFAULT_OCR_DPI, DEFAULT_OCR_LANGUAGES};
use crate::extraction::text::DEFAULT_MIN_PAGE_CHARS;
use serde::Deserialize;
use std::path::Path;

/// Default per-document page cap for triage runs.
pub const DEFAULT_MAX_PAGES: usize = 5;
pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 50;
pub const DEFAULT_MEMORY_CLEANUP_INTERVAL: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DocsortConfig {
    pub ollama: OllamaConfig,
    pub extraction: ExtractionConfig,
    pub classification: ClassificationConfig,
    pub triage: TriageConfig,
}

/// Inference service connection
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        OllamaConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractionConfig {
    /// Pages with less text than this are sent to OCR.
    pub min_page_chars: usize,
    /// Tesseract language list, e.g. "eng+swe".
    pub ocr_languages: String,
    pub ocr_dpi: u32,
    /// Set to false to keep whatever text layer the PDF has.
    pub ocr_enabled: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        ExtractionConfig {
            min_page_chars: DEFAULT_MIN_PAGE_CHARS,
            ocr_languages: DEFAULT_OCR_LANGUAGES.to_string(),
            ocr_dpi: DEFAULT_OCR_DPI,
            ocr_enabled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClassificationConfig {
    /// Characters of document text sent with each request.
    pub max_text_length: usize,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        ClassificationConfig {
            max_text_length: DEFAULT_MAX_TEXT_LENGTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TriageConfig {
    pub max_file_size_mb: u64,
    pub memory_cleanup_interval: usize,
    /// 0 means no cap.
    pub max_pages: usize,
}

impl Default for TriageConfig {
    fn default() -> Self {
        TriageConfig {
            max_file_size_mb: DEFAULT_MAX_FILE_SIZE_MB,
            memory_cleanup_interval: DEFAULT_MEMORY_CLEANUP_INTERVAL,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

impl TriageConfig {
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }
}

impl DocsortConfig {
    /// Load and validate a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DocsortError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            DocsortError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&contents)
    }

    /// Load `path` when it exists, defaults otherwise.
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self, DocsortError> {
        match path {
            Some(p) if p.as_ref().exists() => Self::from_file(p),
            Some(p) => {
                tracing::debug!(path = %p.as_ref().display(), "config file not found, using defaults");
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_toml(contents: &str) -> Result<Self, DocsortError> {
        let config: DocsortConfig =
            toml::from_str(contents).map_err(|e| DocsortError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DocsortError> {
        if !self.ollama.base_url.starts_with("http://") && !self.ollama.base_url.starts_with("https://") {
            return Err(DocsortError::Config(format!(
                "ollama.base_url must be an http(s) URL, got '{}'",
                self.ollama.base_url
            )));
        }
        if self.ollama.model.trim().is_empty() {
            return Err(DocsortError::Config("ollama.model is empty".into()));
        }
        if self.ollama.timeout_secs == 0 {
            return Err(DocsortError::Config("ollama.timeout_secs must be positive".into()));
        }
        if self.extraction.ocr_dpi < 72 || self.extraction.ocr_dpi > 1200 {
            return Err(DocsortError::Config(format!(
                "extraction.ocr_dpi must be between 72 and 1200, got {}",
                self.extraction.ocr_dpi
            )));
        }
        if self.extraction.ocr_languages.trim().is_empty() {
            return Err(DocsortError::Config("extraction.ocr_languages is empty".into()));
        }
        if self.classification.max_text_length == 0 {
            return Err(DocsortError::Config(
                "classification.max_text_length must be positive".into(),
            ));
        }
        if self.triage.max_file_size_mb == 0 {
            return Err(DocsortError::Config("triage.max_file_size_mb must be positive".into()));
        }
        if self.triage.memory_cleanup_interval == 0 {
            return Err(DocsortError::Config(
                "triage.memory_cleanup_interval must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DocsortConfig::default();
        assert_eq!(config.ollama.base_url, "http://localhost:11434");
        assert_eq!(config.classification.max_text_length, 3000);
        assert_eq!(config.triage.max_pages, 5);
        assert_eq!(config.triage.max_file_size_bytes(), 50 * 1024 * 1024);
        assert_eq!(config.triage.memory_cleanup_interval, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_toml() {
        let toml = r#"
            [ollama]
            model = "mistral"

            [triage]
            max_pages = 0
        "#;
        let config = DocsortConfig::from_toml(toml).unwrap();
        assert_eq!(config.ollama.model, "mistral");
        assert_eq!(config.ollama.timeout_secs, 60);
        assert_eq!(config.triage.max_pages, 0);
        assert_eq!(config.extraction, ExtractionConfig::default());
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(DocsortConfig::from_toml("").unwrap(), DocsortConfig::default());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = DocsortConfig::from_toml("[triage]\nmax_page = 3").unwrap_err();
        assert_eq!(err.kind(), "ConfigError");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = DocsortConfig::default();
        config.ollama.base_url = "localhost:11434".into();
        assert!(config.validate().is_err());

        let mut config = DocsortConfig::default();
        config.triage.memory_cleanup_interval = 0;
        assert!(config.validate().is_err());

        let mut config = DocsortConfig::default();
        config.extraction.ocr_dpi = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = DocsortConfig::load_or_default(Some(dir.path().join("docsort.toml"))).unwrap();
        assert_eq!(config, DocsortConfig::default());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docsort.toml");
        std::fs::write(&path, "[classification]\nmax_text_length = 1200\n").unwrap();
        let config = DocsortConfig::from_file(&path).unwrap();
        assert_eq!(config.classification.max_text_length, 1200);
    }
}
