pub mod check;
pub mod classify;
pub mod extract;
pub mod triage;

use anyhow::Context;
use docsort_core::classify::{Classifier, OllamaClient};
use docsort_core::config::DocsortConfig;

use crate::GlobalArgs;

/// Config file values with command-line overrides applied.
pub fn load_config(global: &GlobalArgs) -> anyhow::Result<DocsortConfig> {
    let mut config = DocsortConfig::load_or_default(Some(&global.config))
        .with_context(|| format!("loading {}", global.config.display()))?;

    if let Some(url) = &global.ollama_url {
        config.ollama.base_url = url.clone();
    }
    if let Some(model) = &global.model {
        config.ollama.model = model.clone();
    }
    if global.no_ocr {
        config.extraction.ocr_enabled = false;
    }
    config.validate()?;
    tracing::debug!(
        config = %global.config.display(),
        ollama = %config.ollama.base_url,
        model = %config.ollama.model,
        ocr = config.extraction.ocr_enabled,
        "configuration loaded"
    );
    Ok(config)
}

pub fn ollama_client(config: &DocsortConfig) -> anyhow::Result<OllamaClient> {
    Ok(OllamaClient::new(
        &config.ollama.base_url,
        config.ollama.model.as_str(),
        config.ollama.timeout_secs,
    )?)
}

pub fn classifier(config: &DocsortConfig) -> anyhow::Result<Classifier> {
    Ok(Classifier::new(Box::new(ollama_client(config)?))
        .with_max_text_length(config.classification.max_text_length))
}
