use anyhow::Context;
use docsort_core::config::DocsortConfig;
use docsort_core::DocumentExtractor;
use std::path::PathBuf;

use crate::output;
use crate::OutputFormat;

/// Extract and classify one document. The file is not moved.
pub fn run(
    config: &DocsortConfig,
    pdf_file: PathBuf,
    criteria: &str,
    max_pages: Option<usize>,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    if criteria.trim().is_empty() {
        anyhow::bail!("criteria must not be empty");
    }

    let pdf_bytes =
        std::fs::read(&pdf_file).with_context(|| format!("reading {}", pdf_file.display()))?;
    let filename = pdf_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| pdf_file.display().to_string());

    let max_pages = max_pages.unwrap_or(config.triage.max_pages);
    let extractor = DocumentExtractor::from_config(&config.extraction)?;
    let extracted = extractor.extract(&pdf_bytes, &filename, Some(max_pages))?;
    if extracted.raw_text.trim().is_empty() {
        anyhow::bail!("no text could be extracted from {filename}");
    }

    let classification = super::classifier(config)?.classify(&extracted.raw_text, criteria)?;

    match output_format {
        OutputFormat::Json => output::json::print(&classification)?,
        OutputFormat::Table => {
            println!("{}", output::table::format_classification(&filename, &classification))
        }
    }

    Ok(())
}
