use anyhow::Context;
use docsort_core::config::DocsortConfig;
use docsort_core::DocumentExtractor;
use std::path::PathBuf;

use crate::output;
use crate::OutputFormat;

pub fn run(
    config: &DocsortConfig,
    pdf_file: PathBuf,
    max_pages: usize,
    output_format: OutputFormat,
    output_file: Option<PathBuf>,
) -> anyhow::Result<()> {
    let pdf_bytes =
        std::fs::read(&pdf_file).with_context(|| format!("reading {}", pdf_file.display()))?;
    let filename = pdf_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| pdf_file.display().to_string());

    let extractor = DocumentExtractor::from_config(&config.extraction)?;
    let result = extractor.extract(&pdf_bytes, &filename, Some(max_pages))?;

    match output_file {
        Some(path) => {
            // Files always get JSON
            let json = serde_json::to_string_pretty(&result)?;
            std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
            let found = result.key_values.values().filter(|v| v.is_some()).count();
            eprintln!(
                "Extracted {} page(s), {} table(s), {}/{} field(s), written to {}",
                result.metadata.pages_count,
                result.tables.len(),
                found,
                result.key_values.len(),
                path.display()
            );
        }
        None => match output_format {
            OutputFormat::Json => output::json::print(&result)?,
            OutputFormat::Table => println!("{}", output::table::format_extraction(&result)),
        },
    }

    Ok(())
}
