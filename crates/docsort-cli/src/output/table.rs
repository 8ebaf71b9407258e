use docsort_core::classify::Classification;
use docsort_core::model::{BatchJob, ExtractionResult};
use std::fmt::Write;

const REASON_WIDTH: usize = 60;

pub fn format_batch(job: &BatchJob) -> String {
    let mut out = String::new();

    let status = if job.cancelled { " (cancelled)" } else { "" };
    writeln!(
        out,
        "=== Triage of {}{} ===\n",
        job.source_folder.display(),
        status
    )
    .ok();
    writeln!(out, "  Criteria:   {}", job.criteria).ok();
    writeln!(out, "  Processed:  {}/{}", job.processed, job.total_files).ok();
    writeln!(out, "  Relevant:   {}", job.relevant).ok();
    writeln!(out, "  Irrelevant: {}", job.irrelevant).ok();
    writeln!(out, "  Errors:     {}", job.errors).ok();

    if job.audit_log.is_empty() {
        return out;
    }
    writeln!(out).ok();

    let name_width = job
        .audit_log
        .iter()
        .map(|e| e.filename.chars().count())
        .max()
        .unwrap_or(8)
        .max("File".len());

    writeln!(out, "  {:<name_width$}  {:<10}  Detail", "File", "Decision").ok();
    for entry in &job.audit_log {
        let detail = match &entry.error {
            Some(error) => format!("{}: {}", entry.reason, error),
            None => entry.reason.clone(),
        };
        writeln!(
            out,
            "  {:<name_width$}  {:<10}  {}",
            entry.filename,
            entry.decision.to_string(),
            shorten(&detail, REASON_WIDTH)
        )
        .ok();
    }

    out
}

pub fn format_extraction(result: &ExtractionResult) -> String {
    let mut out = String::new();
    let meta = &result.metadata;

    writeln!(out, "=== {} ===\n", meta.filename).ok();
    writeln!(out, "  Pages:    {}", meta.pages_count).ok();
    writeln!(out, "  Language: {}", meta.detected_language).ok();
    writeln!(out, "  Tables:   {}\n", result.tables.len()).ok();

    let name_width = result.key_values.keys().map(|k| k.len()).max().unwrap_or(10);
    writeln!(out, "  Fields:").ok();
    for (name, value) in &result.key_values {
        let line = match value {
            Some(v) => format!("{v}  ({:.2})", result.confidence(name)),
            None => "-".to_string(),
        };
        writeln!(out, "    {:<name_width$}  {}", name, line).ok();
    }

    for (i, table) in result.tables.iter().enumerate() {
        writeln!(
            out,
            "\n  Table {} (page {}, {} rows)",
            i + 1,
            table.page_number,
            table.rows.len()
        )
        .ok();
        for row in &table.rows {
            writeln!(out, "    {}", row.join(" | ")).ok();
        }
    }

    out
}

pub fn format_classification(filename: &str, classification: &Classification) -> String {
    let verdict = if classification.is_relevant {
        "RELEVANT"
    } else {
        "IRRELEVANT"
    };
    format!("{filename}: {verdict}\n  {}", classification.reason)
}

fn shorten(text: &str, max_chars: usize) -> String {
    let single_line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() <= max_chars {
        return single_line;
    }
    let cut: String = single_line.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{cut}...")
}
