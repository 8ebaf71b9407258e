use anyhow::Context;
use docsort_core::config::DocsortConfig;
use docsort_core::model::TriageRequest;
use docsort_core::triage::audit::append_audit_csv;
use docsort_core::triage::TriageEngine;
use docsort_core::DocumentExtractor;
use std::path::PathBuf;
use std::sync::atomic::Ordering;

use crate::output;
use crate::OutputFormat;

pub struct TriageArgs {
    pub source: PathBuf,
    pub relevant: PathBuf,
    pub irrelevant: PathBuf,
    pub criteria: String,
    pub max_pages: Option<usize>,
    pub audit_csv: Option<PathBuf>,
}

pub fn run(config: &DocsortConfig, args: TriageArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    if args.criteria.trim().is_empty() {
        anyhow::bail!("criteria must not be empty");
    }

    let extractor = DocumentExtractor::from_config(&config.extraction)?;
    let engine = TriageEngine::with_config(extractor, super::classifier(config)?, &config.triage);

    let stop = engine.stop_handle();
    if let Err(e) = ctrlc::set_handler(move || {
        stop.store(true, Ordering::SeqCst);
        eprintln!("Interrupted, stopping after the current file");
    }) {
        tracing::warn!(error = %e, "cannot install Ctrl-C handler");
    }

    let request = TriageRequest {
        source_folder: args.source,
        target_relevant: args.relevant,
        target_irrelevant: args.irrelevant,
        criteria: args.criteria,
        max_pages: args.max_pages.unwrap_or(config.triage.max_pages),
    };

    let job = engine.run_with_progress(request, |done, total, entry| {
        eprintln!("[{done}/{total}] {} -> {}", entry.filename, entry.decision);
    })?;

    if let Some(path) = &args.audit_csv {
        append_audit_csv(path, &job.audit_log)
            .with_context(|| format!("writing audit log to {}", path.display()))?;
        eprintln!("Audit log appended to {}", path.display());
    }

    if job.cancelled {
        eprintln!(
            "Stopped early: {} of {} file(s) processed",
            job.processed, job.total_files
        );
    }

    match output_format {
        OutputFormat::Json => output::json::print(&job)?,
        OutputFormat::Table => println!("{}", output::table::format_batch(&job)),
    }

    Ok(())
}
