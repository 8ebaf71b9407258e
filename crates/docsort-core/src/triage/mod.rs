//! Batch triage: extract, classify and relocate every document in a folder.
//!
//! Files are processed one at a time in enumeration order. A failure in one
//! file, panics included, becomes that file's audit entry and never stops
//! the batch. Only an unusable source folder aborts the run, before any file
//! is touched.

pub mod audit;
pub mod scan;

use crate::classify::Classifier;
use crate::config::TriageConfig;
use crate::error::DocsortError;
use crate::model::{AuditEntry, BatchJob, TriageRequest};
use crate::relocate::relocate;
use crate::DocumentExtractor;
use chrono::Utc;
use std::any::Any;
use std::fs::{self, File};
use std::io::Read;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Audit label for a file whose processing panicked.
pub const INTERNAL_ERROR: &str = "InternalError";

pub struct TriageEngine {
    extractor: DocumentExtractor,
    classifier: Classifier,
    max_file_size: u64,
    memory_cleanup_interval: usize,
    stop: Arc<AtomicBool>,
}

impl TriageEngine {
    pub fn new(extractor: DocumentExtractor, classifier: Classifier) -> Self {
        Self::with_config(extractor, classifier, &TriageConfig::default())
    }

    pub fn with_config(
        extractor: DocumentExtractor,
        classifier: Classifier,
        config: &TriageConfig,
    ) -> Self {
        TriageEngine {
            extractor,
            classifier,
            max_file_size: config.max_file_size_bytes(),
            memory_cleanup_interval: config.memory_cleanup_interval.max(1),
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag that stops the running batch after the file in progress. Each
    /// run clears it when it starts.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn run(&self, request: TriageRequest) -> Result<BatchJob, DocsortError> {
        self.run_with_progress(request, |_, _, _| {})
    }

    /// Run the batch, calling `progress(done, total, entry)` after each file.
    pub fn run_with_progress(
        &self,
        request: TriageRequest,
        mut progress: impl FnMut(usize, usize, &AuditEntry),
    ) -> Result<BatchJob, DocsortError> {
        self.stop.store(false, Ordering::SeqCst);
        let files = scan::enumerate_documents(&request.source_folder)?;

        for target in [&request.target_relevant, &request.target_irrelevant] {
            if let Err(e) = fs::create_dir_all(target) {
                tracing::warn!(dir = %target.display(), error = %e, "cannot create target folder");
            }
        }

        let mut job = BatchJob::new(request);
        job.total_files = files.len();
        tracing::info!(
            source = %job.source_folder.display(),
            files = job.total_files,
            "starting triage"
        );

        let mut buffer = Vec::new();
        for (i, path) in files.iter().enumerate() {
            if self.stop.load(Ordering::SeqCst) {
                job.cancelled = true;
                tracing::warn!(processed = job.processed, total = job.total_files, "triage cancelled");
                break;
            }

            let filename = display_name(path);
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                self.process_file(path, &filename, &job, &mut buffer)
            }));
            let entry = match outcome {
                Ok(Ok(entry)) => entry,
                Ok(Err(e)) => AuditEntry::failed(&filename, Utc::now(), e.kind(), e.to_string()),
                Err(payload) => {
                    buffer = Vec::new();
                    AuditEntry::failed(&filename, Utc::now(), INTERNAL_ERROR, panic_message(&*payload))
                }
            };

            log_entry(&entry);
            progress(i + 1, job.total_files, &entry);
            job.record(entry);

            if job.processed % self.memory_cleanup_interval == 0 {
                buffer.clear();
                buffer.shrink_to_fit();
                tracing::debug!(processed = job.processed, "released file buffers");
            }
        }

        tracing::info!(
            processed = job.processed,
            relevant = job.relevant,
            irrelevant = job.irrelevant,
            errors = job.errors,
            "triage finished"
        );
        Ok(job)
    }

    fn process_file(
        &self,
        path: &Path,
        filename: &str,
        job: &BatchJob,
        buffer: &mut Vec<u8>,
    ) -> Result<AuditEntry, DocsortError> {
        let size = fs::metadata(path).map_err(|e| DocsortError::fs(path, e))?.len();
        if size > self.max_file_size {
            return Err(DocsortError::SizeLimitExceeded {
                size,
                limit: self.max_file_size,
            });
        }

        buffer.clear();
        File::open(path)
            .and_then(|mut f| f.read_to_end(buffer))
            .map_err(|e| DocsortError::fs(path, e))?;

        let max_pages = Some(job.max_pages).filter(|&n| n > 0);
        let extracted = self.extractor.extract(buffer, filename, max_pages)?;
        if extracted.raw_text.trim().is_empty() {
            return Err(DocsortError::EmptyDocument("no text could be extracted".into()));
        }
        tracing::debug!(
            file = filename,
            pages = extracted.metadata.pages_count,
            language = %extracted.metadata.detected_language,
            "extracted"
        );

        let classification = self.classifier.classify(&extracted.raw_text, &job.criteria)?;
        let target = if classification.is_relevant {
            &job.target_relevant
        } else {
            &job.target_irrelevant
        };
        let moved_to = relocate(path, target)?;

        Ok(AuditEntry::moved(
            filename,
            Utc::now(),
            classification.is_relevant,
            classification.reason,
            &moved_to,
        ))
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic during processing".to_string()
    }
}

fn log_entry(entry: &AuditEntry) {
    match &entry.error {
        Some(error) => tracing::error!(
            file = %entry.filename,
            kind = %entry.reason,
            %error,
            "file failed"
        ),
        None => tracing::info!(
            file = %entry.filename,
            decision = %entry.decision,
            moved_to = entry.moved_to.as_deref().unwrap_or(""),
            "file triaged"
        ),
    }
}
