use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Text of one processed page. `page_number` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub page_number: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Page on which the table starts.
    pub page_number: usize,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub filename: String,
    /// Pages actually processed, which is below the source page count when a cap applies.
    pub pages_count: usize,
    pub detected_language: String,
}

/// Everything extracted from one document.
///
/// Every key of `key_values_confidence` is also present in `key_values`,
/// and every confidence lies in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub raw_text: String,
    pub pages: Vec<Page>,
    pub tables: Vec<Table>,
    pub key_values: BTreeMap<String, Option<String>>,
    pub key_values_confidence: BTreeMap<String, f64>,
    pub metadata: DocumentMetadata,
}

impl ExtractionResult {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.key_values.get(name).and_then(|v| v.as_deref())
    }

    pub fn confidence(&self, name: &str) -> f64 {
        self.key_values_confidence.get(name).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Relevant,
    Irrelevant,
    Error,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Relevant => write!(f, "relevant"),
            Decision::Irrelevant => write!(f, "irrelevant"),
            Decision::Error => write!(f, "error"),
        }
    }
}

/// Outcome of triaging a single file. Construct through [`AuditEntry::moved`]
/// or [`AuditEntry::failed`] so that `moved_to` and `error` stay exclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub filename: String,
    pub timestamp: DateTime<Utc>,
    pub decision: Decision,
    pub reason: String,
    pub moved_to: Option<String>,
    pub error: Option<String>,
}

impl AuditEntry {
    pub fn moved(
        filename: impl Into<String>,
        timestamp: DateTime<Utc>,
        is_relevant: bool,
        reason: impl Into<String>,
        moved_to: &std::path::Path,
    ) -> Self {
        AuditEntry {
            filename: filename.into(),
            timestamp,
            decision: if is_relevant {
                Decision::Relevant
            } else {
                Decision::Irrelevant
            },
            reason: reason.into(),
            moved_to: Some(moved_to.display().to_string()),
            error: None,
        }
    }

    pub fn failed(
        filename: impl Into<String>,
        timestamp: DateTime<Utc>,
        kind: &str,
        error: impl Into<String>,
    ) -> Self {
        let error = error.into();
        AuditEntry {
            filename: filename.into(),
            timestamp,
            decision: Decision::Error,
            reason: kind.to_string(),
            moved_to: None,
            error: Some(error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.decision == Decision::Error
    }
}

/// Caller-supplied parameters of one triage run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageRequest {
    pub source_folder: PathBuf,
    pub target_relevant: PathBuf,
    pub target_irrelevant: PathBuf,
    pub criteria: String,
    pub max_pages: usize,
}

/// State and result of one triage run. `audit_log.len() == processed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchJob {
    pub source_folder: PathBuf,
    pub target_relevant: PathBuf,
    pub target_irrelevant: PathBuf,
    pub criteria: String,
    pub max_pages: usize,
    pub total_files: usize,
    pub processed: usize,
    pub relevant: usize,
    pub irrelevant: usize,
    pub errors: usize,
    /// True when the run was stopped before every file was processed.
    #[serde(default)]
    pub cancelled: bool,
    pub audit_log: Vec<AuditEntry>,
}

impl BatchJob {
    pub fn new(request: TriageRequest) -> Self {
        BatchJob {
            source_folder: request.source_folder,
            target_relevant: request.target_relevant,
            target_irrelevant: request.target_irrelevant,
            criteria: request.criteria,
            max_pages: request.max_pages,
            total_files: 0,
            processed: 0,
            relevant: 0,
            irrelevant: 0,
            errors: 0,
            cancelled: false,
            audit_log: Vec::new(),
        }
    }

    /// Append an entry and bump the matching counter.
    pub fn record(&mut self, entry: AuditEntry) {
        match entry.decision {
            Decision::Relevant => self.relevant += 1,
            Decision::Irrelevant => self.irrelevant += 1,
            Decision::Error => self.errors += 1,
        }
        self.processed += 1;
        self.audit_log.push(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn job() -> BatchJob {
        BatchJob::new(TriageRequest {
            source_folder: "in".into(),
            target_relevant: "yes".into(),
            target_irrelevant: "no".into(),
            criteria: "invoices".into(),
            max_pages: 5,
        })
    }

    #[test]
    fn test_record_keeps_counters_and_log_in_step() {
        let mut job = job();
        let now = Utc::now();
        job.record(AuditEntry::moved("a.pdf", now, true, "match", Path::new("yes/a.pdf")));
        job.record(AuditEntry::moved("b.pdf", now, false, "no match", Path::new("no/b.pdf")));
        job.record(AuditEntry::failed("c.pdf", now, "ExtractionError", "encrypted"));

        assert_eq!(job.processed, 3);
        assert_eq!(job.audit_log.len(), job.processed);
        assert_eq!((job.relevant, job.irrelevant, job.errors), (1, 1, 1));
        assert_eq!(job.audit_log[2].filename, "c.pdf");
    }

    #[test]
    fn test_failed_entry_has_no_destination() {
        let e = AuditEntry::failed("x.pdf", Utc::now(), "SizeLimitExceeded", "too big");
        assert!(e.is_error());
        assert!(e.moved_to.is_none());
        assert_eq!(e.error.as_deref(), Some("too big"));
    }

    #[test]
    fn test_decision_serializes_lowercase() {
        let json = serde_json::to_string(&Decision::Irrelevant).unwrap();
        assert_eq!(json, "\"irrelevant\"");
    }
}
