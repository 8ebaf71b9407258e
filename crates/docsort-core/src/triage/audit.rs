//! Tabular export of the audit trail.

use crate::error::DocsortError;
use crate::model::AuditEntry;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

pub const AUDIT_COLUMNS: [&str; 6] = ["Filename", "Timestamp", "Decision", "Reason", "Moved_To", "Error"];

/// Write `entries` as CSV, header included.
pub fn write_audit_csv<W: Write>(writer: W, entries: &[AuditEntry]) -> Result<(), DocsortError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(AUDIT_COLUMNS).map_err(csv_error)?;
    write_rows(&mut csv, entries)?;
    csv.flush()?;
    Ok(())
}

/// Append `entries` to the CSV file at `path`. The header is written only
/// when the file is new or empty; existing rows are never rewritten.
pub fn append_audit_csv(path: &Path, entries: &[AuditEntry]) -> Result<(), DocsortError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| DocsortError::fs(path, e))?;
    let is_new = file.metadata().map_err(|e| DocsortError::fs(path, e))?.len() == 0;

    let mut csv = csv::Writer::from_writer(file);
    if is_new {
        csv.write_record(AUDIT_COLUMNS).map_err(csv_error)?;
    }
    write_rows(&mut csv, entries)?;
    csv.flush().map_err(|e| DocsortError::fs(path, e))?;

    tracing::debug!(path = %path.display(), rows = entries.len(), "appended audit rows");
    Ok(())
}

fn write_rows<W: Write>(csv: &mut csv::Writer<W>, entries: &[AuditEntry]) -> Result<(), DocsortError> {
    for entry in entries {
        let timestamp = entry.timestamp.to_rfc3339();
        let decision = entry.decision.to_string();
        csv.write_record([
            entry.filename.as_str(),
            timestamp.as_str(),
            decision.as_str(),
            entry.reason.as_str(),
            entry.moved_to.as_deref().unwrap_or(""),
            entry.error.as_deref().unwrap_or(""),
        ])
        .map_err(csv_error)?;
    }
    Ok(())
}

fn csv_error(e: csv::Error) -> DocsortError {
    match e.into_kind() {
        csv::ErrorKind::Io(io) => DocsortError::Io(io),
        other => DocsortError::Config(format!("CSV serialization failed: {other:?}")),
    }
}
