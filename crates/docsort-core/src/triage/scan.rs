use crate::error::DocsortError;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const DOCUMENT_EXTENSION: &str = "pdf";

/// List the PDF files directly inside `folder`, sorted by file name.
///
/// The extension match ignores case, so `a.pdf` and `b.PDF` are both found.
/// On a case-sensitive filesystem `file.pdf` and `file.PDF` are distinct
/// files and both are returned; each path appears once.
pub fn enumerate_documents(folder: &Path) -> Result<Vec<PathBuf>, DocsortError> {
    let source_error = |reason: String| DocsortError::SourceFolder {
        path: folder.to_path_buf(),
        reason,
    };

    let metadata = fs::metadata(folder).map_err(|e| source_error(e.to_string()))?;
    if !metadata.is_dir() {
        return Err(source_error("not a directory".into()));
    }

    let mut seen = HashSet::new();
    let mut files = Vec::new();
    for entry in fs::read_dir(folder).map_err(|e| source_error(e.to_string()))? {
        let entry = entry.map_err(|e| source_error(e.to_string()))?;
        let path = entry.path();
        if !path.is_file() || !is_document(&path) {
            continue;
        }
        if seen.insert(path.clone()) {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

pub fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(DOCUMENT_EXTENSION))
}
