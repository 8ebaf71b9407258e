use crate::error::DocsortError;
use crate::extraction::PdfExtractor;
use crate::model::Page;
use std::io::Write;
use std::path::Path;
use std::process::Command;

/// PDF extraction backend using pdftotext and pdfinfo (from poppler-utils).
///
/// Uses `pdftotext -layout` to preserve whitespace alignment of tables, and
/// `-f`/`-l` so that only the requested leading pages are ever decoded.
pub struct PdftotextExtractor;

impl PdftotextExtractor {
    pub fn new() -> Self {
        PdftotextExtractor
    }

    /// Check if pdftotext is available on the system.
    pub fn is_available() -> bool {
        Command::new("pdftotext")
            .arg("-v")
            .output()
            .map(|o| o.status.success() || !o.stderr.is_empty())
            .unwrap_or(false)
    }
}

impl Default for PdftotextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfExtractor for PdftotextExtractor {
    fn extract_pages(
        &self,
        pdf_bytes: &[u8],
        max_pages: Option<usize>,
    ) -> Result<Vec<Page>, DocsortError> {
        // Write PDF bytes to a temp file
        let mut tmpfile =
            tempfile::NamedTempFile::new().map_err(|e| DocsortError::Extraction(e.to_string()))?;
        tmpfile
            .write_all(pdf_bytes)
            .map_err(|e| DocsortError::Extraction(e.to_string()))?;
        let tmp_path = tmpfile.path().to_path_buf();

        let info = read_pdf_info(&tmp_path)?;
        if info.encrypted {
            return Err(DocsortError::Encrypted);
        }
        if info.pages == 0 {
            return Err(DocsortError::EmptyDocument("0 pages".into()));
        }

        let last_page = match max_pages {
            Some(cap) if cap > 0 => cap.min(info.pages),
            _ => info.pages,
        };

        let output = Command::new("pdftotext")
            .arg("-layout")
            .arg("-enc")
            .arg("UTF-8")
            .arg("-f")
            .arg("1")
            .arg("-l")
            .arg(last_page.to_string())
            .arg(&tmp_path)
            .arg("-") // output to stdout
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    DocsortError::PdftotextNotFound
                } else {
                    DocsortError::Extraction(format!("pdftotext failed: {}", e))
                }
            })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(DocsortError::PdftotextFailed {
                tool: "pdftotext",
                code,
                stderr,
            });
        }

        let text = String::from_utf8_lossy(&output.stdout);
        Ok(split_pages(&text, last_page))
    }

    fn backend_name(&self) -> &str {
        "pdftotext"
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PdfInfo {
    pages: usize,
    encrypted: bool,
}

fn read_pdf_info(pdf_path: &Path) -> Result<PdfInfo, DocsortError> {
    let output = Command::new("pdfinfo")
        .arg(pdf_path)
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DocsortError::PdftotextNotFound
            } else {
                DocsortError::Extraction(format!("pdfinfo failed: {}", e))
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        // A user password makes poppler refuse to open the file at all.
        if stderr.to_lowercase().contains("password") {
            return Err(DocsortError::Encrypted);
        }
        let code = output.status.code().unwrap_or(-1);
        return Err(DocsortError::PdftotextFailed {
            tool: "pdfinfo",
            code,
            stderr,
        });
    }

    parse_pdf_info(&String::from_utf8_lossy(&output.stdout))
}

fn parse_pdf_info(stdout: &str) -> Result<PdfInfo, DocsortError> {
    let mut pages = None;
    let mut encrypted = false;

    for line in stdout.lines() {
        if let Some(value) = line.strip_prefix("Pages:") {
            pages = value.trim().parse::<usize>().ok();
        } else if let Some(value) = line.strip_prefix("Encrypted:") {
            encrypted = value.trim().starts_with("yes");
        }
    }

    let pages = pages.ok_or_else(|| {
        DocsortError::Extraction("pdfinfo output has no page count".into())
    })?;
    Ok(PdfInfo { pages, encrypted })
}

/// Split pdftotext output into pages. pdftotext terminates every page with a
/// form feed, so blank (image-only) pages survive as empty strings.
fn split_pages(text: &str, page_count: usize) -> Vec<Page> {
    let mut chunks = text.split('\x0c');
    (1..=page_count)
        .map(|page_number| Page {
            page_number,
            text: chunks
                .next()
                .unwrap_or_default()
                .trim_end_matches('\n')
                .to_string(),
        })
        .collect()
}
