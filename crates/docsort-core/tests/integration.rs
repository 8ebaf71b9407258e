//! Integration tests for document extraction and batch triage.
//!
//! Uses a MockExtractor that treats the "PDF" bytes as form-feed separated
//! page text, and scripted OCR and LLM clients, so these tests run without
//! poppler, tesseract or an inference service.

use docsort_core::classify::{Classifier, LlmClient};
use docsort_core::config::TriageConfig;
use docsort_core::error::DocsortError;
use docsort_core::extraction::text::TextExtractor;
use docsort_core::extraction::{OcrEngine, PdfExtractor};
use docsort_core::fields::FieldExtractor;
use docsort_core::model::{Decision, Page, TriageRequest};
use docsort_core::triage::audit::append_audit_csv;
use docsort_core::triage::TriageEngine;
use docsort_core::DocumentExtractor;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;

struct MockExtractor;

impl PdfExtractor for MockExtractor {
    fn extract_pages(
        &self,
        pdf_bytes: &[u8],
        max_pages: Option<usize>,
    ) -> Result<Vec<Page>, DocsortError> {
        let text = String::from_utf8_lossy(pdf_bytes);
        if text.starts_with("CORRUPT") {
            return Err(DocsortError::Extraction("xref table not found".into()));
        }
        if text.starts_with("ENCRYPTED") {
            return Err(DocsortError::Encrypted);
        }
        if text.starts_with("PANIC") {
            panic!("decoder state corrupted");
        }
        Ok(text
            .split('\x0c')
            .take(max_pages.unwrap_or(usize::MAX))
            .enumerate()
            .map(|(i, t)| Page {
                page_number: i + 1,
                text: t.to_string(),
            })
            .collect())
    }

    fn backend_name(&self) -> &str {
        "mock"
    }
}

struct MockOcr;

impl OcrEngine for MockOcr {
    fn ocr_page(&self, _pdf_bytes: &[u8], _page_number: usize) -> Result<String, DocsortError> {
        Ok("Faktura från leverantören\nAtt betala: 450,00 kr\nTack för att du handlar hos oss".into())
    }

    fn engine_name(&self) -> &str {
        "mock-ocr"
    }
}

/// Relevant when the document excerpt mentions `keyword`.
struct KeywordLlm {
    keyword: &'static str,
}

impl LlmClient for KeywordLlm {
    fn generate(&self, _system: &str, prompt: &str) -> Result<String, DocsortError> {
        let excerpt = prompt
            .split("Document text (excerpt):")
            .nth(1)
            .unwrap_or_default()
            .to_lowercase();
        let reply = if excerpt.contains(self.keyword) {
            format!(r#"{{"is_relevant": true, "reason": "The document mentions {}"}}"#, self.keyword)
        } else {
            format!(r#"{{"is_relevant": false, "reason": "No mention of {}"}}"#, self.keyword)
        };
        Ok(reply)
    }

    fn list_models(&self) -> Result<Vec<String>, DocsortError> {
        Ok(vec!["keyword".into()])
    }
}

struct DownLlm;

impl LlmClient for DownLlm {
    fn generate(&self, _system: &str, _prompt: &str) -> Result<String, DocsortError> {
        Err(DocsortError::ClassificationService(
            "cannot reach inference service at http://localhost:11434".into(),
        ))
    }

    fn list_models(&self) -> Result<Vec<String>, DocsortError> {
        Err(DocsortError::ClassificationService("down".into()))
    }
}

fn extractor() -> DocumentExtractor {
    DocumentExtractor::new(
        TextExtractor::new(Box::new(MockExtractor)).with_ocr(Box::new(MockOcr)),
        FieldExtractor::new().unwrap(),
    )
}

fn engine(keyword: &'static str) -> TriageEngine {
    TriageEngine::new(extractor(), Classifier::new(Box::new(KeywordLlm { keyword })))
}

fn request(root: &Path, criteria: &str) -> TriageRequest {
    TriageRequest {
        source_folder: root.join("inbox"),
        target_relevant: root.join("relevant"),
        target_irrelevant: root.join("irrelevant"),
        criteria: criteria.into(),
        max_pages: 5,
    }
}

fn inbox(root: &Path, files: &[(&str, &str)]) -> PathBuf {
    let dir = root.join("inbox");
    fs::create_dir_all(&dir).unwrap();
    for (name, contents) in files {
        fs::write(dir.join(name), contents).unwrap();
    }
    dir
}

const INVOICE: &str = "\
Acme Consulting AB
Invoice number: 2024-001
Invoice date: 2024-01-05
Customer: Globex AB

  Description        Qty      Amount
  Consulting         10       960,40
  Travel             1        240,10
Total: 1 200,50 SEK
";

const BANKRUPTCY: &str = "\
Notice to creditors
The district court has opened bankruptcy proceedings against Nordic Widgets AB.
Claims must be filed with the trustee before 2024-06-30.
";

const NEWSLETTER: &str = "\
Spring newsletter
Our garden club meets every Thursday. Bring seeds and good spirits.
";

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

#[test]
fn native_invoice_total_and_currency() {
    let result = extractor()
        .extract(INVOICE.as_bytes(), "invoice.pdf", None)
        .unwrap();

    assert_eq!(result.field("total_amount"), Some("1200.50"));
    assert_eq!(result.field("currency"), Some("SEK"));
    assert!(result.confidence("total_amount") > 0.5);
    assert_eq!(result.field("invoice_number"), Some("2024-001"));
    assert_eq!(result.field("invoice_date"), Some("2024-01-05"));
    assert_eq!(result.metadata.pages_count, 1);
    assert_eq!(result.metadata.detected_language, "en");
    assert_eq!(result.tables.len(), 1);
    assert_eq!(result.tables[0].rows[1], vec!["Consulting", "10", "960,40"]);
}

#[test]
fn scanned_page_falls_back_to_ocr() {
    let result = extractor().extract(b" \n ", "scan.pdf", None).unwrap();

    assert!(!result.raw_text.trim().is_empty());
    assert!(["en", "sv", "de", "fr"].contains(&result.metadata.detected_language.as_str()));
    assert_eq!(result.metadata.detected_language, "sv");
    assert_eq!(result.field("total_amount"), Some("450.00"));
}

#[test]
fn page_cap_respected() {
    let ten_pages = vec![INVOICE; 10].join("\x0c");
    let result = extractor()
        .extract(ten_pages.as_bytes(), "long.pdf", Some(3))
        .unwrap();

    assert_eq!(result.metadata.pages_count, 3);
    assert_eq!(result.pages.len(), 3);
    assert_eq!(result.pages[2].page_number, 3);
}

#[test]
fn re_extraction_is_identical() {
    let ex = extractor();
    let first = ex.extract(INVOICE.as_bytes(), "a.pdf", Some(2)).unwrap();
    let second = ex.extract(INVOICE.as_bytes(), "a.pdf", Some(2)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn confidences_stay_in_bounds() {
    let ex = extractor();
    for doc in [INVOICE, BANKRUPTCY, NEWSLETTER, "Total total TOTAL 1,00 2,00 3,00 kr $ € SEK"] {
        let result = ex.extract(doc.as_bytes(), "doc.pdf", None).unwrap();
        for (name, c) in &result.key_values_confidence {
            assert!((0.0..=1.0).contains(c), "{name} = {c}");
            assert!(result.key_values.contains_key(name));
        }
    }
}

#[test]
fn encrypted_or_empty_documents_fail() {
    let err = extractor().extract(&[], "empty.pdf", None).unwrap_err();
    assert_eq!(err.kind(), "ExtractionError");
    let err = extractor().extract(b"CORRUPT", "bad.pdf", None).unwrap_err();
    assert_eq!(err.kind(), "ExtractionError");
    let err = extractor().extract(b"ENCRYPTED", "locked.pdf", None).unwrap_err();
    assert!(matches!(err, DocsortError::Encrypted));
    assert_eq!(err.kind(), "ExtractionError");
}

#[test]
fn encrypted_document_is_an_error_entry() {
    let root = tempfile::tempdir().unwrap();
    inbox(root.path(), &[("locked.pdf", "ENCRYPTED"), ("open.pdf", INVOICE)]);

    let job = engine("invoice")
        .run(request(root.path(), "invoices"))
        .unwrap();

    assert_eq!((job.processed, job.errors), (2, 1));
    let locked = &job.audit_log[0];
    assert_eq!(locked.filename, "locked.pdf");
    assert_eq!(locked.decision, Decision::Error);
    assert_eq!(locked.reason, "ExtractionError");
    assert!(locked.moved_to.is_none());
    assert!(locked.error.as_deref().unwrap().contains("encrypted"));
    assert!(root.path().join("inbox/locked.pdf").exists());
}

// ---------------------------------------------------------------------------
// Triage
// ---------------------------------------------------------------------------

#[test]
fn batch_accounts_for_every_file() {
    let root = tempfile::tempdir().unwrap();
    inbox(
        root.path(),
        &[("a.pdf", BANKRUPTCY), ("b.PDF", NEWSLETTER), ("c.pdf", INVOICE), ("notes.txt", BANKRUPTCY)],
    );

    let job = engine("bankruptcy")
        .run(request(root.path(), "is this a bankruptcy filing?"))
        .unwrap();

    assert_eq!(job.total_files, 3);
    assert_eq!(job.processed, 3);
    assert_eq!(job.audit_log.len(), 3);
    assert_eq!((job.relevant, job.irrelevant, job.errors), (1, 2, 0));
    assert!(root.path().join("relevant/a.pdf").exists());
    assert!(root.path().join("irrelevant/b.PDF").exists());
    assert!(root.path().join("inbox/notes.txt").exists());
}

#[test]
fn zero_byte_file_is_an_error_entry() {
    let root = tempfile::tempdir().unwrap();
    inbox(
        root.path(),
        &[
            ("1.pdf", INVOICE),
            ("2.pdf", NEWSLETTER),
            ("3.pdf", ""),
            ("4.pdf", BANKRUPTCY),
            ("5.pdf", INVOICE),
        ],
    );

    let job = engine("invoice").run(request(root.path(), "invoices")).unwrap();

    assert_eq!(job.processed, 5);
    assert_eq!(job.errors, 1);
    let third = &job.audit_log[2];
    assert_eq!(third.filename, "3.pdf");
    assert_eq!(third.decision, Decision::Error);
    assert_eq!(third.moved_to, None);
    assert_eq!(third.reason, "ExtractionError");
    assert!(root.path().join("inbox/3.pdf").exists());
}

#[test]
fn corrupt_and_panicking_files_do_not_stop_the_batch() {
    let root = tempfile::tempdir().unwrap();
    inbox(
        root.path(),
        &[("a.pdf", "CORRUPT"), ("b.pdf", "PANIC"), ("c.pdf", BANKRUPTCY)],
    );

    let job = engine("bankruptcy").run(request(root.path(), "bankruptcy")).unwrap();

    assert_eq!(job.processed, 3);
    assert_eq!(job.errors, 2);
    assert_eq!(job.audit_log[0].reason, "ExtractionError");
    assert_eq!(job.audit_log[1].reason, "InternalError");
    assert_eq!(job.audit_log[2].decision, Decision::Relevant);
    assert!(root.path().join("relevant/c.pdf").exists());
}

#[test]
fn collisions_get_a_suffix() {
    let root = tempfile::tempdir().unwrap();
    let engine = engine("bankruptcy");

    inbox(root.path(), &[("report.pdf", BANKRUPTCY)]);
    engine.run(request(root.path(), "bankruptcy")).unwrap();
    inbox(root.path(), &[("report.pdf", "Second bankruptcy notice for the court records.")]);
    let job = engine.run(request(root.path(), "bankruptcy")).unwrap();

    let relevant = root.path().join("relevant");
    assert_eq!(fs::read_to_string(relevant.join("report.pdf")).unwrap(), BANKRUPTCY);
    assert!(relevant.join("report_1.pdf").exists());
    assert_eq!(
        job.audit_log[0].moved_to.as_deref(),
        Some(relevant.join("report_1.pdf").display().to_string().as_str())
    );
}

#[test]
fn bankruptcy_criterion_is_relevant() {
    let root = tempfile::tempdir().unwrap();
    inbox(root.path(), &[("notice.pdf", BANKRUPTCY)]);

    let job = engine("bankruptcy")
        .run(request(root.path(), "is this a bankruptcy filing?"))
        .unwrap();

    let entry = &job.audit_log[0];
    assert_eq!(entry.decision, Decision::Relevant);
    assert!(!entry.reason.is_empty());
    assert_eq!(entry.error, None);
}

#[test]
fn missing_source_folder_fails_the_batch() {
    let root = tempfile::tempdir().unwrap();
    let err = engine("x").run(request(root.path(), "x")).unwrap_err();
    assert_eq!(err.kind(), "SourceFolderError");
    assert!(!root.path().join("relevant").exists());
}

#[test]
fn oversized_file_is_skipped_before_extraction() {
    let root = tempfile::tempdir().unwrap();
    let big = format!("PANIC{}", "x".repeat(1024 * 1024 + 1));
    inbox(root.path(), &[("big.pdf", big.as_str()), ("small.pdf", INVOICE)]);

    let config = TriageConfig {
        max_file_size_mb: 1,
        ..TriageConfig::default()
    };
    let engine = TriageEngine::with_config(
        extractor(),
        Classifier::new(Box::new(KeywordLlm { keyword: "invoice" })),
        &config,
    );
    let job = engine.run(request(root.path(), "invoices")).unwrap();

    // The oversized file would panic if it ever reached the extractor.
    assert_eq!(job.audit_log[0].reason, "SizeLimitExceeded");
    assert_eq!(job.errors, 1);
    assert_eq!(job.processed, 2);
    assert!(root.path().join("inbox/big.pdf").exists());
}

#[test]
fn service_outage_is_recorded_per_file() {
    let root = tempfile::tempdir().unwrap();
    inbox(root.path(), &[("a.pdf", INVOICE), ("b.pdf", BANKRUPTCY)]);

    let engine = TriageEngine::new(extractor(), Classifier::new(Box::new(DownLlm)));
    let job = engine.run(request(root.path(), "invoices")).unwrap();

    assert_eq!(job.errors, 2);
    assert!(job
        .audit_log
        .iter()
        .all(|e| e.reason == "ClassificationServiceError" && e.moved_to.is_none()));
    assert!(root.path().join("inbox/a.pdf").exists());
}

#[test]
fn stop_flag_halts_between_files() {
    let root = tempfile::tempdir().unwrap();
    inbox(
        root.path(),
        &[("a.pdf", INVOICE), ("b.pdf", INVOICE), ("c.pdf", INVOICE)],
    );

    let engine = engine("invoice");
    let stop = engine.stop_handle();
    let mut seen = Vec::new();
    let job = engine
        .run_with_progress(request(root.path(), "invoices"), |done, total, entry| {
            seen.push((done, total, entry.filename.clone()));
            stop.store(true, Ordering::SeqCst);
        })
        .unwrap();

    assert!(job.cancelled);
    assert_eq!(job.total_files, 3);
    assert_eq!(job.processed, 1);
    assert_eq!(seen, vec![(1, 3, "a.pdf".to_string())]);
    assert!(root.path().join("inbox/b.pdf").exists());

    // The next run on the same engine starts fresh and finishes the rest.
    let job = engine.run(request(root.path(), "invoices")).unwrap();
    assert!(!job.cancelled);
    assert_eq!(job.processed, 2);
    assert!(!root.path().join("inbox/b.pdf").exists());
    assert!(!root.path().join("inbox/c.pdf").exists());
}

#[test]
fn non_ascii_names_survive_relocation() {
    let root = tempfile::tempdir().unwrap();
    inbox(root.path(), &[("Årsredovisning konkurs ö.pdf", BANKRUPTCY)]);

    let job = engine("bankruptcy").run(request(root.path(), "bankruptcy")).unwrap();

    assert_eq!(job.audit_log[0].filename, "Årsredovisning konkurs ö.pdf");
    assert!(root
        .path()
        .join("relevant/Årsredovisning konkurs ö.pdf")
        .exists());
}

#[test]
fn audit_log_exports_to_csv() {
    let root = tempfile::tempdir().unwrap();
    inbox(root.path(), &[("a.pdf", BANKRUPTCY), ("b.pdf", "")]);

    let job = engine("bankruptcy").run(request(root.path(), "bankruptcy")).unwrap();
    let csv_path = root.path().join("audit.csv");
    append_audit_csv(&csv_path, &job.audit_log).unwrap();

    let text = fs::read_to_string(&csv_path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("a.pdf,"));
    assert!(lines[1].contains(",relevant,"));
    assert!(lines[2].contains(",error,ExtractionError,,"));
}
