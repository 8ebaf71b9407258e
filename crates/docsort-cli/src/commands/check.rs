use docsort_core::classify::LlmClient;
use docsort_core::config::DocsortConfig;
use docsort_core::extraction::ocr::TesseractOcr;
use docsort_core::extraction::pdftotext::PdftotextExtractor;

/// Report which backends are usable. Fails when a required one is missing.
pub fn run(config: &DocsortConfig) -> anyhow::Result<()> {
    let mut missing = Vec::new();

    if PdftotextExtractor::is_available() {
        println!("  pdftotext        ok");
    } else {
        println!("  pdftotext        MISSING (install poppler-utils)");
        missing.push("pdftotext");
    }

    if !config.extraction.ocr_enabled {
        println!("  OCR              disabled");
    } else if TesseractOcr::is_available() {
        println!("  OCR              ok ({})", config.extraction.ocr_languages);
    } else {
        // Only scanned pages need it
        println!("  OCR              unavailable (install poppler-utils and tesseract-ocr)");
    }

    let client = super::ollama_client(config)?;
    match client.list_models() {
        Ok(models) => {
            let wanted = client.model();
            // Ollama lists tagged names such as "llama3:latest"
            let installed = models
                .iter()
                .any(|m| m == wanted || m.split(':').next() == Some(wanted));
            if installed {
                println!("  inference        ok ({} at {})", wanted, client.base_url());
            } else {
                println!(
                    "  inference        model {wanted} not installed at {} (available: {})",
                    client.base_url(),
                    if models.is_empty() { "none".to_string() } else { models.join(", ") }
                );
                missing.push("model");
            }
        }
        Err(e) => {
            println!("  inference        UNREACHABLE: {e}");
            missing.push("inference service");
        }
    }

    if !missing.is_empty() {
        anyhow::bail!("not ready: {}", missing.join(", "));
    }
    Ok(())
}
