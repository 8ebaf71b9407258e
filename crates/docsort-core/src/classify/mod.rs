pub mod ollama;

pub use ollama::OllamaClient;

use crate::error::DocsortError;
use serde::{Deserialize, Serialize};

/// Default cap on the document text sent with a classification request.
pub const DEFAULT_MAX_TEXT_LENGTH: usize = 3000;

/// One initial request plus one retry on an unusable reply.
const MAX_ATTEMPTS: u32 = 2;

const SYSTEM_PROMPT: &str = "\
You are a document classification assistant. Decide whether the document \
matches the given criteria.

Respond with valid JSON only, with no text before or after it, in exactly \
this shape:
{\"is_relevant\": true or false, \"reason\": \"brief explanation\"}";

/// Text-in, text-out access to the inference service.
pub trait LlmClient: Send + Sync {
    /// Generate a completion for `prompt` under the `system` instruction.
    fn generate(&self, system: &str, prompt: &str) -> Result<String, DocsortError>;

    /// Models the service can run.
    fn list_models(&self) -> Result<Vec<String>, DocsortError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub is_relevant: bool,
    pub reason: String,
}

/// Asks the inference service whether a document matches a criterion.
pub struct Classifier {
    client: Box<dyn LlmClient>,
    max_text_length: usize,
}

impl Classifier {
    pub fn new(client: Box<dyn LlmClient>) -> Self {
        Classifier {
            client,
            max_text_length: DEFAULT_MAX_TEXT_LENGTH,
        }
    }

    pub fn with_max_text_length(mut self, max_text_length: usize) -> Self {
        self.max_text_length = max_text_length;
        self
    }

    /// Classify `text` against `criteria`.
    ///
    /// An unusable reply is retried once with the same request. Service
    /// failures are returned immediately without a retry.
    pub fn classify(&self, text: &str, criteria: &str) -> Result<Classification, DocsortError> {
        let prompt = build_prompt(criteria, truncate_chars(text, self.max_text_length));

        let mut last_reason = String::new();
        for attempt in 1..=MAX_ATTEMPTS {
            let reply = self.client.generate(SYSTEM_PROMPT, &prompt)?;
            match parse_classification(&reply) {
                Ok(classification) => return Ok(classification),
                Err(reason) => {
                    tracing::warn!(attempt, %reason, "unusable classification reply");
                    last_reason = reason;
                }
            }
        }

        Err(DocsortError::ClassificationFormat {
            attempts: MAX_ATTEMPTS,
            reason: last_reason,
        })
    }
}

fn build_prompt(criteria: &str, excerpt: &str) -> String {
    format!(
        "Classification criteria: {criteria}\n\n\
         Document text (excerpt):\n{excerpt}\n\n\
         Does this document match the criteria? Respond in JSON only."
    )
}

/// The first `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Parse a model reply into a classification.
///
/// Tolerates code fences and prose around the JSON object. Extra keys are
/// ignored; missing or mistyped keys and a blank reason are errors.
pub fn parse_classification(reply: &str) -> Result<Classification, String> {
    let block = extract_json_block(reply).ok_or_else(|| "no JSON object in reply".to_string())?;
    let classification: Classification =
        serde_json::from_str(block).map_err(|e| format!("invalid classification JSON: {e}"))?;
    if classification.reason.trim().is_empty() {
        return Err("classification reason is empty".into());
    }
    Ok(Classification {
        is_relevant: classification.is_relevant,
        reason: classification.reason.trim().to_string(),
    })
}

fn extract_json_block(reply: &str) -> Option<&str> {
    let trimmed = reply.trim();

    if let Some(start) = trimmed.find("```") {
        let after_fence = &trimmed[start + 3..];
        let after_fence = after_fence.strip_prefix("json").unwrap_or(after_fence);
        if let Some(end) = after_fence.find("```") {
            let block = after_fence[..end].trim();
            if block.starts_with('{') {
                return Some(block);
            }
        }
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => Some(&trimmed[start..=end]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Replays scripted replies and records every prompt it receives.
    struct ScriptedLlm {
        replies: Mutex<VecDeque<Result<String, DocsortError>>>,
        prompts: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedLlm {
        fn new(replies: Vec<Result<&str, DocsortError>>) -> (Self, Arc<Mutex<Vec<String>>>) {
            let prompts = Arc::new(Mutex::new(Vec::new()));
            let llm = ScriptedLlm {
                replies: Mutex::new(
                    replies
                        .into_iter()
                        .map(|r| r.map(str::to_string))
                        .collect(),
                ),
                prompts: prompts.clone(),
            };
            (llm, prompts)
        }
    }

    impl LlmClient for ScriptedLlm {
        fn generate(&self, _system: &str, prompt: &str) -> Result<String, DocsortError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(DocsortError::ClassificationService("script exhausted".into())))
        }

        fn list_models(&self) -> Result<Vec<String>, DocsortError> {
            Ok(vec!["scripted".into()])
        }
    }

    const OK_REPLY: &str = r#"{"is_relevant": true, "reason": "Invoice from a supplier"}"#;

    #[test]
    fn test_valid_reply() {
        let (llm, prompts) = ScriptedLlm::new(vec![Ok(OK_REPLY)]);
        let c = Classifier::new(Box::new(llm))
            .classify("Invoice 2024-001", "supplier invoices")
            .unwrap();
        assert!(c.is_relevant);
        assert_eq!(c.reason, "Invoice from a supplier");
        assert_eq!(prompts.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_retries_once_then_succeeds() {
        let (llm, prompts) = ScriptedLlm::new(vec![Ok("Sure! It is relevant."), Ok(OK_REPLY)]);
        let c = Classifier::new(Box::new(llm)).classify("text", "criteria").unwrap();
        assert!(c.is_relevant);
        let prompts = prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert_eq!(prompts[0], prompts[1]);
    }

    #[test]
    fn test_two_bad_replies_is_format_error() {
        let (llm, prompts) = ScriptedLlm::new(vec![
            Ok("not json"),
            Ok(r#"{"relevant": "yes"}"#),
            Ok(OK_REPLY),
        ]);
        let err = Classifier::new(Box::new(llm))
            .classify("text", "criteria")
            .unwrap_err();
        assert!(matches!(err, DocsortError::ClassificationFormat { attempts: 2, .. }));
        assert_eq!(prompts.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_service_error_is_not_retried() {
        let (llm, prompts) = ScriptedLlm::new(vec![
            Err(DocsortError::ClassificationService("connection refused".into())),
            Ok(OK_REPLY),
        ]);
        let err = Classifier::new(Box::new(llm))
            .classify("text", "criteria")
            .unwrap_err();
        assert_eq!(err.kind(), "ClassificationServiceError");
        assert_eq!(prompts.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_text_is_truncated() {
        let (llm, prompts) = ScriptedLlm::new(vec![Ok(OK_REPLY)]);
        let text = "å".repeat(5000);
        Classifier::new(Box::new(llm))
            .with_max_text_length(3000)
            .classify(&text, "criteria")
            .unwrap();
        let prompt = prompts.lock().unwrap()[0].clone();
        assert_eq!(prompt.matches('å').count(), 3000);
    }

    #[test]
    fn test_parse_fenced_and_prose() {
        let fenced = "```json\n{\"is_relevant\": false, \"reason\": \"A recipe\"}\n```";
        assert_eq!(
            parse_classification(fenced).unwrap(),
            Classification {
                is_relevant: false,
                reason: "A recipe".into()
            }
        );

        let prose = "Here you go: {\"is_relevant\": true, \"reason\": \"Matches\", \"confidence\": 0.9} Hope it helps";
        assert!(parse_classification(prose).unwrap().is_relevant);
    }

    #[test]
    fn test_parse_rejects_ill_shaped() {
        assert!(parse_classification(r#"{"is_relevant": "true", "reason": "x"}"#).is_err());
        assert!(parse_classification(r#"{"is_relevant": true}"#).is_err());
        assert!(parse_classification(r#"{"is_relevant": true, "reason": "  "}"#).is_err());
        assert!(parse_classification("").is_err());
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("ab", 3), "ab");
        assert_eq!(truncate_chars("åäö", 2), "åä");
    }
}
