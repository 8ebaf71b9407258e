use crate::classify::LlmClient;
use crate::error::DocsortError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Ollama HTTP client for local inference.
pub struct OllamaClient {
    base_url: String,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OllamaClient {
    pub fn new(
        base_url: &str,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, DocsortError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| DocsortError::ClassificationService(format!("HTTP client: {e}")))?;

        Ok(OllamaClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
            client,
            timeout_secs,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_error(&self, e: reqwest::Error) -> DocsortError {
        if e.is_connect() {
            DocsortError::ClassificationService(format!(
                "cannot reach inference service at {}",
                self.base_url
            ))
        } else if e.is_timeout() {
            DocsortError::ClassificationService(format!(
                "request timed out after {}s",
                self.timeout_secs
            ))
        } else {
            DocsortError::ClassificationService(e.to_string())
        }
    }

    fn check_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, DocsortError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        Err(DocsortError::ClassificationService(format!(
            "HTTP {}: {}",
            status.as_u16(),
            body.trim()
        )))
    }
}

/// Request body for Ollama /api/generate
#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
    format: &'a str,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Response body from Ollama /api/tags
#[derive(Deserialize)]
struct TagsResponse {
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}

impl LlmClient for OllamaClient {
    fn generate(&self, system: &str, prompt: &str) -> Result<String, DocsortError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            system,
            stream: false,
            format: "json",
            options: GenerateOptions { temperature: 0.0 },
        };

        tracing::debug!(model = %self.model, prompt_chars = prompt.chars().count(), "calling inference service");
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| self.request_error(e))?;

        let parsed: GenerateResponse = Self::check_status(response)?
            .json()
            .map_err(|e| DocsortError::ClassificationService(format!("bad response envelope: {e}")))?;

        Ok(parsed.response)
    }

    fn list_models(&self) -> Result<Vec<String>, DocsortError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| self.request_error(e))?;

        let parsed: TagsResponse = Self::check_status(response)?
            .json()
            .map_err(|e| DocsortError::ClassificationService(format!("bad response envelope: {e}")))?;

        Ok(parsed.models.into_iter().map(|m| m.name).collect())
    }
}
