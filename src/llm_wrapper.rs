use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::Arc;

/// Longest slice of an upstream error body kept in error messages.
const MAX_ERROR_BODY_LEN: usize = 500;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Request error ({kind}): {message}")]
    Request { kind: &'static str, message: String },
    #[error("Upstream error ({status}): {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("JSON parsing error: {0}")]
    Decode(String),
}

/// Sampling options sent with every model invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub response_mime_type: Option<String>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.5,
            response_mime_type: Some("application/json".to_string()),
        }
    }
}

/// A generative model backend addressed by model identifier.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    async fn invoke(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, ProviderError>;
}

/// Client for the Gemini `generateContent` REST endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    inner: Arc<Client>,
    base_url: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Client::new()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }

    fn request_body(prompt: &str, options: &GenerationOptions) -> Value {
        let mut generation_config = json!({ "temperature": options.temperature });
        if let Some(mime) = &options.response_mime_type {
            generation_config["responseMimeType"] = json!(mime);
        }

        json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": generation_config,
        })
    }
}

#[async_trait]
impl ModelProvider for GeminiClient {
    async fn invoke(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, ProviderError> {
        let response = self
            .inner
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request_body(prompt, options))
            .send()
            .await
            .map_err(|e| {
                let kind = if e.is_timeout() {
                    "timeout"
                } else if e.is_connect() {
                    "connection"
                } else {
                    "other"
                };
                tracing::warn!("Request to model {} failed: {} error - {}", model, kind, e);
                ProviderError::Request {
                    kind,
                    message: e.to_string(),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| format!("HTTP error: {}", status));

            tracing::warn!(
                "Model {} responded with status {}: {}",
                model,
                status,
                error_body
            );

            return Err(ProviderError::Status {
                status,
                body: truncate(&error_body, MAX_ERROR_BODY_LEN),
            });
        }

        let raw_response = response
            .json::<Value>()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        Ok(response_text(&raw_response))
    }
}

/// Concatenates the text parts of the first candidate.
pub fn response_text(raw_response: &Value) -> String {
    raw_response["candidates"][0]["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part["text"].as_str())
                .collect::<String>()
        })
        .unwrap_or_default()
        .trim()
        .to_string()
}

pub(crate) fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
