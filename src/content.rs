use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde_json::Value;
use std::sync::{Arc, LazyLock};

pub const DEFAULT_CONTENT_API_BASE_URL: &str =
    "https://learncheck-dicoding-mock-666748076441.europe-west1.run.app/api";

/// Tutorial text is capped so prompts stay a manageable size.
pub const MAX_CONTENT_CHARS: usize = 4000;

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?[^>]+(>|$)").expect("valid tag pattern"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("content request failed: {0}")]
    Request(String),
    #[error("content API returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("no tutorial content for {0}")]
    Missing(String),
}

/// Source of tutorial text and learner preferences.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn tutorial_content(&self, tutorial_id: &str) -> Result<String, ContentError>;

    /// `Ok(None)` when the API knows the user but has no preferences.
    async fn user_preferences(&self, user_id: &str) -> Result<Option<Value>, ContentError>;
}

/// Strips tags, collapses whitespace and caps the length.
pub fn clean_content(raw: &str) -> String {
    let text = HTML_TAG.replace_all(raw, " ");
    let text = WHITESPACE.replace_all(&text, " ");
    let text = text.trim();

    match text.char_indices().nth(MAX_CONTENT_CHARS) {
        Some((idx, _)) => format!("{} ...", &text[..idx]),
        None => text.to_string(),
    }
}

#[derive(Clone)]
pub struct ContentClient {
    inner: Arc<Client>,
    base_url: String,
}

impl ContentClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Client::new()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_data(&self, path: &str) -> Result<Value, ContentError> {
        let url = format!("{}/{}", self.base_url, path);
        tracing::info!("Fetching {}", url);

        let response = self
            .inner
            .get(&url)
            .send()
            .await
            .map_err(|e| ContentError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ContentError::Status(response.status()));
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| ContentError::Request(e.to_string()))?;

        Ok(body["data"].clone())
    }
}

#[async_trait]
impl ContentSource for ContentClient {
    async fn tutorial_content(&self, tutorial_id: &str) -> Result<String, ContentError> {
        let data = self.fetch_data(&format!("tutorials/{}", tutorial_id)).await?;

        match data["content"].as_str() {
            Some(raw) if !raw.trim().is_empty() => {
                let text = clean_content(raw);
                tracing::info!(
                    "Content for tutorial {} fetched, {} chars",
                    tutorial_id,
                    text.len()
                );
                Ok(text)
            }
            _ => Err(ContentError::Missing(tutorial_id.to_string())),
        }
    }

    async fn user_preferences(&self, user_id: &str) -> Result<Option<Value>, ContentError> {
        let data = self
            .fetch_data(&format!("users/{}/preferences", user_id))
            .await?;

        Ok(match &data["preference"] {
            Value::Null => None,
            preference => Some(preference.clone()),
        })
    }
}
