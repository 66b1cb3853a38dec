#![allow(dead_code)]

use async_trait::async_trait;
use generator::cache::{CacheBackend, CacheError, InMemoryCacheBackend};
use generator::content::{ContentError, ContentSource};
use generator::llm_wrapper::{GenerationOptions, ModelProvider, ProviderError};
use reqwest::StatusCode;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

pub const QUESTIONS_JSON: &str = r#"{"questions":[{"id":"q1","text":"Which are NLP tasks?","options":[{"id":"a","text":"Translation","is_correct":true,"feedback":"Yes"},{"id":"b","text":"Blur","is_correct":false,"feedback":"No"}]}]}"#;

pub enum Step {
    Reply(String),
    Fail(StatusCode, &'static str),
    Hang(Duration),
}

pub fn reply(text: &str) -> Step {
    Step::Reply(text.to_string())
}

pub fn overloaded() -> Step {
    Step::Fail(
        StatusCode::SERVICE_UNAVAILABLE,
        r#"{"error":{"message":"The model is overloaded.","status":"UNAVAILABLE"}}"#,
    )
}

/// Provider that plays back a fixed script per model and records call times.
#[derive(Default)]
pub struct ScriptedProvider {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    calls: Mutex<Vec<(String, Instant)>>,
    prompts: Mutex<Vec<(String, String)>>,
}

impl ScriptedProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script(&self, model: &str, steps: Vec<Step>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(model.to_string(), steps.into_iter().collect());
    }

    pub fn calls_to(&self, model: &str) -> Vec<Instant> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| m == model)
            .map(|(_, at)| *at)
            .collect()
    }

    pub fn call_order(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(m, _)| m.clone()).collect()
    }

    pub fn prompts_to(&self, model: &str) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| m == model)
            .map(|(_, prompt)| prompt.clone())
            .collect()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    async fn invoke(
        &self,
        model: &str,
        prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<String, ProviderError> {
        self.prompts
            .lock()
            .unwrap()
            .push((model.to_string(), prompt.to_string()));
        self.calls
            .lock()
            .unwrap()
            .push((model.to_string(), Instant::now()));
        let step = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(model)
            .and_then(VecDeque::pop_front);

        match step {
            Some(Step::Reply(text)) => Ok(text),
            Some(Step::Fail(status, body)) => Err(ProviderError::Status {
                status,
                body: body.to_string(),
            }),
            Some(Step::Hang(delay)) => {
                tokio::time::sleep(delay).await;
                Ok(QUESTIONS_JSON.to_string())
            }
            None => Err(ProviderError::Status {
                status: StatusCode::BAD_REQUEST,
                body: format!("no scripted response for {}", model),
            }),
        }
    }
}

/// In-memory cache that also records every write.
#[derive(Default)]
pub struct RecordingCache {
    inner: InMemoryCacheBackend,
    pub writes: Mutex<Vec<(String, String, u64)>>,
}

impl RecordingCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }
}

#[async_trait]
impl CacheBackend for RecordingCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), CacheError> {
        self.writes
            .lock()
            .unwrap()
            .push((key.to_string(), value.to_string(), ttl_secs));
        self.inner.set(key, value, ttl_secs).await
    }
}

/// Cache whose server never answers.
pub struct UnreachableCache {
    pub attempts: AtomicUsize,
}

impl UnreachableCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            attempts: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl CacheBackend for UnreachableCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::Connection("Connection refused (os error 111)".into()))
    }

    async fn set(&self, _key: &str, _value: &str, _ttl_secs: u64) -> Result<(), CacheError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::Connection("Connection refused (os error 111)".into()))
    }
}

/// Content API stand-in with a fixed tutorial body and optional preferences.
#[derive(Default)]
pub struct StaticContent {
    pub content: Option<String>,
    pub preferences: Option<Value>,
    pub preferences_down: bool,
    pub content_fetches: AtomicUsize,
}

impl StaticContent {
    pub fn with_content(content: &str) -> Arc<Self> {
        Arc::new(Self {
            content: Some(content.to_string()),
            ..Self::default()
        })
    }
}

#[async_trait]
impl ContentSource for StaticContent {
    async fn tutorial_content(&self, tutorial_id: &str) -> Result<String, ContentError> {
        self.content_fetches.fetch_add(1, Ordering::SeqCst);
        self.content
            .clone()
            .ok_or_else(|| ContentError::Missing(tutorial_id.to_string()))
    }

    async fn user_preferences(&self, user_id: &str) -> Result<Option<Value>, ContentError> {
        if self.preferences_down {
            return Err(ContentError::Missing(user_id.to_string()));
        }
        Ok(self.preferences.clone())
    }
}
