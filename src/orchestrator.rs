use crate::cache::{CacheStore, DEFAULT_CACHE_TTL_SECS};
use crate::errors::{AttemptError, OrchestratorError};
use crate::extractor::extract_validated;
use crate::llm_wrapper::{truncate, GenerationOptions, ModelProvider};
use crate::retry::{classify, Disposition, RetryPolicy, DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS};
use crate::schemas::generation_result::GenerationResult;
use crate::schemas::model_attempt::{AttemptOutcome, ModelAttempt};
use crate::schemas::shapes::ResponseShape;
use crate::timeout_guard::guarded_invoke;
use serde_json::Value;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_retry2::{Retry, RetryError};
use tracing::{error, info, warn};

pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(12);

/// Longest error summary carried in [`OrchestratorError::AllModelsFailed`].
const MAX_ERROR_SUMMARY_LEN: usize = 200;

/// One generation job. Built once per call and not mutated afterwards.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub cache_key: String,
    pub model_chain: Vec<String>,
    pub attempt_timeout: Duration,
    pub max_attempts_per_model: u32,
    pub shape: Arc<dyn ResponseShape>,
}

impl GenerationRequest {
    pub fn new(
        prompt: impl Into<String>,
        cache_key: impl Into<String>,
        model_chain: Vec<String>,
        shape: Arc<dyn ResponseShape>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            cache_key: cache_key.into(),
            model_chain,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            max_attempts_per_model: DEFAULT_MAX_ATTEMPTS,
            shape,
        }
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts_per_model = max_attempts;
        self
    }

    fn validate(&self) -> Result<(), OrchestratorError> {
        if self.prompt.trim().is_empty() {
            return Err(OrchestratorError::Validation("prompt is required".into()));
        }
        if self.cache_key.is_empty() {
            return Err(OrchestratorError::Validation("cache key is required".into()));
        }
        if self.model_chain.iter().all(|model| model.trim().is_empty()) {
            return Err(OrchestratorError::Validation(
                "model chain must name at least one model".into(),
            ));
        }
        if self.max_attempts_per_model == 0 {
            return Err(OrchestratorError::Validation(
                "max attempts per model must be at least 1".into(),
            ));
        }
        if self.attempt_timeout.is_zero() {
            return Err(OrchestratorError::Validation(
                "attempt timeout must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Cache-aside model chain executor.
///
/// Reads the cache, then walks the model chain in order. Each model gets up
/// to `max_attempts_per_model` guarded attempts; retryable failures back off
/// geometrically, fatal ones move straight to the next model. The first
/// validated value is written to the cache and returned.
#[derive(Clone)]
pub struct Orchestrator {
    cache: CacheStore,
    provider: Arc<dyn ModelProvider>,
    options: GenerationOptions,
    base_delay: Duration,
    cache_ttl_secs: u64,
}

impl Orchestrator {
    pub fn new(cache: CacheStore, provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            cache,
            provider,
            options: GenerationOptions::default(),
            base_delay: DEFAULT_BASE_DELAY,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_cache_ttl(mut self, ttl_secs: u64) -> Self {
        self.cache_ttl_secs = ttl_secs;
        self
    }

    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, OrchestratorError> {
        request.validate()?;

        if let Some(value) = self.lookup(&request.cache_key, request.shape.as_ref()).await {
            info!("Cache hit for {}", request.cache_key);
            return Ok(GenerationResult::from_cache(value));
        }
        info!("Cache miss for {}, calling model chain", request.cache_key);

        let policy = RetryPolicy {
            max_attempts: request.max_attempts_per_model,
            base_delay: self.base_delay,
        };
        let mut last_error = None;

        for model in request.model_chain.iter().filter(|m| !m.trim().is_empty()) {
            info!("Trying model {}", model);

            match self.run_model(model, request, &policy).await {
                Ok(value) => {
                    info!("Model {} succeeded, caching result", model);
                    self.cache
                        .set(&request.cache_key, &value.to_string(), self.cache_ttl_secs)
                        .await;
                    return Ok(GenerationResult::from_model(value, model));
                }
                Err(err) => {
                    warn!("Model {} failed, trying next: {}", model, err);
                    last_error = Some(truncate(&err.to_string(), MAX_ERROR_SUMMARY_LEN));
                }
            }
        }

        error!(
            "All models failed for {}. Last error: {}",
            request.cache_key,
            last_error.as_deref().unwrap_or("none")
        );
        Err(OrchestratorError::AllModelsFailed { last_error })
    }

    /// Reads a cached value without touching any model. Entries are
    /// re-checked against `shape`; anything unreadable counts as a miss.
    pub async fn lookup(&self, cache_key: &str, shape: &dyn ResponseShape) -> Option<Value> {
        let cached = self.cache.get(cache_key).await?;

        match serde_json::from_str::<Value>(&cached) {
            Ok(value) if shape.check(&value).is_ok() => Some(value),
            Ok(_) => {
                warn!(
                    "Cached entry {} does not match {}, ignoring",
                    cache_key,
                    shape.name()
                );
                None
            }
            Err(e) => {
                warn!("Cached entry {} is not valid JSON: {}", cache_key, e);
                None
            }
        }
    }

    /// Runs the attempt loop for one model.
    async fn run_model(
        &self,
        model: &str,
        request: &GenerationRequest,
        policy: &RetryPolicy,
    ) -> Result<Value, AttemptError> {
        let attempt = AtomicU32::new(0);
        let attempt = &attempt;
        let max_attempts = policy.max_attempts;

        Retry::spawn(policy.schedule(), move || async move {
            let current_attempt = attempt.fetch_add(1, Ordering::SeqCst) + 1;
            tracing::debug!(
                "Attempt {}/{} using model {}",
                current_attempt,
                max_attempts,
                model
            );

            let started = Instant::now();
            let result = self.attempt(model, request).await;
            let record = |outcome| ModelAttempt {
                model,
                attempt: current_attempt,
                max_attempts,
                elapsed: started.elapsed(),
                outcome,
            };

            match result {
                Ok(value) => {
                    record(AttemptOutcome::Success).log(None);
                    Ok(value)
                }
                Err(err) => {
                    let detail = err.to_string();
                    match classify(&err) {
                        Disposition::Retryable if current_attempt < max_attempts => {
                            record(AttemptOutcome::RetryableFailure).log(Some(detail.as_str()));
                            Err(RetryError::transient(err))
                        }
                        // Last attempt for this model.
                        Disposition::Retryable => {
                            record(AttemptOutcome::RetryableFailure).log(Some(detail.as_str()));
                            Err(RetryError::permanent(err))
                        }
                        Disposition::Fatal => {
                            record(AttemptOutcome::FatalFailure).log(Some(detail.as_str()));
                            Err(RetryError::permanent(err))
                        }
                    }
                }
            }
        })
        .await
    }

    async fn attempt(&self, model: &str, request: &GenerationRequest) -> Result<Value, AttemptError> {
        let raw = guarded_invoke(
            self.provider.clone(),
            model,
            &request.prompt,
            &self.options,
            request.attempt_timeout,
        )
        .await?;

        extract_validated(&raw, request.shape.as_ref())
    }
}
