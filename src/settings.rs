use crate::cache::{DEFAULT_CACHE_TTL_SECS, MAX_CACHE_TTL_SECS};
use crate::content::DEFAULT_CONTENT_API_BASE_URL;
use crate::llm_wrapper::DEFAULT_GEMINI_BASE_URL;
use config::ConfigError;
use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_QUIZ_MODELS: &str =
    "gemini-2.0-flash-lite,gemini-2.0-flash,gemini-2.0-pro,gemini-2.0-flash-thinking";
const DEFAULT_HINT_MODELS: &str = "gemini-2.5-flash,gemini-2.5-pro,gemini-2.0-flash,gemini-2.0-pro";

/// Model chain and per-attempt deadline for one kind of generation.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ChainSettings {
    pub models: Vec<String>,
    pub attempt_timeout_ms: u64,
}

impl ChainSettings {
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    /// `None` selects the in-process cache.
    pub redis_url: Option<String>,
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    pub content_api_base_url: String,
    pub cache_ttl_secs: u64,
    pub max_attempts_per_model: u32,
    pub backoff_base_ms: u64,
    pub quiz: ChainSettings,
    pub hint: ChainSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load environment variables
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds settings from any key lookup, falling back to defaults for
    /// missing or unparsable values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let string =
            |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let redis_url = match lookup("REDIS_URL") {
            Some(url) if url.trim().is_empty() => None,
            Some(url) => Some(url),
            None => Some("redis://127.0.0.1:6379".to_string()),
        };

        let settings = Settings {
            host: string("HOST", "0.0.0.0"),
            port: parse_or(&lookup, "PORT", 3001),
            redis_url,
            gemini_api_key: string("GEMINI_API_KEY", ""),
            gemini_base_url: string("GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL),
            content_api_base_url: string("CONTENT_API_BASE_URL", DEFAULT_CONTENT_API_BASE_URL),
            cache_ttl_secs: parse_or(&lookup, "CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS),
            max_attempts_per_model: parse_or(&lookup, "MAX_ATTEMPTS_PER_MODEL", 3),
            backoff_base_ms: parse_or(&lookup, "BACKOFF_BASE_MS", 1000),
            quiz: ChainSettings {
                models: parse_model_chain(&string("QUIZ_MODEL_CHAIN", DEFAULT_QUIZ_MODELS)),
                attempt_timeout_ms: parse_or(&lookup, "QUIZ_ATTEMPT_TIMEOUT_MS", 12000),
            },
            hint: ChainSettings {
                models: parse_model_chain(&string("HINT_MODEL_CHAIN", DEFAULT_HINT_MODELS)),
                attempt_timeout_ms: parse_or(&lookup, "HINT_ATTEMPT_TIMEOUT_MS", 20000),
            },
        };

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.quiz.models.is_empty() {
            return Err(ConfigError::Message("QUIZ_MODEL_CHAIN names no models".into()));
        }
        if self.hint.models.is_empty() {
            return Err(ConfigError::Message("HINT_MODEL_CHAIN names no models".into()));
        }
        if !(1..=MAX_CACHE_TTL_SECS).contains(&self.cache_ttl_secs) {
            return Err(ConfigError::Message(format!(
                "CACHE_TTL_SECS must be between 1 and {}",
                MAX_CACHE_TTL_SECS
            )));
        }
        if self.max_attempts_per_model == 0 {
            return Err(ConfigError::Message(
                "MAX_ATTEMPTS_PER_MODEL must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Copy,
{
    lookup(key)
        .map(|v| v.trim().parse().unwrap_or(default))
        .unwrap_or(default)
}

/// Splits a comma-separated chain, dropping blanks and keeping order.
pub fn parse_model_chain(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|model| !model.is_empty())
        .map(String::from)
        .collect()
}
