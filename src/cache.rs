use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OnceCell, RwLock};
use tokio::time::Instant;
use tracing::{debug, warn};

pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
/// Longest TTL either backend will store, 30 days.
pub const MAX_CACHE_TTL_SECS: u64 = 30 * 24 * 3600;

const REDIS_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
const REDIS_COMMAND_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache connection error: {0}")]
    Connection(String),
    #[error("cache operation failed: {0}")]
    Operation(String),
}

/// Key for a generated quiz, scoped by the `quiz` namespace.
pub fn quiz_cache_key(prompt: &str) -> String {
    format!("quiz:{:x}", Sha256::digest(prompt.as_bytes()))
}

/// Key for a generated hint. The question is base64-encoded so arbitrary
/// characters cannot collide with the `:` separators.
pub fn hint_cache_key(tutorial_id: &str, question: &str) -> String {
    format!("hint:{}:{}", tutorial_id, STANDARD.encode(question.as_bytes()))
}

/// TTL both backends actually apply: at least one second, at most
/// [`MAX_CACHE_TTL_SECS`].
pub fn effective_ttl(ttl_secs: u64) -> u64 {
    ttl_secs.clamp(1, MAX_CACHE_TTL_SECS)
}

#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), CacheError>;
}

/// Redis backend. The connection is opened on first use so an unreachable
/// server at startup only costs cache hits, and is retried on later calls.
pub struct RedisCacheBackend {
    client: redis::Client,
    connection: OnceCell<ConnectionManager>,
}

impl RedisCacheBackend {
    pub fn new(connection_string: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(connection_string).map_err(|e| {
            CacheError::Connection(format!("Failed to create Redis client: {}", e))
        })?;

        Ok(Self {
            client,
            connection: OnceCell::new(),
        })
    }

    async fn connection(&self) -> Result<ConnectionManager, CacheError> {
        let manager = self
            .connection
            .get_or_try_init(|| async {
                tokio::time::timeout(REDIS_CONNECT_TIMEOUT, self.client.get_connection_manager())
                    .await
                    .map_err(|_| CacheError::Connection("Timed out connecting to Redis".into()))?
                    .map_err(|e| {
                        CacheError::Connection(format!("Failed to connect to Redis: {}", e))
                    })
            })
            .await?;

        Ok(manager.clone())
    }
}

#[async_trait]
impl CacheBackend for RedisCacheBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection().await?;

        tokio::time::timeout(REDIS_COMMAND_TIMEOUT, conn.get::<_, Option<String>>(key))
            .await
            .map_err(|_| CacheError::Operation("Redis GET timed out".into()))?
            .map_err(|e| CacheError::Operation(format!("Redis GET failed: {}", e)))
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;

        tokio::time::timeout(
            REDIS_COMMAND_TIMEOUT,
            conn.set_ex::<_, _, ()>(key, value, effective_ttl(ttl_secs)),
        )
        .await
        .map_err(|_| CacheError::Operation("Redis SET timed out".into()))?
        .map_err(|e| CacheError::Operation(format!("Redis SET failed: {}", e)))
    }
}

/// Process-local backend with per-entry expiry. Used when no Redis URL is
/// configured and as the backend in tests.
#[derive(Default)]
pub struct InMemoryCacheBackend {
    entries: RwLock<HashMap<String, (String, Instant)>>,
}

impl InMemoryCacheBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheBackend for InMemoryCacheBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|(_, expires_at)| *expires_at > Instant::now())
            .map(|(value, _)| value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), CacheError> {
        let now = Instant::now();
        let expires_at = now
            .checked_add(Duration::from_secs(effective_ttl(ttl_secs)))
            .ok_or_else(|| CacheError::Operation(format!("TTL of {}s is out of range", ttl_secs)))?;

        let mut entries = self.entries.write().await;
        entries.retain(|_, (_, expires_at)| *expires_at > now);
        entries.insert(key.to_string(), (value.to_string(), expires_at));
        Ok(())
    }
}

/// Cache-aside front for a [`CacheBackend`]. Backend failures are logged and
/// degrade to a miss on read and a no-op on write.
#[derive(Clone)]
pub struct CacheStore {
    backend: Arc<dyn CacheBackend>,
}

impl CacheStore {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        match self.backend.get(key).await {
            Ok(Some(value)) if !value.is_empty() => Some(value),
            Ok(_) => None,
            Err(e) => {
                warn!("Cache read failed for {}, treating as miss: {}", key, e);
                None
            }
        }
    }

    pub async fn set(&self, key: &str, value: &str, ttl_secs: u64) {
        match self.backend.set(key, value, ttl_secs).await {
            Ok(()) => debug!("Cached {} for {}s", key, ttl_secs),
            Err(e) => warn!("Cache write failed for {}: {}", key, e),
        }
    }
}
