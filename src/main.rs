use generator::cache::{CacheBackend, CacheStore, InMemoryCacheBackend, RedisCacheBackend};
use generator::content::ContentClient;
use generator::history::InMemoryHistory;
use generator::http;
use generator::llm_wrapper::GeminiClient;
use generator::orchestrator::Orchestrator;
use generator::service::{LearningService, ServiceConfig};
use generator::settings::Settings;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .init();
}

fn cache_backend(settings: &Settings) -> Arc<dyn CacheBackend> {
    let Some(url) = settings.redis_url.as_deref() else {
        info!("REDIS_URL is empty, using in-process cache");
        return Arc::new(InMemoryCacheBackend::new());
    };

    match RedisCacheBackend::new(url) {
        Ok(backend) => {
            info!("Using Redis cache at {}", url);
            Arc::new(backend)
        }
        Err(e) => {
            warn!("{}. Falling back to in-process cache", e);
            Arc::new(InMemoryCacheBackend::new())
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging first
    init_logging();

    let settings = Settings::new()?;
    if settings.gemini_api_key.is_empty() {
        warn!("GEMINI_API_KEY is not set; model calls will be rejected upstream");
    }

    let orchestrator = Orchestrator::new(
        CacheStore::new(cache_backend(&settings)),
        Arc::new(GeminiClient::new(
            settings.gemini_base_url.clone(),
            settings.gemini_api_key.clone(),
        )),
    )
    .with_base_delay(settings.backoff_base())
    .with_cache_ttl(settings.cache_ttl_secs);

    let service = Arc::new(LearningService::new(
        orchestrator,
        Arc::new(ContentClient::new(settings.content_api_base_url.clone())),
        Arc::new(InMemoryHistory::new()),
        ServiceConfig::from_settings(&settings),
    ));

    let listener = tokio::net::TcpListener::bind(settings.bind_address()).await?;
    info!("Generator service listening on {}", settings.bind_address());

    axum::serve(listener, http::router(service)).await?;
    Ok(())
}
