//! QA Gateway
//!
//! An API-cost optimization layer for an LLM-backed question-answering
//! service. Sits between client requests and three expensive dependencies
//! (vector index, embedding API, chat-completion API) with:
//! - a semantic response cache (exact + similarity tiers)
//! - a request batching/coalescing scheduler
//! - an adaptive layered vector search with early termination

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use api::AppState;
use domain::optimization::ConfigHandle;
use infrastructure::answer_cache::RecentWindowIndex;
use infrastructure::cache::{create_cache, CacheBackend, CacheFactoryConfig};
use infrastructure::embedding::OpenAiEmbeddingProvider;
use infrastructure::llm::{HttpClient, OpenAiProvider};
use infrastructure::search::{AdaptiveSearchController, HttpVectorIndex};
use infrastructure::services::{AnswerCacheService, GenerationSettings, OptimizationService};

/// Create the application state with all services wired up
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let backend: CacheBackend = config.cache.backend.parse()?;
    let store = create_cache(&CacheFactoryConfig {
        backend,
        redis_url: config.cache.redis_url.clone(),
        key_prefix: config.cache.key_prefix.clone(),
        operation_timeout: Duration::from_millis(config.cache.operation_timeout_ms),
        ..Default::default()
    })
    .await?;

    let answer_cache = AnswerCacheService::new(
        store,
        Arc::new(RecentWindowIndex::new(config.answer_cache.recent_window)),
        config.answer_cache.clone(),
    );

    let api_key = config
        .openai
        .api_key
        .clone()
        .or_else(|| std::env::var("OPENAI_API_KEY").ok())
        .unwrap_or_else(|| "sk-placeholder".to_string());

    let embedding_provider = match &config.openai.base_url {
        Some(base_url) => Arc::new(OpenAiEmbeddingProvider::with_base_url(
            HttpClient::new(),
            api_key.clone(),
            base_url.clone(),
        )),
        None => Arc::new(OpenAiEmbeddingProvider::new(HttpClient::new(), api_key.clone())),
    };

    let llm_provider = match &config.openai.base_url {
        Some(base_url) => Arc::new(OpenAiProvider::with_base_url(
            HttpClient::new(),
            api_key,
            base_url.clone(),
        )),
        None => Arc::new(OpenAiProvider::new(HttpClient::new(), api_key)),
    };

    let mut index = HttpVectorIndex::new(
        HttpClient::new(),
        config.search.index_url.clone(),
        config.search.index_name.clone(),
    );
    if let Some(key) = config
        .search
        .api_key
        .clone()
        .or_else(|| std::env::var("VECTOR_INDEX_API_KEY").ok())
    {
        index = index.with_api_key(key);
    }

    let search = AdaptiveSearchController::new(Arc::new(index), config.search.layers.clone())
        .with_layer_timeout(Duration::from_millis(config.search.layer_timeout_ms));

    let settings = GenerationSettings {
        embedding_model: config.openai.embedding_model.clone(),
        chat_model: config.openai.chat_model.clone(),
        temperature: config.openai.temperature,
        max_tokens: config.openai.max_tokens,
        ..Default::default()
    };

    let config_handle = Arc::new(ConfigHandle::new(config.optimization.clone())?);

    let optimization = OptimizationService::new(
        answer_cache,
        embedding_provider,
        llm_provider,
        search,
        settings,
        config_handle,
    );

    Ok(AppState::new(Arc::new(optimization)))
}
