//! Cache factory for runtime backend selection

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::domain::cache::Cache;
use crate::domain::DomainError;

use super::in_memory::{InMemoryCache, InMemoryCacheConfig};
use super::redis::{RedisCache, RedisCacheConfig};

/// Supported cache backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheBackend {
    /// In-memory cache using moka
    #[default]
    InMemory,
    /// Redis cache
    Redis,
}

impl std::fmt::Display for CacheBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheBackend::InMemory => write!(f, "in_memory"),
            CacheBackend::Redis => write!(f, "redis"),
        }
    }
}

impl std::str::FromStr for CacheBackend {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "in_memory" | "inmemory" | "memory" => Ok(CacheBackend::InMemory),
            "redis" => Ok(CacheBackend::Redis),
            _ => Err(DomainError::configuration(format!(
                "Unknown cache backend: {}. Valid backends: in_memory, redis",
                s
            ))),
        }
    }
}

/// Configuration for cache creation
#[derive(Debug, Clone)]
pub struct CacheFactoryConfig {
    /// Backend to create
    pub backend: CacheBackend,
    /// Redis URL (required for the Redis backend)
    pub redis_url: Option<String>,
    /// Key prefix for namespacing (Redis)
    pub key_prefix: Option<String>,
    /// Per-operation timeout (Redis)
    pub operation_timeout: Duration,
    /// Maximum capacity (in-memory)
    pub max_capacity: u64,
}

impl Default for CacheFactoryConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::InMemory,
            redis_url: None,
            key_prefix: None,
            operation_timeout: Duration::from_millis(100),
            max_capacity: 10_000,
        }
    }
}

/// Creates the shared cache store for the configured backend.
///
/// A Redis backend that cannot be reached at startup falls back to the
/// in-memory store: the cache is an optimization, not a dependency.
pub async fn create_cache(config: &CacheFactoryConfig) -> Result<Arc<dyn Cache>, DomainError> {
    match config.backend {
        CacheBackend::InMemory => {
            info!("Using in-memory cache store");
            Ok(create_in_memory(config))
        }
        CacheBackend::Redis => {
            let url = config.redis_url.clone().ok_or_else(|| {
                DomainError::configuration("Redis URL is required for the redis cache backend")
            })?;

            let mut redis_config =
                RedisCacheConfig::new(url).with_operation_timeout(config.operation_timeout);

            if let Some(prefix) = &config.key_prefix {
                redis_config = redis_config.with_key_prefix(prefix.clone());
            }

            match RedisCache::new(redis_config).await {
                Ok(cache) => {
                    info!("Using Redis cache store");
                    Ok(Arc::new(cache))
                }
                Err(e) => {
                    tracing::warn!("Redis unavailable ({}), falling back to in-memory cache", e);
                    Ok(create_in_memory(config))
                }
            }
        }
    }
}

fn create_in_memory(config: &CacheFactoryConfig) -> Arc<dyn Cache> {
    Arc::new(InMemoryCache::with_config(
        InMemoryCacheConfig::default().with_max_capacity(config.max_capacity),
    ))
}
