//! Redis cache implementation

use std::fmt;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use crate::domain::cache::Cache;
use crate::domain::DomainError;

/// Configuration for Redis cache
#[derive(Debug, Clone)]
pub struct RedisCacheConfig {
    /// Redis connection URL (e.g., "redis://127.0.0.1:6379")
    pub url: String,
    /// Key prefix for namespacing
    pub key_prefix: Option<String>,
    /// Connection timeout
    pub connection_timeout: Duration,
    /// Per-operation timeout; an elapsed timeout surfaces as a cache error
    /// so callers can degrade to a miss
    pub operation_timeout: Duration,
}

impl Default for RedisCacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: None,
            connection_timeout: Duration::from_secs(5),
            operation_timeout: Duration::from_millis(100),
        }
    }
}

impl RedisCacheConfig {
    /// Creates a new configuration with the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Sets the key prefix
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Sets the connection timeout
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Sets the per-operation timeout
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }
}

/// Redis cache implementation
///
/// Features:
/// - TTL support per entry
/// - SCAN-based pattern deletion for namespace clears
/// - Connection pooling via ConnectionManager
/// - Bounded per-operation latency
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
    config: RedisCacheConfig,
}

impl fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCache")
            .field("config", &self.config)
            .field("connection", &"<ConnectionManager>")
            .finish()
    }
}

impl RedisCache {
    /// Creates a new Redis cache connection
    pub async fn new(config: RedisCacheConfig) -> Result<Self, DomainError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| DomainError::cache(format!("Failed to create Redis client: {}", e)))?;

        let connection = tokio::time::timeout(config.connection_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| DomainError::cache("Timed out connecting to Redis"))?
            .map_err(|e| DomainError::cache(format!("Failed to connect to Redis: {}", e)))?;

        Ok(Self { connection, config })
    }

    /// Creates a Redis cache with default configuration
    pub async fn with_url(url: impl Into<String>) -> Result<Self, DomainError> {
        Self::new(RedisCacheConfig::new(url)).await
    }

    fn prefix_key(&self, key: &str) -> String {
        match &self.config.key_prefix {
            Some(prefix) => format!("{}:{}", prefix, key),
            None => key.to_string(),
        }
    }

    /// Bounds one round trip by the configured operation timeout
    async fn bounded<T, F>(&self, op: &str, fut: F) -> Result<T, DomainError>
    where
        F: Future<Output = Result<T, redis::RedisError>>,
    {
        match tokio::time::timeout(self.config.operation_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(DomainError::cache(format!("Redis {} failed: {}", op, e))),
            Err(_) => Err(DomainError::cache(format!("Redis {} timed out", op))),
        }
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        self.bounded("get", async move { conn.get(&prefixed_key).await })
            .await
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        let ttl_secs = ttl.as_secs().max(1);
        let value = value.to_string();

        self.bounded("set", async move {
            conn.set_ex(&prefixed_key, value, ttl_secs).await
        })
        .await
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection.clone();

        let deleted: i32 = self
            .bounded("del", async move { conn.del(&prefixed_key).await })
            .await?;

        Ok(deleted > 0)
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<usize, DomainError> {
        let prefixed_pattern = self.prefix_key(pattern);
        let conn = self.connection.clone();

        // SCAN instead of KEYS so large keyspaces don't block the server
        let mut cursor = 0u64;
        let mut total_deleted = 0usize;

        loop {
            let prefixed_pattern = prefixed_pattern.clone();
            let mut scan_conn = conn.clone();
            let (new_cursor, keys): (u64, Vec<String>) = self
                .bounded("scan", async move {
                    redis::cmd("SCAN")
                        .arg(cursor)
                        .arg("MATCH")
                        .arg(&prefixed_pattern)
                        .arg("COUNT")
                        .arg(100)
                        .query_async(&mut scan_conn)
                        .await
                })
                .await?;

            if !keys.is_empty() {
                let mut del_conn = conn.clone();
                let deleted: i32 = self
                    .bounded("del", async move { del_conn.del(&keys).await })
                    .await?;
                total_deleted += deleted as usize;
            }

            cursor = new_cursor;

            if cursor == 0 {
                break;
            }
        }

        Ok(total_deleted)
    }

    async fn clear(&self) -> Result<(), DomainError> {
        // With a prefix configured, only clear our own keys; otherwise
        // flush the whole database
        match &self.config.key_prefix {
            Some(_) => {
                self.delete_pattern("*").await?;
            }
            None => {
                let mut conn = self.connection.clone();
                self.bounded("flushdb", async move {
                    redis::cmd("FLUSHDB").query_async::<()>(&mut conn).await
                })
                .await?;
            }
        }

        Ok(())
    }

    async fn size(&self) -> Result<usize, DomainError> {
        let conn = self.connection.clone();

        match &self.config.key_prefix {
            Some(_) => {
                let pattern = self.prefix_key("*");
                let mut cursor = 0u64;
                let mut count = 0usize;

                loop {
                    let pattern = pattern.clone();
                    let mut scan_conn = conn.clone();
                    let (new_cursor, keys): (u64, Vec<String>) = self
                        .bounded("scan", async move {
                            redis::cmd("SCAN")
                                .arg(cursor)
                                .arg("MATCH")
                                .arg(&pattern)
                                .arg("COUNT")
                                .arg(1000)
                                .query_async(&mut scan_conn)
                                .await
                        })
                        .await?;

                    count += keys.len();
                    cursor = new_cursor;

                    if cursor == 0 {
                        break;
                    }
                }

                Ok(count)
            }
            None => {
                let mut conn = conn;
                let size: usize = self
                    .bounded("dbsize", async move {
                        redis::cmd("DBSIZE").query_async(&mut conn).await
                    })
                    .await?;
                Ok(size)
            }
        }
    }
}
