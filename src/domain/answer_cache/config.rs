//! Semantic answer cache configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the semantic answer cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerCacheConfig {
    /// Time-to-live for cached answers in seconds
    #[serde(default = "default_answer_ttl_secs")]
    pub answer_ttl_secs: u64,

    /// Time-to-live for cached embeddings in seconds
    #[serde(default = "default_embedding_ttl_secs")]
    pub embedding_ttl_secs: u64,

    /// Maximum number of recent embeddings held for similarity lookup
    #[serde(default = "default_recent_window")]
    pub recent_window: usize,
}

fn default_answer_ttl_secs() -> u64 {
    24 * 3600
}

fn default_embedding_ttl_secs() -> u64 {
    7 * 24 * 3600
}

fn default_recent_window() -> usize {
    512
}

impl Default for AnswerCacheConfig {
    fn default() -> Self {
        Self {
            answer_ttl_secs: default_answer_ttl_secs(),
            embedding_ttl_secs: default_embedding_ttl_secs(),
            recent_window: default_recent_window(),
        }
    }
}

impl AnswerCacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer TTL as Duration
    pub fn answer_ttl(&self) -> Duration {
        Duration::from_secs(self.answer_ttl_secs)
    }

    /// Embedding TTL as Duration
    pub fn embedding_ttl(&self) -> Duration {
        Duration::from_secs(self.embedding_ttl_secs)
    }

    pub fn with_answer_ttl(mut self, ttl: Duration) -> Self {
        self.answer_ttl_secs = ttl.as_secs();
        self
    }

    pub fn with_embedding_ttl(mut self, ttl: Duration) -> Self {
        self.embedding_ttl_secs = ttl.as_secs();
        self
    }

    pub fn with_recent_window(mut self, window: usize) -> Self {
        self.recent_window = window;
        self
    }
}
