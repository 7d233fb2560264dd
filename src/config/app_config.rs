use serde::Deserialize;

use crate::domain::answer_cache::AnswerCacheConfig;
use crate::domain::optimization::OptimizationConfig;
use crate::domain::search::SearchLayer;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub optimization: OptimizationConfig,
    #[serde(default)]
    pub answer_cache: AnswerCacheConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Shared cache store settings
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// "redis" or "in_memory"
    pub backend: String,
    pub redis_url: Option<String>,
    pub key_prefix: Option<String>,
    /// Store round trips above this degrade to a cache miss
    pub operation_timeout_ms: u64,
}

/// OpenAI credentials and model selection
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub embedding_model: String,
    pub chat_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Vector index address and layer layout
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    pub index_url: String,
    pub index_name: String,
    pub api_key: Option<String>,
    pub layer_timeout_ms: u64,
    /// Layers in query priority order, most general first
    pub layers: Vec<SearchLayer>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: "redis".to_string(),
            redis_url: Some("redis://127.0.0.1:6379".to_string()),
            key_prefix: Some("qa-gateway".to_string()),
            operation_timeout_ms: 100,
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            embedding_model: "text-embedding-3-small".to_string(),
            chat_model: "gpt-3.5-turbo".to_string(),
            temperature: 0.5,
            max_tokens: 600,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            index_url: "http://127.0.0.1:6333".to_string(),
            index_name: "support-qa".to_string(),
            api_key: None,
            layer_timeout_ms: 5000,
            layers: vec![
                SearchLayer::new("general", "general"),
                SearchLayer::new("topic", "topic").with_weight(0.95),
                SearchLayer::new("category", "category").with_weight(0.9),
            ],
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
