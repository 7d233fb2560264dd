use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Provider error: {provider} - {message}")]
    Provider { provider: String, message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Cache error: {message}")]
    Cache { message: String },

    #[error("Search layer '{layer}' failed: {message}")]
    SearchLayer { layer: String, message: String },

    #[error("Search unavailable: {message}")]
    SearchUnavailable { message: String },

    #[error("Upstream batch call failed: {message}")]
    UpstreamBatch { message: String },
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    pub fn search_layer(layer: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SearchLayer {
            layer: layer.into(),
            message: message.into(),
        }
    }

    pub fn search_unavailable(message: impl Into<String>) -> Self {
        Self::SearchUnavailable {
            message: message.into(),
        }
    }

    pub fn upstream_batch(message: impl Into<String>) -> Self {
        Self::UpstreamBatch {
            message: message.into(),
        }
    }

    /// Infrastructure-adjacent failures that degrade gracefully instead of
    /// failing the request.
    pub fn is_degradable(&self) -> bool {
        matches!(self, Self::Cache { .. } | Self::SearchLayer { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_error() {
        let error = DomainError::cache("Redis unreachable");
        assert_eq!(error.to_string(), "Cache error: Redis unreachable");
        assert!(error.is_degradable());
    }

    #[test]
    fn test_search_layer_error() {
        let error = DomainError::search_layer("faq", "timeout");
        assert_eq!(error.to_string(), "Search layer 'faq' failed: timeout");
        assert!(error.is_degradable());
    }

    #[test]
    fn test_upstream_batch_error_is_fatal() {
        let error = DomainError::upstream_batch("completion call failed");
        assert!(!error.is_degradable());
    }

    #[test]
    fn test_validation_error() {
        let error = DomainError::validation("similarity_threshold out of range");
        assert_eq!(
            error.to_string(),
            "Validation error: similarity_threshold out of range"
        );
    }
}
