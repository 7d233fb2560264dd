//! Shared application state

use std::sync::Arc;

use crate::infrastructure::services::OptimizationService;

/// State shared by all request handlers
#[derive(Debug, Clone)]
pub struct AppState {
    pub optimization: Arc<OptimizationService>,
}

impl AppState {
    pub fn new(optimization: Arc<OptimizationService>) -> Self {
        Self { optimization }
    }
}

#[cfg(test)]
pub mod test_support {
    use super::*;
    use crate::domain::answer_cache::AnswerCacheConfig;
    use crate::domain::cache::MockCache;
    use crate::domain::embedding::MockEmbeddingProvider;
    use crate::domain::llm::{LlmResponse, Message, MockLlmProvider};
    use crate::domain::optimization::{ConfigHandle, OptimizationConfig};
    use crate::domain::search::{MockVectorIndex, SearchHit, SearchLayer};
    use crate::infrastructure::answer_cache::RecentWindowIndex;
    use crate::infrastructure::search::AdaptiveSearchController;
    use crate::infrastructure::services::{AnswerCacheService, GenerationSettings};

    /// State wired entirely from mocks, answering every question with a
    /// fixed completion and one high-scoring context hit
    pub fn mock_state() -> AppState {
        let store = Arc::new(MockCache::new());
        let answer_cache = AnswerCacheService::new(
            store,
            Arc::new(RecentWindowIndex::new(16)),
            AnswerCacheConfig::default(),
        );

        let index = Arc::new(MockVectorIndex::new().with_layer_hits(
            "ns-0",
            vec![SearchHit::new("doc-1", 0.9).with_metadata(serde_json::json!({
                "question": "reference question",
                "answer": "reference answer",
            }))],
        ));
        let search = AdaptiveSearchController::new(
            index,
            vec![
                SearchLayer::new("general", "ns-0"),
                SearchLayer::new("topic", "ns-1").with_weight(0.9),
            ],
        );

        let config = OptimizationConfig {
            min_batch_size: 1,
            batch_timeout_ms: 100,
            ..Default::default()
        };

        let service = OptimizationService::new(
            answer_cache,
            Arc::new(MockEmbeddingProvider::new("mock", 4)),
            Arc::new(MockLlmProvider::new("mock").with_response(LlmResponse::new(
                "r1".into(),
                "m".into(),
                Message::assistant("A generated test answer."),
            ))),
            search,
            GenerationSettings::default(),
            Arc::new(ConfigHandle::new(config).unwrap()),
        );

        AppState::new(Arc::new(service))
    }
}
