//! Vector index trait definition

use async_trait::async_trait;
use std::fmt::Debug;

use super::{SearchHit, SearchLayer, SearchRequest};
use crate::domain::DomainError;

/// Trait for remote vector indexes (Pinecone-style services).
///
/// The index itself is an external collaborator; this boundary only knows
/// how to run a top-K similarity query against one layer.
#[async_trait]
pub trait VectorIndex: Send + Sync + Debug {
    /// Query one layer for the top-K candidates closest to the request vector
    async fn query(
        &self,
        layer: &SearchLayer,
        request: &SearchRequest,
    ) -> Result<Vec<SearchHit>, DomainError>;

    /// Get the index name
    fn index_name(&self) -> &str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::RwLock;

    /// Mock vector index with per-layer canned hits, per-layer failure
    /// injection, and a query counter per layer.
    #[derive(Debug, Default)]
    pub struct MockVectorIndex {
        hits: RwLock<HashMap<String, Vec<SearchHit>>>,
        failures: RwLock<HashMap<String, String>>,
        queries: RwLock<HashMap<String, usize>>,
        total_queries: AtomicUsize,
    }

    impl MockVectorIndex {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_layer_hits(self, namespace: impl Into<String>, hits: Vec<SearchHit>) -> Self {
            self.hits.write().unwrap().insert(namespace.into(), hits);
            self
        }

        pub fn with_layer_failure(
            self,
            namespace: impl Into<String>,
            error: impl Into<String>,
        ) -> Self {
            self.failures
                .write()
                .unwrap()
                .insert(namespace.into(), error.into());
            self
        }

        /// Number of queries issued against one layer
        pub fn queries_for(&self, namespace: &str) -> usize {
            self.queries
                .read()
                .unwrap()
                .get(namespace)
                .copied()
                .unwrap_or(0)
        }

        /// Total queries across all layers
        pub fn total_queries(&self) -> usize {
            self.total_queries.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl VectorIndex for MockVectorIndex {
        async fn query(
            &self,
            layer: &SearchLayer,
            request: &SearchRequest,
        ) -> Result<Vec<SearchHit>, DomainError> {
            self.total_queries.fetch_add(1, Ordering::SeqCst);
            *self
                .queries
                .write()
                .unwrap()
                .entry(layer.namespace.clone())
                .or_insert(0) += 1;

            if let Some(error) = self.failures.read().unwrap().get(&layer.namespace) {
                return Err(DomainError::search_layer(&layer.name, error));
            }

            let mut hits = self
                .hits
                .read()
                .unwrap()
                .get(&layer.namespace)
                .cloned()
                .unwrap_or_default();
            hits.truncate(request.top_k);

            Ok(hits)
        }

        fn index_name(&self) -> &str {
            "mock-index"
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_index_returns_canned_hits() {
            let index = MockVectorIndex::new()
                .with_layer_hits("ns-a", vec![SearchHit::new("doc-1", 0.9)]);

            let layer = SearchLayer::new("a", "ns-a");
            let request = SearchRequest::new(vec![1.0, 0.0], 5, 0.8);

            let hits = index.query(&layer, &request).await.unwrap();
            assert_eq!(hits.len(), 1);
            assert_eq!(index.queries_for("ns-a"), 1);
        }

        #[tokio::test]
        async fn test_mock_index_failure_injection() {
            let index = MockVectorIndex::new().with_layer_failure("ns-b", "timeout");

            let layer = SearchLayer::new("b", "ns-b");
            let request = SearchRequest::new(vec![1.0], 5, 0.8);

            let result = index.query(&layer, &request).await;
            assert!(matches!(result, Err(DomainError::SearchLayer { .. })));
        }

        #[tokio::test]
        async fn test_mock_index_truncates_to_top_k() {
            let index = MockVectorIndex::new().with_layer_hits(
                "ns-a",
                vec![
                    SearchHit::new("d1", 0.9),
                    SearchHit::new("d2", 0.8),
                    SearchHit::new("d3", 0.7),
                ],
            );

            let layer = SearchLayer::new("a", "ns-a");
            let request = SearchRequest::new(vec![1.0], 2, 0.8);

            let hits = index.query(&layer, &request).await.unwrap();
            assert_eq!(hits.len(), 2);
        }
    }
}
