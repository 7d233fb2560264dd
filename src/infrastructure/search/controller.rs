//! Adaptive layered search controller
//!
//! Runs the query vector through the configured layers in priority order
//! and decides after each layer whether the accumulated results are good
//! enough to stop. Early termination is the main API-call-reduction lever:
//! most queries resolve within the first one or two layers.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::domain::optimization::OptimizationConfig;
use crate::domain::search::{
    SearchHit, SearchLayer, SearchOutcome, SearchRequest, SearchState, VectorIndex,
};
use crate::domain::DomainError;

/// Layered vector search with early termination
#[derive(Debug)]
pub struct AdaptiveSearchController {
    index: Arc<dyn VectorIndex>,
    layers: Vec<SearchLayer>,
    layer_timeout: Duration,
}

impl AdaptiveSearchController {
    pub fn new(index: Arc<dyn VectorIndex>, layers: Vec<SearchLayer>) -> Self {
        Self {
            index,
            layers,
            layer_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_layer_timeout(mut self, timeout: Duration) -> Self {
        self.layer_timeout = timeout;
        self
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Runs the layered search under the captured configuration snapshot.
    ///
    /// A failed layer contributes an empty result and the search continues;
    /// only when every layer fails is `SearchUnavailable` returned.
    pub async fn search(
        &self,
        vector: Vec<f32>,
        config: &OptimizationConfig,
    ) -> Result<SearchOutcome, DomainError> {
        let request = SearchRequest::new(vector, config.top_k, config.similarity_threshold);

        let mut hits: Vec<SearchHit> = Vec::new();
        let mut seen_ids: HashSet<String> = HashSet::new();
        let mut layers_queried = 0usize;
        let mut failed_layers = 0usize;
        let mut state = SearchState::Exhausted;

        // Stopping before the last layer requires both flags: with
        // adaptive_layer_count off the controller always exhausts every
        // layer, which is how recall loss gets measured.
        let may_stop = config.early_termination && config.adaptive_layer_count;

        for layer in &self.layers {
            layers_queried += 1;

            let layer_hits =
                match tokio::time::timeout(self.layer_timeout, self.index.query(layer, &request))
                    .await
                {
                    Ok(Ok(layer_hits)) => layer_hits,
                    Ok(Err(e)) => {
                        warn!("Search layer '{}' failed: {}", layer.name, e);
                        failed_layers += 1;
                        Vec::new()
                    }
                    Err(_) => {
                        warn!(
                            "Search layer '{}' timed out after {:?}",
                            layer.name, self.layer_timeout
                        );
                        failed_layers += 1;
                        Vec::new()
                    }
                };

            debug!(
                "Layer '{}' returned {} candidates",
                layer.name,
                layer_hits.len()
            );

            for mut hit in layer_hits {
                if !seen_ids.insert(hit.id.clone()) {
                    continue;
                }

                hit.weighted_score = hit.score * layer.weight;
                hit.layer = layer.name.clone();
                hits.push(hit);
            }

            if may_stop && self.is_satisfied(&hits, config) {
                info!(
                    "Early termination after layer '{}' ({}/{} layers)",
                    layer.name,
                    layers_queried,
                    self.layers.len()
                );
                state = SearchState::Satisfied;
                break;
            }
        }

        if layers_queried > 0 && failed_layers == layers_queried {
            return Err(DomainError::search_unavailable(format!(
                "all {} search layers failed",
                layers_queried
            )));
        }

        hits.sort_by(|a, b| {
            b.weighted_score
                .partial_cmp(&a.weighted_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(config.top_k);

        Ok(SearchOutcome {
            hits,
            layers_queried,
            state,
        })
    }

    /// The sufficiency condition: best candidate at or above the threshold,
    /// or enough satisfactory candidates accumulated.
    fn is_satisfied(&self, hits: &[SearchHit], config: &OptimizationConfig) -> bool {
        let best = hits
            .iter()
            .map(|h| h.weighted_score)
            .fold(f32::NEG_INFINITY, f32::max);

        let satisfactory = hits
            .iter()
            .filter(|h| h.weighted_score >= config.similarity_threshold)
            .count();

        best >= config.similarity_threshold || satisfactory >= config.min_results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::search::MockVectorIndex;

    fn layers() -> Vec<SearchLayer> {
        vec![
            SearchLayer::new("general", "ns-0"),
            SearchLayer::new("topic", "ns-1").with_weight(0.95),
            SearchLayer::new("detail", "ns-2").with_weight(0.9),
        ]
    }

    fn config() -> OptimizationConfig {
        OptimizationConfig {
            similarity_threshold: 0.8,
            min_results: 3,
            top_k: 5,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_early_termination_stops_after_first_layer() {
        let index = Arc::new(
            MockVectorIndex::new()
                .with_layer_hits("ns-0", vec![SearchHit::new("doc-1", 0.9)])
                .with_layer_hits("ns-1", vec![SearchHit::new("doc-2", 0.85)]),
        );
        let controller = AdaptiveSearchController::new(index.clone(), layers());

        let outcome = controller.search(vec![1.0, 0.0], &config()).await.unwrap();

        assert_eq!(outcome.state, SearchState::Satisfied);
        assert_eq!(outcome.layers_queried, 1);
        assert_eq!(index.queries_for("ns-0"), 1);
        assert_eq!(index.queries_for("ns-1"), 0);
        assert_eq!(index.queries_for("ns-2"), 0);
    }

    #[tokio::test]
    async fn test_early_termination_disabled_queries_all_layers() {
        let index = Arc::new(
            MockVectorIndex::new()
                .with_layer_hits("ns-0", vec![SearchHit::new("doc-1", 0.9)]),
        );
        let controller = AdaptiveSearchController::new(index.clone(), layers());

        let cfg = OptimizationConfig {
            early_termination: false,
            ..config()
        };
        let outcome = controller.search(vec![1.0, 0.0], &cfg).await.unwrap();

        assert_eq!(outcome.state, SearchState::Exhausted);
        assert_eq!(outcome.layers_queried, 3);
        assert_eq!(index.total_queries(), 3);
    }

    #[tokio::test]
    async fn test_adaptive_layer_count_disabled_queries_all_layers() {
        let index = Arc::new(
            MockVectorIndex::new()
                .with_layer_hits("ns-0", vec![SearchHit::new("doc-1", 0.99)]),
        );
        let controller = AdaptiveSearchController::new(index.clone(), layers());

        let cfg = OptimizationConfig {
            adaptive_layer_count: false,
            ..config()
        };
        let outcome = controller.search(vec![1.0, 0.0], &cfg).await.unwrap();

        assert_eq!(outcome.layers_queried, 3);
    }

    #[tokio::test]
    async fn test_below_threshold_continues_to_next_layer() {
        let index = Arc::new(
            MockVectorIndex::new()
                .with_layer_hits("ns-0", vec![SearchHit::new("doc-1", 0.5)])
                .with_layer_hits("ns-1", vec![SearchHit::new("doc-2", 0.95)]),
        );
        let controller = AdaptiveSearchController::new(index.clone(), layers());

        let outcome = controller.search(vec![1.0, 0.0], &config()).await.unwrap();

        assert_eq!(outcome.state, SearchState::Satisfied);
        assert_eq!(outcome.layers_queried, 2);
    }

    #[tokio::test]
    async fn test_failed_layer_is_skipped() {
        let index = Arc::new(
            MockVectorIndex::new()
                .with_layer_failure("ns-0", "connection reset")
                .with_layer_hits("ns-1", vec![SearchHit::new("doc-2", 0.9)]),
        );
        let controller = AdaptiveSearchController::new(index.clone(), layers());

        let outcome = controller.search(vec![1.0, 0.0], &config()).await.unwrap();

        assert_eq!(outcome.hits.len(), 1);
        assert_eq!(outcome.hits[0].id, "doc-2");
    }

    #[tokio::test]
    async fn test_all_layers_failed_is_unavailable() {
        let index = Arc::new(
            MockVectorIndex::new()
                .with_layer_failure("ns-0", "down")
                .with_layer_failure("ns-1", "down")
                .with_layer_failure("ns-2", "down"),
        );
        let controller = AdaptiveSearchController::new(index, layers());

        let cfg = OptimizationConfig {
            early_termination: false,
            ..config()
        };
        let result = controller.search(vec![1.0, 0.0], &cfg).await;

        assert!(matches!(result, Err(DomainError::SearchUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_exhausted_with_empty_results() {
        let index = Arc::new(MockVectorIndex::new());
        let controller = AdaptiveSearchController::new(index, layers());

        let outcome = controller.search(vec![1.0, 0.0], &config()).await.unwrap();

        assert_eq!(outcome.state, SearchState::Exhausted);
        assert!(outcome.hits.is_empty());
        assert_eq!(outcome.layers_queried, 3);
    }

    #[tokio::test]
    async fn test_layer_weights_applied_and_sorted() {
        let index = Arc::new(
            MockVectorIndex::new()
                .with_layer_hits("ns-0", vec![SearchHit::new("doc-a", 0.7)])
                .with_layer_hits("ns-1", vec![SearchHit::new("doc-b", 0.78)]),
        );
        let controller = AdaptiveSearchController::new(index, layers());

        let cfg = OptimizationConfig {
            early_termination: false,
            ..config()
        };
        let outcome = controller.search(vec![1.0, 0.0], &cfg).await.unwrap();

        // doc-b: 0.78 * 0.95 = 0.741 > doc-a: 0.7
        assert_eq!(outcome.hits[0].id, "doc-b");
        assert!((outcome.hits[0].weighted_score - 0.741).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_duplicate_ids_deduplicated_across_layers() {
        let index = Arc::new(
            MockVectorIndex::new()
                .with_layer_hits("ns-0", vec![SearchHit::new("doc-1", 0.6)])
                .with_layer_hits("ns-1", vec![SearchHit::new("doc-1", 0.9)]),
        );
        let controller = AdaptiveSearchController::new(index, layers());

        let cfg = OptimizationConfig {
            early_termination: false,
            ..config()
        };
        let outcome = controller.search(vec![1.0, 0.0], &cfg).await.unwrap();

        assert_eq!(outcome.hits.len(), 1);
        // the first layer's hit wins; later duplicates are dropped
        assert!((outcome.hits[0].weighted_score - 0.6).abs() < 0.001);
    }
}
