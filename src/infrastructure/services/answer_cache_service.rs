//! Semantic answer cache service
//!
//! Two-tier lookup over the shared cache store: an exact tier keyed by the
//! hash of the normalized question, and a similarity tier that probes the
//! recent-window embedding index. Writes on the response path are
//! fire-and-forget: a failed cache write is logged and never delays or
//! fails the response that has already been computed.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::answer_cache::{AnswerCacheConfig, CacheSource, CachedAnswer, EmbeddingIndex};
use crate::domain::cache::{namespaced_key, Cache, CacheExt, CacheNamespace};
use crate::domain::DomainError;

/// A semantic cache hit, with how it was found
#[derive(Debug, Clone)]
pub struct SemanticHit {
    pub answer: CachedAnswer,
    pub similarity: f32,
}

/// Outcome of a cache clear, per namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearScope {
    All,
    Answer,
    Embedding,
    Search,
}

impl std::str::FromStr for ClearScope {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(ClearScope::All);
        }

        match s.parse::<CacheNamespace>()? {
            CacheNamespace::Answer => Ok(ClearScope::Answer),
            CacheNamespace::Embedding => Ok(ClearScope::Embedding),
            CacheNamespace::Search => Ok(ClearScope::Search),
        }
    }
}

/// Semantic answer cache over a shared store and an embedding index
#[derive(Debug, Clone)]
pub struct AnswerCacheService {
    store: Arc<dyn Cache>,
    index: Arc<dyn EmbeddingIndex>,
    config: AnswerCacheConfig,
}

impl AnswerCacheService {
    pub fn new(
        store: Arc<dyn Cache>,
        index: Arc<dyn EmbeddingIndex>,
        config: AnswerCacheConfig,
    ) -> Self {
        Self {
            store,
            index,
            config,
        }
    }

    /// Exact-match tier: one store round trip on the normalized question
    pub async fn lookup_exact(
        &self,
        normalized_question: &str,
    ) -> Result<Option<CachedAnswer>, DomainError> {
        let key = namespaced_key(CacheNamespace::Answer, normalized_question);
        self.store.get(&key).await
    }

    /// Similarity tier: probe the embedding index, then fetch the matched
    /// entry. A window match whose entry has expired from the store counts
    /// as a miss.
    pub async fn lookup_semantic(
        &self,
        embedding: &[f32],
        threshold: f32,
    ) -> Result<Option<SemanticHit>, DomainError> {
        let Some(similar) = self.index.find_similar(embedding, threshold).await? else {
            return Ok(None);
        };

        let entry: Option<CachedAnswer> = self.store.get(&similar.answer_key).await?;

        Ok(entry.map(|answer| SemanticHit {
            answer,
            similarity: similar.similarity,
        }))
    }

    /// Writes the answer under the exact key and registers its embedding in
    /// the similarity index
    pub async fn store_answer(
        &self,
        normalized_question: &str,
        embedding: Vec<f32>,
        answer: &str,
    ) -> Result<(), DomainError> {
        let key = namespaced_key(CacheNamespace::Answer, normalized_question);
        let entry = CachedAnswer::new(normalized_question, answer);

        self.store
            .set(&key, &entry, self.config.answer_ttl())
            .await?;
        self.index.insert(key, embedding).await?;

        Ok(())
    }

    /// Fire-and-forget variant of [`store_answer`](Self::store_answer)
    pub fn store_answer_detached(
        &self,
        normalized_question: String,
        embedding: Vec<f32>,
        answer: String,
    ) {
        let service = self.clone();
        tokio::spawn(async move {
            if let Err(e) = service
                .store_answer(&normalized_question, embedding, &answer)
                .await
            {
                warn!("Answer cache write failed: {}", e);
            }
        });
    }

    /// Registers a new question's exact key against an answer that was just
    /// served from the similarity tier, so the next identical question hits
    /// the exact tier directly.
    pub fn register_alias_detached(&self, normalized_question: String, answer: String) {
        let service = self.clone();
        tokio::spawn(async move {
            let key = namespaced_key(CacheNamespace::Answer, &normalized_question);
            let entry = CachedAnswer::new(&normalized_question, &answer)
                .with_source(CacheSource::Semantic);

            if let Err(e) = service
                .store
                .set(&key, &entry, service.config.answer_ttl())
                .await
            {
                warn!("Answer alias write failed: {}", e);
            } else {
                debug!("Registered exact alias for semantically matched question");
            }
        });
    }

    /// Cached embedding for a text, if present
    pub async fn get_embedding(&self, text: &str) -> Result<Option<Vec<f32>>, DomainError> {
        let key = namespaced_key(CacheNamespace::Embedding, text);
        self.store.get(&key).await
    }

    /// Fire-and-forget embedding cache write
    pub fn store_embedding_detached(&self, text: String, embedding: Vec<f32>) {
        let service = self.clone();
        tokio::spawn(async move {
            let key = namespaced_key(CacheNamespace::Embedding, &text);
            if let Err(e) = service
                .store
                .set(&key, &embedding, service.config.embedding_ttl())
                .await
            {
                warn!("Embedding cache write failed: {}", e);
            }
        });
    }

    /// Cached search hits for a search-cache key, if present
    pub async fn get_search_results<T>(&self, cache_key: &str) -> Result<Option<T>, DomainError>
    where
        T: serde::de::DeserializeOwned + Send,
    {
        let key = namespaced_key(CacheNamespace::Search, cache_key);
        self.store.get(&key).await
    }

    /// Fire-and-forget search-result cache write
    pub fn store_search_results_detached<T>(&self, cache_key: String, results: &T)
    where
        T: serde::Serialize,
    {
        let payload = match serde_json::to_string(results) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Search cache serialization failed: {}", e);
                return;
            }
        };

        let service = self.clone();
        tokio::spawn(async move {
            let key = namespaced_key(CacheNamespace::Search, &cache_key);
            if let Err(e) = service
                .store
                .set_raw(&key, &payload, service.config.answer_ttl())
                .await
            {
                warn!("Search cache write failed: {}", e);
            }
        });
    }

    /// Clears one namespace (or everything), returning the number of
    /// deleted store entries
    pub async fn clear(&self, scope: ClearScope) -> Result<usize, DomainError> {
        let deleted = match scope {
            ClearScope::All => {
                let mut total = 0;
                for ns in [
                    CacheNamespace::Answer,
                    CacheNamespace::Embedding,
                    CacheNamespace::Search,
                ] {
                    total += self.store.delete_pattern(&ns.pattern()).await?;
                }
                self.index.clear().await?;
                total
            }
            ClearScope::Answer => {
                let deleted = self
                    .store
                    .delete_pattern(&CacheNamespace::Answer.pattern())
                    .await?;
                self.index.clear().await?;
                deleted
            }
            ClearScope::Embedding => {
                self.store
                    .delete_pattern(&CacheNamespace::Embedding.pattern())
                    .await?
            }
            ClearScope::Search => {
                self.store
                    .delete_pattern(&CacheNamespace::Search.pattern())
                    .await?
            }
        };

        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::MockCache;
    use crate::infrastructure::answer_cache::RecentWindowIndex;
    use std::time::Duration;

    fn service() -> AnswerCacheService {
        AnswerCacheService::new(
            Arc::new(MockCache::new()),
            Arc::new(RecentWindowIndex::new(16)),
            AnswerCacheConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_exact_roundtrip() {
        let service = service();

        service
            .store_answer("how do i cancel?", vec![1.0, 0.0], "Open settings.")
            .await
            .unwrap();

        let hit = service.lookup_exact("how do i cancel?").await.unwrap();
        assert_eq!(hit.unwrap().answer(), "Open settings.");

        let miss = service.lookup_exact("unrelated question").await.unwrap();
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn test_semantic_hit_at_threshold() {
        let service = service();

        service
            .store_answer("how do i cancel?", vec![1.0, 0.0], "Open settings.")
            .await
            .unwrap();

        // identical embedding: similarity 1.0 >= 0.8
        let hit = service.lookup_semantic(&[1.0, 0.0], 0.8).await.unwrap();
        let hit = hit.unwrap();
        assert_eq!(hit.answer.answer(), "Open settings.");
        assert!(hit.similarity > 0.99);
    }

    #[tokio::test]
    async fn test_semantic_miss_below_threshold() {
        let service = service();

        service
            .store_answer("how do i cancel?", vec![1.0, 0.0], "Open settings.")
            .await
            .unwrap();

        let miss = service.lookup_semantic(&[0.0, 1.0], 0.8).await.unwrap();
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn test_semantic_hit_with_expired_entry_is_miss() {
        let store = Arc::new(MockCache::new());
        let index = Arc::new(RecentWindowIndex::new(16));
        let service = AnswerCacheService::new(
            store.clone(),
            index.clone(),
            AnswerCacheConfig::default(),
        );

        service
            .store_answer("q", vec![1.0, 0.0], "a")
            .await
            .unwrap();

        // entry evicted from the store while the window still knows it
        let key = namespaced_key(CacheNamespace::Answer, "q");
        store.delete(&key).await.unwrap();

        let miss = service.lookup_semantic(&[1.0, 0.0], 0.8).await.unwrap();
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn test_embedding_cache_roundtrip() {
        let service = service();

        service.store_embedding_detached("text".into(), vec![0.5, 0.5]);

        // detached write: give the spawned task a moment
        tokio::time::sleep(Duration::from_millis(50)).await;

        let cached = service.get_embedding("text").await.unwrap();
        assert_eq!(cached, Some(vec![0.5, 0.5]));
    }

    #[tokio::test]
    async fn test_register_alias_makes_exact_hit() {
        let service = service();

        service.register_alias_detached("reworded question".into(), "Open settings.".into());
        tokio::time::sleep(Duration::from_millis(50)).await;

        let hit = service.lookup_exact("reworded question").await.unwrap();
        assert_eq!(hit.unwrap().answer(), "Open settings.");
    }

    #[tokio::test]
    async fn test_selective_clear_embedding_keeps_answers() {
        let service = service();

        service
            .store_answer("q1", vec![1.0, 0.0], "a1")
            .await
            .unwrap();
        service.store_embedding_detached("q1".into(), vec![1.0, 0.0]);
        tokio::time::sleep(Duration::from_millis(50)).await;

        let deleted = service.clear(ClearScope::Embedding).await.unwrap();
        assert_eq!(deleted, 1);

        // answers survive an embedding-scoped clear
        let hit = service.lookup_exact("q1").await.unwrap();
        assert!(hit.is_some());
        assert!(service.get_embedding("q1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear_all() {
        let service = service();

        service
            .store_answer("q1", vec![1.0, 0.0], "a1")
            .await
            .unwrap();
        service.store_embedding_detached("q1".into(), vec![1.0, 0.0]);
        tokio::time::sleep(Duration::from_millis(50)).await;

        let deleted = service.clear(ClearScope::All).await.unwrap();
        assert_eq!(deleted, 2);

        assert!(service.lookup_exact("q1").await.unwrap().is_none());
        assert!(service
            .lookup_semantic(&[1.0, 0.0], 0.5)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_detached_write_failure_does_not_propagate() {
        let store = Arc::new(MockCache::new().with_error("store down"));
        let service = AnswerCacheService::new(
            store,
            Arc::new(RecentWindowIndex::new(16)),
            AnswerCacheConfig::default(),
        );

        // must not panic or fail; the write error is logged and dropped
        service.store_answer_detached("q".into(), vec![1.0], "a".into());
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[test]
    fn test_clear_scope_parsing() {
        assert_eq!("all".parse::<ClearScope>().unwrap(), ClearScope::All);
        assert_eq!(
            "embedding".parse::<ClearScope>().unwrap(),
            ClearScope::Embedding
        );
        assert_eq!("answer".parse::<ClearScope>().unwrap(), ClearScope::Answer);
        assert_eq!("search".parse::<ClearScope>().unwrap(), ClearScope::Search);
        assert!("bogus".parse::<ClearScope>().is_err());
    }
}
