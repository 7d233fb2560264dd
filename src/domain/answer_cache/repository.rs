//! Semantic answer cache types and the embedding index trait

use std::fmt::Debug;
use std::time::SystemTime;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// How a cache entry came to exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheSource {
    /// Written after a full generation for this exact question
    #[default]
    Exact,
    /// Alias registered when a similarity match served this question
    Semantic,
    /// A cached embedding vector
    Embedding,
}

/// A cached question/answer pair, stored as JSON under an `answer:` key.
///
/// Entries are immutable once written; a new computation for the same
/// normalized question overwrites the whole entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedAnswer {
    /// The normalized question this answer was generated for
    question: String,
    /// The generated answer text
    answer: String,
    /// How this entry was created
    #[serde(default)]
    source: CacheSource,
    /// Unix timestamp of creation
    created_at: u64,
}

impl CachedAnswer {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        Self {
            question: question.into(),
            answer: answer.into(),
            source: CacheSource::Exact,
            created_at: now,
        }
    }

    pub fn with_source(mut self, source: CacheSource) -> Self {
        self.source = source;
        self
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn source(&self) -> CacheSource {
        self.source
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }
}

/// A similarity match from the embedding index
#[derive(Debug, Clone)]
pub struct SimilarEntry {
    /// Cache key of the matching answer entry
    pub answer_key: String,
    /// Cosine similarity to the probe vector (0.0 to 1.0)
    pub similarity: f32,
}

/// Index over the embeddings of recently cached answers.
///
/// Backs the second lookup tier of the semantic cache: a bounded window of
/// (embedding, answer-key) pairs scanned by cosine similarity. The metric
/// is an implementation detail of the index, which keeps it pluggable.
#[async_trait]
pub trait EmbeddingIndex: Send + Sync + Debug {
    /// Registers the embedding of a freshly cached answer
    async fn insert(&self, answer_key: String, embedding: Vec<f32>) -> Result<(), DomainError>;

    /// Finds the most similar indexed entry with similarity >= threshold.
    /// A similarity exactly equal to the threshold is a match.
    async fn find_similar(
        &self,
        embedding: &[f32],
        threshold: f32,
    ) -> Result<Option<SimilarEntry>, DomainError>;

    /// Drops all indexed embeddings
    async fn clear(&self) -> Result<(), DomainError>;

    /// Number of indexed embeddings
    async fn len(&self) -> Result<usize, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cached_answer() {
        let entry = CachedAnswer::new("how do i cancel?", "Open settings and...");

        assert_eq!(entry.question(), "how do i cancel?");
        assert_eq!(entry.answer(), "Open settings and...");
        assert_eq!(entry.source(), CacheSource::Exact);
        assert!(entry.created_at() > 0);
    }

    #[test]
    fn test_cached_answer_with_source() {
        let entry = CachedAnswer::new("q", "a").with_source(CacheSource::Semantic);
        assert_eq!(entry.source(), CacheSource::Semantic);
    }

    #[test]
    fn test_cached_answer_roundtrip() {
        let entry = CachedAnswer::new("q", "a");
        let json = serde_json::to_string(&entry).unwrap();
        let back: CachedAnswer = serde_json::from_str(&json).unwrap();

        assert_eq!(back.question(), "q");
        assert_eq!(back.answer(), "a");
    }

    #[test]
    fn test_cache_source_serialization() {
        assert_eq!(
            serde_json::to_string(&CacheSource::Exact).unwrap(),
            "\"exact\""
        );
        assert_eq!(
            serde_json::to_string(&CacheSource::Semantic).unwrap(),
            "\"semantic\""
        );
        assert_eq!(
            serde_json::to_string(&CacheSource::Embedding).unwrap(),
            "\"embedding\""
        );
    }
}
