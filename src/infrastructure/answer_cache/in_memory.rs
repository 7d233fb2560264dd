//! In-memory recent-window embedding index
//!
//! Holds the embeddings of the most recently cached answers in a bounded
//! window and scans them linearly with cosine similarity. Suitable for the
//! cache sizes this service runs with; larger deployments can swap in a
//! dedicated index behind the same trait.

use std::collections::VecDeque;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::answer_cache::{EmbeddingIndex, SimilarEntry};
use crate::domain::embedding::cosine_similarity;
use crate::domain::DomainError;

#[derive(Debug)]
struct IndexedEmbedding {
    answer_key: String,
    embedding: Vec<f32>,
}

/// Bounded window of (embedding, answer-key) pairs, oldest evicted first
#[derive(Debug)]
pub struct RecentWindowIndex {
    window: RwLock<VecDeque<IndexedEmbedding>>,
    capacity: usize,
}

impl RecentWindowIndex {
    pub fn new(capacity: usize) -> Self {
        Self {
            window: RwLock::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }
}

#[async_trait]
impl EmbeddingIndex for RecentWindowIndex {
    async fn insert(&self, answer_key: String, embedding: Vec<f32>) -> Result<(), DomainError> {
        let mut window = self
            .window
            .write()
            .map_err(|e| DomainError::internal(format!("Failed to acquire write lock: {}", e)))?;

        // re-inserting the same key refreshes its position in the window
        window.retain(|e| e.answer_key != answer_key);

        if window.len() >= self.capacity {
            window.pop_front();
        }

        window.push_back(IndexedEmbedding {
            answer_key,
            embedding,
        });

        Ok(())
    }

    async fn find_similar(
        &self,
        embedding: &[f32],
        threshold: f32,
    ) -> Result<Option<SimilarEntry>, DomainError> {
        let window = self
            .window
            .read()
            .map_err(|e| DomainError::internal(format!("Failed to acquire read lock: {}", e)))?;

        let best = window
            .iter()
            .map(|entry| SimilarEntry {
                answer_key: entry.answer_key.clone(),
                similarity: cosine_similarity(embedding, &entry.embedding),
            })
            .max_by(|a, b| {
                a.similarity
                    .partial_cmp(&b.similarity)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

        Ok(best.filter(|entry| entry.similarity >= threshold))
    }

    async fn clear(&self) -> Result<(), DomainError> {
        self.window
            .write()
            .map_err(|e| DomainError::internal(format!("Failed to acquire write lock: {}", e)))?
            .clear();
        Ok(())
    }

    async fn len(&self) -> Result<usize, DomainError> {
        Ok(self
            .window
            .read()
            .map_err(|e| DomainError::internal(format!("Failed to acquire read lock: {}", e)))?
            .len())
    }
}
