//! Semantic answer cache domain
//!
//! Maps a normalized question (and its embedding) to a previously computed
//! answer, with similarity-based lookup on top of exact matching.

mod config;
mod repository;

pub use config::AnswerCacheConfig;
pub use repository::{CacheSource, CachedAnswer, EmbeddingIndex, SimilarEntry};
