//! Cache key generation and question normalization

use sha2::{Digest, Sha256};

/// Payload kinds stored in the cache, each with its own key namespace so a
/// type-scoped clear can remove one kind without touching the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheNamespace {
    /// Cached generated answers, keyed by normalized question text
    Answer,
    /// Cached embedding vectors, keyed by the embedded text
    Embedding,
    /// Cached search results, keyed by query + parameters
    Search,
}

impl CacheNamespace {
    /// Key prefix for this namespace, including the separator
    pub fn prefix(&self) -> &'static str {
        match self {
            CacheNamespace::Answer => "answer:",
            CacheNamespace::Embedding => "embed:",
            CacheNamespace::Search => "search:",
        }
    }

    /// Wildcard pattern matching every key in this namespace
    pub fn pattern(&self) -> String {
        format!("{}*", self.prefix())
    }
}

impl std::fmt::Display for CacheNamespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheNamespace::Answer => write!(f, "answer"),
            CacheNamespace::Embedding => write!(f, "embedding"),
            CacheNamespace::Search => write!(f, "search"),
        }
    }
}

impl std::str::FromStr for CacheNamespace {
    type Err = crate::domain::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "answer" | "answers" => Ok(CacheNamespace::Answer),
            "embedding" | "embed" => Ok(CacheNamespace::Embedding),
            "search" => Ok(CacheNamespace::Search),
            _ => Err(crate::domain::DomainError::validation(format!(
                "Unknown cache type: {}. Valid types: answer, embedding, search, all",
                s
            ))),
        }
    }
}

/// Builds a namespaced cache key from the identity text of a payload.
///
/// The key is `<prefix><sha256(text)[..16]>`; 16 hex chars keep keys short
/// while making collisions across distinct questions negligible.
pub fn namespaced_key(namespace: CacheNamespace, text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    format!("{}{}", namespace.prefix(), &hex::encode(digest)[..16])
}

/// Normalizes a question for exact-match caching: trim, casefold, collapse
/// internal whitespace runs to single spaces.
pub fn normalize_question(question: &str) -> String {
    question
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
