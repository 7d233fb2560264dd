//! Vector search request/result types

use serde::{Deserialize, Serialize};

/// A single vector similarity search against one layer
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// Query embedding
    pub vector: Vec<f32>,
    /// Number of candidates to request
    pub top_k: usize,
    /// Similarity threshold used for early-termination decisions
    pub similarity_threshold: f32,
}

impl SearchRequest {
    pub fn new(vector: Vec<f32>, top_k: usize, similarity_threshold: f32) -> Self {
        Self {
            vector,
            top_k,
            similarity_threshold,
        }
    }
}

/// A partition of the vector index, queried independently and in a fixed
/// priority order (most general first).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchLayer {
    /// Human-readable layer name (used in logs and errors)
    pub name: String,
    /// Index namespace/partition identifier for this layer
    pub namespace: String,
    /// Score weight applied to hits from this layer
    #[serde(default = "default_weight")]
    pub weight: f32,
}

fn default_weight() -> f32 {
    1.0
}

impl SearchLayer {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            weight: 1.0,
        }
    }

    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = weight;
        self
    }
}

/// A scored candidate returned by a layer query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// Identifier of the matched document
    pub id: String,
    /// Raw similarity score reported by the index
    pub score: f32,
    /// Layer-weighted score used for ranking across layers
    #[serde(default)]
    pub weighted_score: f32,
    /// Name of the layer this hit came from
    #[serde(default)]
    pub layer: String,
    /// Document payload (question, answer, category, ...)
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl SearchHit {
    pub fn new(id: impl Into<String>, score: f32) -> Self {
        Self {
            id: id.into(),
            score,
            weighted_score: score,
            layer: String::new(),
            metadata: serde_json::Value::Null,
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Metadata field as a string, if present
    pub fn metadata_str(&self, field: &str) -> Option<&str> {
        self.metadata.get(field).and_then(|v| v.as_str())
    }
}

/// Terminal state of a layered search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchState {
    /// Early termination fired before the last layer
    Satisfied,
    /// Every layer was queried (possibly with empty results)
    Exhausted,
}

/// Result of a full layered search
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Accumulated hits, sorted by weighted score descending
    pub hits: Vec<SearchHit>,
    /// Number of layers actually queried
    pub layers_queried: usize,
    /// Whether the search terminated early or ran out of layers
    pub state: SearchState,
}

impl SearchOutcome {
    /// Best weighted score across all hits, if any
    pub fn best_score(&self) -> Option<f32> {
        self.hits.first().map(|h| h.weighted_score)
    }
}
