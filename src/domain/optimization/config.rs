//! Runtime-tunable optimization configuration
//!
//! The live configuration is an immutable snapshot behind a copy-on-write
//! handle: an update builds and validates a new snapshot, then swaps it in
//! atomically. Operations capture the snapshot once at the start and keep
//! it for their whole lifetime.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Immutable optimization settings snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationConfig {
    /// Consult the semantic answer cache before generating
    #[serde(default = "default_true")]
    pub enable_smart_caching: bool,

    /// Route embedding/completion calls through the batch coalescer
    #[serde(default = "default_true")]
    pub enable_batch_processing: bool,

    /// Batch flush size
    #[serde(default = "default_min_batch_size")]
    pub min_batch_size: usize,

    /// Batch flush timeout in milliseconds
    #[serde(default = "default_batch_timeout_ms")]
    pub batch_timeout_ms: u64,

    /// Allow the search controller to stop before exhausting all layers
    #[serde(default = "default_true")]
    pub adaptive_layer_count: bool,

    /// Evaluate the early-termination condition after each layer
    #[serde(default = "default_true")]
    pub early_termination: bool,

    /// Similarity threshold shared by the semantic cache and search
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Satisfactory-hit count that also triggers early termination
    #[serde(default = "default_min_results")]
    pub min_results: usize,

    /// Candidates requested per search layer
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_true() -> bool {
    true
}

fn default_min_batch_size() -> usize {
    3
}

fn default_batch_timeout_ms() -> u64 {
    2000
}

fn default_similarity_threshold() -> f32 {
    0.8
}

fn default_min_results() -> usize {
    3
}

fn default_top_k() -> usize {
    8
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            enable_smart_caching: true,
            enable_batch_processing: true,
            min_batch_size: default_min_batch_size(),
            batch_timeout_ms: default_batch_timeout_ms(),
            adaptive_layer_count: true,
            early_termination: true,
            similarity_threshold: default_similarity_threshold(),
            min_results: default_min_results(),
            top_k: default_top_k(),
        }
    }
}

impl OptimizationConfig {
    pub fn batch_timeout(&self) -> Duration {
        Duration::from_millis(self.batch_timeout_ms)
    }

    /// Checks every field for a usable value; a failed validation rejects
    /// the whole snapshot, so no partial update can ever be observed.
    pub fn validate(&self) -> Result<(), DomainError> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(DomainError::validation(format!(
                "similarity_threshold must be within [0.0, 1.0], got {}",
                self.similarity_threshold
            )));
        }

        if self.min_batch_size == 0 {
            return Err(DomainError::validation("min_batch_size must be at least 1"));
        }

        if self.batch_timeout_ms == 0 {
            return Err(DomainError::validation("batch_timeout_ms must be positive"));
        }

        if self.top_k == 0 {
            return Err(DomainError::validation("top_k must be at least 1"));
        }

        if self.min_results == 0 {
            return Err(DomainError::validation("min_results must be at least 1"));
        }

        Ok(())
    }

    /// Builds the snapshot that would result from applying a partial update
    pub fn merged(&self, update: &OptimizationConfigUpdate) -> Result<Self, DomainError> {
        let mut next = self.clone();

        if let Some(v) = update.enable_smart_caching {
            next.enable_smart_caching = v;
        }
        if let Some(v) = update.enable_batch_processing {
            next.enable_batch_processing = v;
        }
        if let Some(v) = update.min_batch_size {
            next.min_batch_size = v;
        }
        if let Some(v) = update.batch_timeout_ms {
            next.batch_timeout_ms = v;
        }
        if let Some(v) = update.adaptive_layer_count {
            next.adaptive_layer_count = v;
        }
        if let Some(v) = update.early_termination {
            next.early_termination = v;
        }
        if let Some(v) = update.similarity_threshold {
            next.similarity_threshold = v;
        }
        if let Some(v) = update.min_results {
            next.min_results = v;
        }
        if let Some(v) = update.top_k {
            next.top_k = v;
        }

        next.validate()?;
        Ok(next)
    }
}

/// Partial configuration update; unset fields keep their current value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptimizationConfigUpdate {
    pub enable_smart_caching: Option<bool>,
    pub enable_batch_processing: Option<bool>,
    pub min_batch_size: Option<usize>,
    pub batch_timeout_ms: Option<u64>,
    pub adaptive_layer_count: Option<bool>,
    pub early_termination: Option<bool>,
    pub similarity_threshold: Option<f32>,
    pub min_results: Option<usize>,
    pub top_k: Option<usize>,
}

impl OptimizationConfigUpdate {
    pub fn is_empty(&self) -> bool {
        self.enable_smart_caching.is_none()
            && self.enable_batch_processing.is_none()
            && self.min_batch_size.is_none()
            && self.batch_timeout_ms.is_none()
            && self.adaptive_layer_count.is_none()
            && self.early_termination.is_none()
            && self.similarity_threshold.is_none()
            && self.min_results.is_none()
            && self.top_k.is_none()
    }
}

/// Copy-on-write holder for the live configuration snapshot
#[derive(Debug)]
pub struct ConfigHandle {
    current: RwLock<Arc<OptimizationConfig>>,
}

impl ConfigHandle {
    pub fn new(config: OptimizationConfig) -> Result<Self, DomainError> {
        config.validate()?;
        Ok(Self {
            current: RwLock::new(Arc::new(config)),
        })
    }

    /// The current snapshot; in-flight operations hold the returned Arc for
    /// their whole lifetime so a concurrent update never changes their view.
    pub fn current(&self) -> Arc<OptimizationConfig> {
        self.current.read().expect("config lock poisoned").clone()
    }

    /// Validates and atomically swaps in a new snapshot, returning it
    pub fn update(
        &self,
        update: &OptimizationConfigUpdate,
    ) -> Result<Arc<OptimizationConfig>, DomainError> {
        let mut guard = self.current.write().expect("config lock poisoned");
        let next = Arc::new(guard.merged(update)?);
        *guard = next.clone();
        Ok(next)
    }
}

impl Default for ConfigHandle {
    fn default() -> Self {
        Self {
            current: RwLock::new(Arc::new(OptimizationConfig::default())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = OptimizationConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.enable_smart_caching);
        assert!(config.enable_batch_processing);
        assert_eq!(config.min_batch_size, 3);
        assert!((config.similarity_threshold - 0.8).abs() < f32::EPSILON);
    }

    #[test]
    fn test_validate_rejects_bad_threshold() {
        let config = OptimizationConfig {
            similarity_threshold: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(DomainError::Validation { .. })
        ));
    }

    #[test]
    fn test_merged_applies_partial_update() {
        let base = OptimizationConfig::default();
        let update = OptimizationConfigUpdate {
            similarity_threshold: Some(0.9),
            early_termination: Some(false),
            ..Default::default()
        };

        let next = base.merged(&update).unwrap();

        assert!((next.similarity_threshold - 0.9).abs() < f32::EPSILON);
        assert!(!next.early_termination);
        // untouched fields keep their values
        assert_eq!(next.min_batch_size, base.min_batch_size);
    }

    #[test]
    fn test_merged_rejects_invalid_without_partial_application() {
        let handle = ConfigHandle::default();
        let update = OptimizationConfigUpdate {
            early_termination: Some(false),
            similarity_threshold: Some(2.0),
            ..Default::default()
        };

        assert!(handle.update(&update).is_err());
        // the valid field of the rejected update must not leak through
        assert!(handle.current().early_termination);
    }

    #[test]
    fn test_handle_swaps_atomically() {
        let handle = ConfigHandle::default();
        let before = handle.current();

        let update = OptimizationConfigUpdate {
            min_batch_size: Some(5),
            ..Default::default()
        };
        handle.update(&update).unwrap();

        // captured snapshot is unchanged; new reads see the update
        assert_eq!(before.min_batch_size, 3);
        assert_eq!(handle.current().min_batch_size, 5);
    }

    #[test]
    fn test_update_is_empty() {
        assert!(OptimizationConfigUpdate::default().is_empty());
        let update = OptimizationConfigUpdate {
            top_k: Some(4),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
