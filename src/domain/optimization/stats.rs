//! Process-wide optimization statistics
//!
//! Raw counters are atomics mutated by every pipeline stage; derived rates
//! are computed at snapshot time, never stored.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Cumulative counters shared by all in-flight requests
#[derive(Debug, Default)]
pub struct OptimizationStats {
    exact_hits: AtomicU64,
    semantic_hits: AtomicU64,
    embedding_hits: AtomicU64,
    misses: AtomicU64,
    cache_errors: AtomicU64,
    api_calls: AtomicU64,
    api_calls_saved: AtomicU64,
    batches_formed: AtomicU64,
    batched_units: AtomicU64,
    immediate_calls: AtomicU64,
    searches: AtomicU64,
    layers_queried: AtomicU64,
    early_terminations: AtomicU64,
    requests: AtomicU64,
    total_processing_ms: AtomicU64,
}

impl OptimizationStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_exact_hit(&self) {
        self.exact_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_semantic_hit(&self) {
        self.semantic_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_embedding_hit(&self) {
        self.embedding_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_error(&self) {
        self.cache_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_api_call(&self) {
        self.api_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_api_calls_saved(&self, count: u64) {
        self.api_calls_saved.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_batch(&self, units: u64) {
        self.batches_formed.fetch_add(1, Ordering::Relaxed);
        self.batched_units.fetch_add(units, Ordering::Relaxed);
        if units > 1 {
            // one upstream call served units-1 extra callers
            self.api_calls_saved.fetch_add(units - 1, Ordering::Relaxed);
        }
    }

    pub fn record_immediate_call(&self) {
        self.immediate_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_search(&self, layers_queried: u64, early_terminated: bool) {
        self.searches.fetch_add(1, Ordering::Relaxed);
        self.layers_queried
            .fetch_add(layers_queried, Ordering::Relaxed);
        if early_terminated {
            self.early_terminations.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_request(&self, processing_ms: u64) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.total_processing_ms
            .fetch_add(processing_ms, Ordering::Relaxed);
    }

    /// Resets every counter to zero (explicit operator action)
    pub fn reset(&self) {
        self.exact_hits.store(0, Ordering::Relaxed);
        self.semantic_hits.store(0, Ordering::Relaxed);
        self.embedding_hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.cache_errors.store(0, Ordering::Relaxed);
        self.api_calls.store(0, Ordering::Relaxed);
        self.api_calls_saved.store(0, Ordering::Relaxed);
        self.batches_formed.store(0, Ordering::Relaxed);
        self.batched_units.store(0, Ordering::Relaxed);
        self.immediate_calls.store(0, Ordering::Relaxed);
        self.searches.store(0, Ordering::Relaxed);
        self.layers_queried.store(0, Ordering::Relaxed);
        self.early_terminations.store(0, Ordering::Relaxed);
        self.requests.store(0, Ordering::Relaxed);
        self.total_processing_ms.store(0, Ordering::Relaxed);
    }

    /// Consistent point-in-time view with derived fields computed at read time
    pub fn snapshot(&self) -> StatsSnapshot {
        let exact_hits = self.exact_hits.load(Ordering::Relaxed);
        let semantic_hits = self.semantic_hits.load(Ordering::Relaxed);
        let embedding_hits = self.embedding_hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let batches_formed = self.batches_formed.load(Ordering::Relaxed);
        let batched_units = self.batched_units.load(Ordering::Relaxed);
        let requests = self.requests.load(Ordering::Relaxed);
        let total_processing_ms = self.total_processing_ms.load(Ordering::Relaxed);

        let lookups = exact_hits + semantic_hits + misses;
        let cache_hit_rate = if lookups == 0 {
            0.0
        } else {
            (exact_hits + semantic_hits) as f64 / lookups as f64
        };

        let avg_batch_size = if batches_formed == 0 {
            0.0
        } else {
            batched_units as f64 / batches_formed as f64
        };

        let avg_processing_time_ms = if requests == 0 {
            0.0
        } else {
            total_processing_ms as f64 / requests as f64
        };

        StatsSnapshot {
            exact_hits,
            semantic_hits,
            embedding_hits,
            misses,
            cache_errors: self.cache_errors.load(Ordering::Relaxed),
            cache_hit_rate,
            api_calls: self.api_calls.load(Ordering::Relaxed),
            api_calls_saved: self.api_calls_saved.load(Ordering::Relaxed),
            batches_formed,
            batched_units,
            avg_batch_size,
            immediate_calls: self.immediate_calls.load(Ordering::Relaxed),
            searches: self.searches.load(Ordering::Relaxed),
            layers_queried: self.layers_queried.load(Ordering::Relaxed),
            early_terminations: self.early_terminations.load(Ordering::Relaxed),
            requests,
            avg_processing_time_ms,
        }
    }
}

/// Serializable statistics snapshot returned by the stats endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub exact_hits: u64,
    pub semantic_hits: u64,
    pub embedding_hits: u64,
    pub misses: u64,
    pub cache_errors: u64,
    pub cache_hit_rate: f64,
    pub api_calls: u64,
    pub api_calls_saved: u64,
    pub batches_formed: u64,
    pub batched_units: u64,
    pub avg_batch_size: f64,
    pub immediate_calls: u64,
    pub searches: u64,
    pub layers_queried: u64,
    pub early_terminations: u64,
    pub requests: u64,
    pub avg_processing_time_ms: f64,
}
