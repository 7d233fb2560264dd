//! Batch infrastructure - the coalescer and upstream executors

mod coalescer;
mod executors;

pub use coalescer::BatchCoalescer;
pub use executors::{ChatBatchExecutor, EmbeddingBatchExecutor};
