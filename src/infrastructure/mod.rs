//! Infrastructure layer - concrete implementations of the domain boundaries

pub mod answer_cache;
pub mod batch;
pub mod cache;
pub mod embedding;
pub mod llm;
pub mod logging;
pub mod search;
pub mod services;
