//! Application services - the semantic answer cache and the manager

mod answer_cache_service;
mod optimization_service;

pub use answer_cache_service::{AnswerCacheService, ClearScope, SemanticHit};
pub use optimization_service::{
    AnswerSource, GeneratedAnswer, GenerationSettings, OptimizationService,
};
