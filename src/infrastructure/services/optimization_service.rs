//! Optimization manager
//!
//! Orchestrates the full answer pipeline: exact cache tier, embedding
//! (cache + coalescer), semantic cache tier, adaptive layered search, and
//! the batched completion call, writing results back into the cache. Also
//! owns the process-wide statistics and the live configuration handle.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::domain::batch::BatchExecutor;
use crate::domain::cache::normalize_question;
use crate::domain::embedding::{EmbeddingProvider, EmbeddingRequest};
use crate::domain::llm::{LlmProvider, LlmRequest};
use crate::domain::optimization::{
    ConfigHandle, OptimizationConfig, OptimizationConfigUpdate, OptimizationStats, StatsSnapshot,
};
use crate::domain::search::{SearchHit, SearchState};
use crate::domain::DomainError;
use crate::infrastructure::batch::{BatchCoalescer, ChatBatchExecutor, EmbeddingBatchExecutor};
use crate::infrastructure::search::AdaptiveSearchController;

use super::answer_cache_service::{AnswerCacheService, ClearScope};

/// Model and prompt settings for the generation path
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub embedding_model: String,
    pub chat_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub system_prompt: String,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            embedding_model: "text-embedding-3-small".to_string(),
            chat_model: "gpt-3.5-turbo".to_string(),
            temperature: 0.5,
            max_tokens: 600,
            system_prompt: "You are a support assistant for a question answering \
                            service. Use the provided reference Q&A pairs when they \
                            are relevant. Answer concisely and accurately, and say \
                            so when the references do not cover the question."
                .to_string(),
        }
    }
}

/// Where a served answer came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerSource {
    ExactCache,
    SemanticCache,
    Generated,
}

/// A served answer with its provenance
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedAnswer {
    pub answer: String,
    pub source: AnswerSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f32>,
    pub context_hits: usize,
    pub processing_time_ms: u64,
}

/// The cost-optimization layer in front of the embedding API, the vector
/// index, and the chat-completion API
#[derive(Debug)]
pub struct OptimizationService {
    answer_cache: AnswerCacheService,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    llm_provider: Arc<dyn LlmProvider>,
    embedding_coalescer: BatchCoalescer<String, Vec<f32>>,
    chat_coalescer: BatchCoalescer<String, String>,
    search: AdaptiveSearchController,
    settings: GenerationSettings,
    config: Arc<ConfigHandle>,
    stats: Arc<OptimizationStats>,
}

impl OptimizationService {
    pub fn new(
        answer_cache: AnswerCacheService,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        llm_provider: Arc<dyn LlmProvider>,
        search: AdaptiveSearchController,
        settings: GenerationSettings,
        config: Arc<ConfigHandle>,
    ) -> Self {
        let stats = Arc::new(OptimizationStats::new());

        let embedding_executor: Arc<dyn BatchExecutor<String, Vec<f32>>> =
            Arc::new(EmbeddingBatchExecutor::new(
                embedding_provider.clone(),
                settings.embedding_model.clone(),
            ));
        let embedding_coalescer =
            BatchCoalescer::new("embedding", embedding_executor, config.clone(), stats.clone());

        let chat_executor: Arc<dyn BatchExecutor<String, String>> = Arc::new(
            ChatBatchExecutor::new(
                llm_provider.clone(),
                settings.chat_model.clone(),
                settings.system_prompt.clone(),
            )
            .with_temperature(settings.temperature)
            .with_max_tokens_per_unit(settings.max_tokens),
        );
        let chat_coalescer =
            BatchCoalescer::new("completion", chat_executor, config.clone(), stats.clone());

        Self {
            answer_cache,
            embedding_provider,
            llm_provider,
            embedding_coalescer,
            chat_coalescer,
            search,
            settings,
            config,
            stats,
        }
    }

    /// Answers one question through the optimization pipeline.
    ///
    /// The configuration snapshot is captured once here; a concurrent
    /// config update does not affect this request.
    pub async fn generate_answer(
        &self,
        question: &str,
        lang: &str,
    ) -> Result<GeneratedAnswer, DomainError> {
        let started = Instant::now();
        let config = self.config.current();

        let normalized = normalize_question(question);
        if normalized.is_empty() {
            return Err(DomainError::validation("question must not be empty"));
        }

        // Tier 1: exact match on the normalized question
        if config.enable_smart_caching {
            match self.answer_cache.lookup_exact(&normalized).await {
                Ok(Some(hit)) => {
                    self.stats.record_exact_hit();
                    // embedding, search and completion all avoided
                    self.stats.record_api_calls_saved(3);

                    return Ok(self.finish(
                        hit.answer().to_string(),
                        AnswerSource::ExactCache,
                        None,
                        0,
                        started,
                    ));
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("Exact cache lookup degraded to miss: {}", e);
                    self.stats.record_cache_error();
                }
            }
        }

        let embedding = self.embed_question(&normalized, &config).await?;

        // Tier 2: similarity match against recently cached answers
        if config.enable_smart_caching {
            match self
                .answer_cache
                .lookup_semantic(&embedding, config.similarity_threshold)
                .await
            {
                Ok(Some(hit)) => {
                    self.stats.record_semantic_hit();
                    // search and completion avoided
                    self.stats.record_api_calls_saved(2);

                    // self-reinforcing warm-up: next time this phrasing is
                    // an exact hit
                    self.answer_cache
                        .register_alias_detached(normalized, hit.answer.answer().to_string());

                    return Ok(self.finish(
                        hit.answer.answer().to_string(),
                        AnswerSource::SemanticCache,
                        Some(hit.similarity),
                        0,
                        started,
                    ));
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("Semantic cache lookup degraded to miss: {}", e);
                    self.stats.record_cache_error();
                }
            }
        }

        let hits = self.retrieve_context(&normalized, &embedding, &config).await;

        let prompt = build_prompt(question, lang, &hits);
        let answer = if config.enable_batch_processing {
            self.chat_coalescer.submit(prompt).await?
        } else {
            self.stats.record_immediate_call();
            self.stats.record_api_call();

            let request = LlmRequest::builder()
                .system(self.settings.system_prompt.clone())
                .user(prompt)
                .temperature(self.settings.temperature)
                .max_tokens(self.settings.max_tokens)
                .build();

            self.llm_provider
                .chat(&self.settings.chat_model, request)
                .await?
                .content()
                .trim()
                .to_string()
        };

        if config.enable_smart_caching {
            self.answer_cache
                .store_answer_detached(normalized, embedding, answer.clone());
        }

        self.stats.record_miss();
        Ok(self.finish(answer, AnswerSource::Generated, None, hits.len(), started))
    }

    /// Embedding for the normalized question: embedding cache first, then
    /// the coalesced (or immediate) embeddings call
    async fn embed_question(
        &self,
        text: &str,
        config: &OptimizationConfig,
    ) -> Result<Vec<f32>, DomainError> {
        if config.enable_smart_caching {
            match self.answer_cache.get_embedding(text).await {
                Ok(Some(vector)) => {
                    self.stats.record_embedding_hit();
                    self.stats.record_api_calls_saved(1);
                    return Ok(vector);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("Embedding cache lookup degraded to miss: {}", e);
                    self.stats.record_cache_error();
                }
            }
        }

        let vector = if config.enable_batch_processing {
            self.embedding_coalescer.submit(text.to_string()).await?
        } else {
            self.stats.record_immediate_call();
            self.stats.record_api_call();

            let request = EmbeddingRequest::single(&self.settings.embedding_model, text);
            let response = self.embedding_provider.embed(request).await?;

            response
                .first()
                .map(|e| e.vector().to_vec())
                .ok_or_else(|| {
                    DomainError::provider(
                        self.embedding_provider.provider_name(),
                        "no embedding returned",
                    )
                })?
        };

        if config.enable_smart_caching {
            self.answer_cache
                .store_embedding_detached(text.to_string(), vector.clone());
        }

        Ok(vector)
    }

    /// Supporting context from the vector index, with result caching.
    ///
    /// `SearchUnavailable` degrades to answering without retrieved context;
    /// the generation call itself still decides whether the request fails.
    async fn retrieve_context(
        &self,
        normalized: &str,
        embedding: &[f32],
        config: &OptimizationConfig,
    ) -> Vec<SearchHit> {
        let search_key = format!(
            "{}|k={}|t={:.3}",
            normalized, config.top_k, config.similarity_threshold
        );

        if config.enable_smart_caching {
            match self
                .answer_cache
                .get_search_results::<Vec<SearchHit>>(&search_key)
                .await
            {
                Ok(Some(hits)) => {
                    debug!("Search result cache hit ({} hits)", hits.len());
                    self.stats.record_api_calls_saved(1);
                    return hits;
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("Search cache lookup degraded to miss: {}", e);
                    self.stats.record_cache_error();
                }
            }
        }

        match self.search.search(embedding.to_vec(), config).await {
            Ok(outcome) => {
                let early = outcome.state == SearchState::Satisfied;
                self.stats
                    .record_search(outcome.layers_queried as u64, early);

                if early {
                    let skipped = self.search.layer_count() - outcome.layers_queried;
                    self.stats.record_api_calls_saved(skipped as u64);
                }

                if config.enable_smart_caching && !outcome.hits.is_empty() {
                    self.answer_cache
                        .store_search_results_detached(search_key, &outcome.hits);
                }

                outcome.hits
            }
            Err(e) => {
                warn!("Search unavailable, answering without context: {}", e);
                Vec::new()
            }
        }
    }

    fn finish(
        &self,
        answer: String,
        source: AnswerSource,
        similarity: Option<f32>,
        context_hits: usize,
        started: Instant,
    ) -> GeneratedAnswer {
        let processing_time_ms = started.elapsed().as_millis() as u64;
        self.stats.record_request(processing_time_ms);

        GeneratedAnswer {
            answer,
            source,
            similarity,
            context_hits,
            processing_time_ms,
        }
    }

    /// Point-in-time statistics snapshot
    pub fn stats_snapshot(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Resets all statistics counters
    pub fn reset_stats(&self) {
        self.stats.reset();
        info!("Optimization statistics reset");
    }

    /// Clears the named cache scope, returning deleted entry count
    pub async fn clear_cache(&self, scope: ClearScope) -> Result<usize, DomainError> {
        let deleted = self.answer_cache.clear(scope).await?;
        info!("Cache clear ({:?}) removed {} entries", scope, deleted);
        Ok(deleted)
    }

    /// Applies a partial configuration update atomically
    pub fn update_config(
        &self,
        update: &OptimizationConfigUpdate,
    ) -> Result<OptimizationConfig, DomainError> {
        let applied = self.config.update(update)?;
        info!("Optimization config updated: {:?}", applied);
        Ok((*applied).clone())
    }

    /// The currently active configuration snapshot
    pub fn current_config(&self) -> OptimizationConfig {
        (*self.config.current()).clone()
    }

    /// Flushes open batches and stops the coalescer workers
    pub async fn shutdown(&self) {
        futures::future::join(
            self.embedding_coalescer.shutdown(),
            self.chat_coalescer.shutdown(),
        )
        .await;
        info!("Optimization service shut down, open batches flushed");
    }
}

/// Builds the user prompt for one question, with retrieved reference pairs
fn build_prompt(question: &str, lang: &str, hits: &[SearchHit]) -> String {
    let mut sections = Vec::new();

    let references: Vec<String> = hits
        .iter()
        .take(5)
        .enumerate()
        .filter_map(|(i, hit)| {
            let q = hit.metadata_str("question")?;
            let a = hit.metadata_str("answer")?;
            Some(format!("{}. Q: {}\n   A: {}", i + 1, q, a))
        })
        .collect();

    if !references.is_empty() {
        sections.push(format!("Reference Q&A pairs:\n{}", references.join("\n")));
    }

    sections.push(format!("Question: {}", question.trim()));

    if lang != "auto" && !lang.is_empty() {
        sections.push(format!("Answer in: {}", lang));
    }

    sections.join("\n\n")
}
