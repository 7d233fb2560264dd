//! Upstream executors for batched embedding and chat-completion calls

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::batch::{BatchExecutor, BatchUnitId, UnitResult};
use crate::domain::embedding::{EmbeddingProvider, EmbeddingRequest};
use crate::domain::llm::{LlmProvider, LlmRequest};
use crate::domain::DomainError;

/// Embeds a whole batch of texts with one embeddings call.
///
/// The provider reports each vector with the index of its input; the
/// executor maps indices back to unit ids, so a reordered response still
/// correlates correctly.
#[derive(Debug)]
pub struct EmbeddingBatchExecutor {
    provider: Arc<dyn EmbeddingProvider>,
    model: String,
}

impl EmbeddingBatchExecutor {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }
}

#[async_trait]
impl BatchExecutor<String, Vec<f32>> for EmbeddingBatchExecutor {
    async fn execute(
        &self,
        units: Vec<(BatchUnitId, String)>,
    ) -> Result<Vec<UnitResult<Vec<f32>>>, DomainError> {
        let ids: Vec<BatchUnitId> = units.iter().map(|(id, _)| *id).collect();
        let texts: Vec<String> = units.into_iter().map(|(_, text)| text).collect();

        let request = EmbeddingRequest::batch(&self.model, texts);
        let response = self.provider.embed(request).await?;

        let mut vectors: HashMap<usize, Vec<f32>> = response
            .into_embeddings()
            .into_iter()
            .map(|e| (e.index(), e.into_vector()))
            .collect();

        Ok(ids
            .into_iter()
            .enumerate()
            .map(|(i, id)| match vectors.remove(&i) {
                Some(vector) => (id, Ok(vector)),
                None => (
                    id,
                    Err(DomainError::upstream_batch(format!(
                        "embedding response missing input {}",
                        i
                    ))),
                ),
            })
            .collect())
    }
}

static UNIT_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[\[unit ([0-9a-fA-F-]{36})\]\]").expect("unit marker regex is valid")
});

/// Serves a batch of prompts with one chat-completion call.
///
/// Each prompt is preceded by a `[[unit <id>]]` marker and the model is
/// instructed to repeat the marker before each answer. Correlation uses the
/// marker id rather than position, so a unit whose marker is missing from
/// the response fails individually without touching its batch mates.
#[derive(Debug)]
pub struct ChatBatchExecutor {
    provider: Arc<dyn LlmProvider>,
    model: String,
    system_prompt: String,
    temperature: f32,
    max_tokens_per_unit: u32,
}

impl ChatBatchExecutor {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        model: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            system_prompt: system_prompt.into(),
            temperature: 0.5,
            max_tokens_per_unit: 600,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens_per_unit(mut self, max_tokens: u32) -> Self {
        self.max_tokens_per_unit = max_tokens;
        self
    }

    fn batched_system_prompt(&self) -> String {
        format!(
            "{}\n\nYou will receive several independent requests. Each request \
             starts with a marker line of the form [[unit <id>]]. Answer every \
             request separately, and begin each answer with the exact marker \
             line of the request it answers.",
            self.system_prompt
        )
    }

    async fn execute_single(
        &self,
        id: BatchUnitId,
        prompt: String,
    ) -> Result<Vec<UnitResult<String>>, DomainError> {
        let request = LlmRequest::builder()
            .system(self.system_prompt.clone())
            .user(prompt)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens_per_unit)
            .build();

        let response = self.provider.chat(&self.model, request).await?;

        Ok(vec![(id, Ok(response.content().trim().to_string()))])
    }
}

#[async_trait]
impl BatchExecutor<String, String> for ChatBatchExecutor {
    async fn execute(
        &self,
        units: Vec<(BatchUnitId, String)>,
    ) -> Result<Vec<UnitResult<String>>, DomainError> {
        if units.len() == 1 {
            let (id, prompt) = units.into_iter().next().expect("one unit");
            return self.execute_single(id, prompt).await;
        }

        let ids: Vec<BatchUnitId> = units.iter().map(|(id, _)| *id).collect();

        let combined = units
            .iter()
            .map(|(id, prompt)| format!("[[unit {}]]\n{}", id, prompt))
            .collect::<Vec<_>>()
            .join("\n\n");

        let request = LlmRequest::builder()
            .system(self.batched_system_prompt())
            .user(combined)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens_per_unit * units.len() as u32)
            .build();

        let response = self.provider.chat(&self.model, request).await?;
        let answers = parse_marked_answers(response.content());

        Ok(ids
            .into_iter()
            .map(|id| match answers.get(&id) {
                Some(answer) if !answer.is_empty() => (id, Ok(answer.clone())),
                _ => (
                    id,
                    Err(DomainError::upstream_batch(format!(
                        "batched completion response missing unit {}",
                        id
                    ))),
                ),
            })
            .collect())
    }
}

/// Splits a marker-delimited completion into per-unit answers
fn parse_marked_answers(content: &str) -> HashMap<BatchUnitId, String> {
    let mut answers = HashMap::new();

    let markers: Vec<(BatchUnitId, usize, usize)> = UNIT_MARKER
        .captures_iter(content)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let id: BatchUnitId = caps.get(1)?.as_str().parse().ok()?;
            Some((id, whole.start(), whole.end()))
        })
        .collect();

    for (i, (id, _, body_start)) in markers.iter().enumerate() {
        let body_end = markers
            .get(i + 1)
            .map(|(_, next_start, _)| *next_start)
            .unwrap_or(content.len());

        let answer = content[*body_start..body_end].trim().to_string();
        answers.insert(*id, answer);
    }

    answers
}
