//! Answer generation endpoint

use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::api::types::{ApiError, Json};
use crate::infrastructure::services::AnswerSource;

use super::state::AppState;

fn default_lang() -> String {
    "auto".to_string()
}

/// Request body for `POST /generate_answer`
#[derive(Debug, Deserialize)]
pub struct GenerateAnswerRequest {
    pub question: String,
    #[serde(default = "default_lang")]
    pub lang: String,
}

/// Response body for a successfully generated or cached answer
#[derive(Debug, Serialize)]
pub struct GenerateAnswerResponse {
    pub success: bool,
    pub answer: String,
    pub source: AnswerSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f32>,
    pub context_hits: usize,
    pub processing_time_ms: u64,
}

/// Handles `POST /generate_answer`; suspends through the full pipeline
pub async fn generate_answer(
    State(state): State<AppState>,
    Json(request): Json<GenerateAnswerRequest>,
) -> Result<axum::Json<GenerateAnswerResponse>, ApiError> {
    let result = state
        .optimization
        .generate_answer(&request.question, &request.lang)
        .await?;

    Ok(axum::Json(GenerateAnswerResponse {
        success: true,
        answer: result.answer,
        source: result.source,
        similarity: result.similarity,
        context_hits: result.context_hits,
        processing_time_ms: result.processing_time_ms,
    }))
}
