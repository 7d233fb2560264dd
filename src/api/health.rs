//! Health check endpoint

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use serde::Serialize;

use super::state::AppState;

/// Health response with an optimization summary
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub timestamp: String,
    pub optimization: OptimizationSummary,
}

/// Health check status
#[derive(Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Headline optimization numbers surfaced with liveness
#[derive(Serialize)]
pub struct OptimizationSummary {
    pub cache_hit_rate: f64,
    pub api_calls_saved: u64,
    pub avg_processing_time_ms: f64,
    pub batches_formed: u64,
}

/// Handles `GET /health`
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let stats = state.optimization.stats_snapshot();

    let response = HealthResponse {
        status: HealthStatus::Healthy,
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
        optimization: OptimizationSummary {
            cache_hit_rate: stats.cache_hit_rate,
            api_calls_saved: stats.api_calls_saved,
            avg_processing_time_ms: stats.avg_processing_time_ms,
            batches_formed: stats.batches_formed,
        },
    };

    (StatusCode::OK, Json(response))
}

/// Liveness check for process supervisors
pub async fn live_check() -> impl IntoResponse {
    StatusCode::OK
}
