//! Optimization management endpoints: stats, cache clears, config updates

use axum::extract::State;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::types::{ApiError, Json};
use crate::domain::optimization::{OptimizationConfig, OptimizationConfigUpdate, StatsSnapshot};
use crate::infrastructure::services::ClearScope;

use super::state::AppState;

/// Response body for `GET /optimization/stats`
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub success: bool,
    pub stats: StatsSnapshot,
    pub timestamp: String,
}

/// Handles `GET /optimization/stats`
pub async fn get_stats(State(state): State<AppState>) -> axum::Json<StatsResponse> {
    axum::Json(StatsResponse {
        success: true,
        stats: state.optimization.stats_snapshot(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

fn default_clear_type() -> String {
    "all".to_string()
}

/// Request body for `POST /optimization/cache/clear`
#[derive(Debug, Deserialize)]
pub struct ClearCacheRequest {
    #[serde(rename = "type", default = "default_clear_type")]
    pub cache_type: String,
}

/// Response body for a cache clear
#[derive(Debug, Serialize)]
pub struct ClearCacheResponse {
    pub success: bool,
    pub message: String,
    pub cleared_count: usize,
    pub timestamp: String,
}

/// Handles `POST /optimization/cache/clear`; clears only the named namespace
pub async fn clear_cache(
    State(state): State<AppState>,
    Json(request): Json<ClearCacheRequest>,
) -> Result<axum::Json<ClearCacheResponse>, ApiError> {
    let scope: ClearScope = request.cache_type.parse()?;
    let cleared_count = state.optimization.clear_cache(scope).await?;

    Ok(axum::Json(ClearCacheResponse {
        success: true,
        message: format!("Cache cleared: {}", request.cache_type),
        cleared_count,
        timestamp: Utc::now().to_rfc3339(),
    }))
}

/// Settings group for the API manager (caching and batching)
#[derive(Debug, Default, Deserialize)]
pub struct ApiManagerSettings {
    pub enable_smart_caching: Option<bool>,
    pub enable_batch_processing: Option<bool>,
    pub min_batch_size: Option<usize>,
    pub batch_timeout_ms: Option<u64>,
}

/// Settings group for the search service
#[derive(Debug, Default, Deserialize)]
pub struct SearchServiceSettings {
    pub adaptive_layer_count: Option<bool>,
    pub early_termination: Option<bool>,
    pub similarity_threshold: Option<f32>,
    pub min_results: Option<usize>,
    pub top_k: Option<usize>,
}

/// Request body for `POST /optimization/config`
#[derive(Debug, Default, Deserialize)]
pub struct ConfigUpdateRequest {
    #[serde(default)]
    pub api_manager: ApiManagerSettings,
    #[serde(default)]
    pub search_service: SearchServiceSettings,
}

impl ConfigUpdateRequest {
    fn into_update(self) -> OptimizationConfigUpdate {
        OptimizationConfigUpdate {
            enable_smart_caching: self.api_manager.enable_smart_caching,
            enable_batch_processing: self.api_manager.enable_batch_processing,
            min_batch_size: self.api_manager.min_batch_size,
            batch_timeout_ms: self.api_manager.batch_timeout_ms,
            adaptive_layer_count: self.search_service.adaptive_layer_count,
            early_termination: self.search_service.early_termination,
            similarity_threshold: self.search_service.similarity_threshold,
            min_results: self.search_service.min_results,
            top_k: self.search_service.top_k,
        }
    }
}

/// Response body for a config update
#[derive(Debug, Serialize)]
pub struct ConfigUpdateResponse {
    pub success: bool,
    pub message: String,
    pub applied_config: OptimizationConfig,
    pub timestamp: String,
}

/// Handles `POST /optimization/config`; the partial update is validated and
/// applied atomically or rejected whole
pub async fn update_config(
    State(state): State<AppState>,
    Json(request): Json<ConfigUpdateRequest>,
) -> Result<axum::Json<ConfigUpdateResponse>, ApiError> {
    let update = request.into_update();
    let applied_config = state.optimization.update_config(&update)?;

    Ok(axum::Json(ConfigUpdateResponse {
        success: true,
        message: "Optimization config updated".to_string(),
        applied_config,
        timestamp: Utc::now().to_rfc3339(),
    }))
}
