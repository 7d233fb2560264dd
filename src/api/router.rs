use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::answers;
use super::health;
use super::optimization;
use super::state::AppState;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/generate_answer", post(answers::generate_answer))
        .route("/health", get(health::health_check))
        .route("/live", get(health::live_check))
        .route("/optimization/stats", get(optimization::get_stats))
        .route("/optimization/cache/clear", post(optimization::clear_cache))
        .route("/optimization/config", post(optimization::update_config))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
