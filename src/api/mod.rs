//! HTTP API - routes, handlers, shared state and error envelope

pub mod answers;
pub mod health;
pub mod optimization;
pub mod router;
pub mod state;
pub mod types;

pub use router::create_router;
pub use state::AppState;
