//! Shared API types - error envelope and JSON extraction

mod error;
mod json;

pub use error::{ApiError, ApiErrorResponse};
pub use json::Json;
