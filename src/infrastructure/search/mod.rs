//! Search infrastructure - adaptive controller and the HTTP index client

mod controller;
mod http_index;

pub use controller::AdaptiveSearchController;
pub use http_index::HttpVectorIndex;
