//! Optimization domain - runtime configuration snapshots and statistics

mod config;
mod stats;

pub use config::{ConfigHandle, OptimizationConfig, OptimizationConfigUpdate};
pub use stats::{OptimizationStats, StatsSnapshot};
