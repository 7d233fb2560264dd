//! Batch domain - unit identity and the upstream batch executor boundary

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::DomainError;

/// Identifier correlating one caller's unit through a batched upstream call.
///
/// The id is present in both the batch request and the batch response, so
/// correlation survives upstream reordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchUnitId(Uuid);

impl BatchUnitId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BatchUnitId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BatchUnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for BatchUnitId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Per-unit outcome of a batched upstream call
pub type UnitResult<R> = (BatchUnitId, Result<R, DomainError>);

/// Executes one sealed batch as a single upstream call.
///
/// Implementations must return one result per submitted unit, keyed by the
/// unit id. A whole-call failure is returned as `Err` and propagated to
/// every unit by the coalescer; per-unit failures are returned inline.
#[async_trait]
pub trait BatchExecutor<P, R>: Send + Sync + Debug
where
    P: Send + 'static,
    R: Send + 'static,
{
    async fn execute(
        &self,
        units: Vec<(BatchUnitId, P)>,
    ) -> Result<Vec<UnitResult<R>>, DomainError>;
}

/// Flush policy for the batch coalescer
#[derive(Debug, Clone)]
pub struct CoalescerConfig {
    /// Flush as soon as this many units are pending
    pub min_batch_size: usize,
    /// Flush when the oldest pending unit has waited this long
    pub batch_timeout: Duration,
}

impl Default for CoalescerConfig {
    fn default() -> Self {
        Self {
            min_batch_size: 3,
            batch_timeout: Duration::from_secs(2),
        }
    }
}

impl CoalescerConfig {
    pub fn new(min_batch_size: usize, batch_timeout: Duration) -> Self {
        Self {
            min_batch_size: min_batch_size.max(1),
            batch_timeout,
        }
    }
}
