//! Request batching / coalescing scheduler
//!
//! Converts many small calls to an expensive upstream into fewer larger
//! calls. Submissions accumulate in the current open batch owned by a
//! single coordinator task; a batch is flushed when it reaches the
//! configured size or when the oldest unit has waited out the batch
//! timeout, whichever comes first. Once flushed the batch is sealed and
//! exactly one upstream call serves all of its units.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::batch::{BatchExecutor, BatchUnitId, CoalescerConfig};
use crate::domain::optimization::{ConfigHandle, OptimizationStats};
use crate::domain::DomainError;

struct PendingUnit<P, R> {
    id: BatchUnitId,
    payload: P,
    respond: oneshot::Sender<Result<R, DomainError>>,
}

/// Coalesces concurrent submissions into batched upstream calls.
///
/// The flush policy is re-read from the live configuration at the start of
/// each batch, so config updates apply to subsequently opened batches.
#[derive(Debug)]
pub struct BatchCoalescer<P, R>
where
    P: Send + 'static,
    R: Send + 'static,
{
    tx: std::sync::Mutex<Option<mpsc::UnboundedSender<PendingUnit<P, R>>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    target: &'static str,
}

impl<P, R> BatchCoalescer<P, R>
where
    P: Send + 'static,
    R: Send + 'static,
{
    /// Spawns the coordinator task for one upstream target
    pub fn new(
        target: &'static str,
        executor: Arc<dyn BatchExecutor<P, R>>,
        config: Arc<ConfigHandle>,
        stats: Arc<OptimizationStats>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        let worker = tokio::spawn(Self::run(target, rx, executor, config, stats));

        Self {
            tx: std::sync::Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
            target,
        }
    }

    /// Submits one payload and waits for the result of the batched call.
    ///
    /// Within one batch, results are delivered in submission order. A caller
    /// that goes away simply drops the receiving end; its unit stays in the
    /// sealed batch and its result is discarded.
    pub async fn submit(&self, payload: P) -> Result<R, DomainError> {
        let (respond, rx) = oneshot::channel();
        let unit = PendingUnit {
            id: BatchUnitId::new(),
            payload,
            respond,
        };

        {
            let guard = self.tx.lock().expect("coalescer sender lock poisoned");
            let tx = guard.as_ref().ok_or_else(|| {
                DomainError::internal(format!("{} coalescer is shut down", self.target))
            })?;
            tx.send(unit).map_err(|_| {
                DomainError::internal(format!("{} coalescer worker is gone", self.target))
            })?;
        }

        rx.await.map_err(|_| {
            DomainError::upstream_batch(format!("{} batch worker dropped the unit", self.target))
        })?
    }

    /// Closes the intake and flushes any still-open batch (even under-sized)
    /// before the worker exits.
    pub async fn shutdown(&self) {
        // dropping the sender lets the worker drain the queue and finish
        self.tx.lock().expect("coalescer sender lock poisoned").take();

        if let Some(worker) = self.worker.lock().await.take() {
            if let Err(e) = worker.await {
                warn!("{} coalescer worker ended abnormally: {}", self.target, e);
            }
        }
    }

    async fn run(
        target: &'static str,
        mut rx: mpsc::UnboundedReceiver<PendingUnit<P, R>>,
        executor: Arc<dyn BatchExecutor<P, R>>,
        config: Arc<ConfigHandle>,
        stats: Arc<OptimizationStats>,
    ) {
        loop {
            // block until a first unit opens a new batch
            let Some(first) = rx.recv().await else {
                break;
            };

            let snapshot = config.current();
            let policy = CoalescerConfig::new(snapshot.min_batch_size, snapshot.batch_timeout());

            let mut pending = vec![first];
            let mut closed = false;
            let deadline = tokio::time::Instant::now() + policy.batch_timeout;

            while pending.len() < policy.min_batch_size {
                match tokio::time::timeout_at(deadline, rx.recv()).await {
                    Ok(Some(unit)) => pending.push(unit),
                    Ok(None) => {
                        closed = true;
                        break;
                    }
                    // timeout: flush whatever has accumulated
                    Err(_) => break,
                }
            }

            debug!("Flushing {} batch of {} unit(s)", target, pending.len());
            Self::flush(target, &executor, pending, &stats).await;

            if closed {
                break;
            }
        }
    }

    async fn flush(
        target: &'static str,
        executor: &Arc<dyn BatchExecutor<P, R>>,
        pending: Vec<PendingUnit<P, R>>,
        stats: &Arc<OptimizationStats>,
    ) {
        stats.record_batch(pending.len() as u64);
        stats.record_api_call();

        let mut units = Vec::with_capacity(pending.len());
        let mut responders = Vec::with_capacity(pending.len());

        for unit in pending {
            units.push((unit.id, unit.payload));
            responders.push((unit.id, unit.respond));
        }

        match executor.execute(units).await {
            Ok(results) => {
                let mut by_id: HashMap<BatchUnitId, Result<R, DomainError>> =
                    results.into_iter().collect();

                for (id, respond) in responders {
                    let result = by_id.remove(&id).unwrap_or_else(|| {
                        Err(DomainError::upstream_batch(format!(
                            "{} batch response missing unit {}",
                            target, id
                        )))
                    });
                    // the caller may have gone away; nothing to do then
                    let _ = respond.send(result);
                }
            }
            Err(e) => {
                warn!("{} batch call failed: {}", target, e);
                let message = e.to_string();

                for (_, respond) in responders {
                    let _ = respond.send(Err(DomainError::upstream_batch(message.clone())));
                }
            }
        }
    }
}
