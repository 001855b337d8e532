//! Concurrent collection fan-out.
//!
//! Discovery runs sequentially per category; every discovered resource then
//! becomes one independent collection task on a bounded worker pool. A
//! failing task is logged and dropped without touching its siblings, and the
//! orchestrator only returns once every submitted task has reached a
//! terminal state. The resulting snapshot order is completion order; the
//! report layer sorts before presentation.

use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::collector::Collector;
use crate::types::Snapshot;

/// Maximum worker count when sizing the pool automatically, so a wide
/// environment cannot hammer the remote APIs.
const MAX_AUTO_WORKERS: usize = 32;

/// Resolve the worker pool size: an explicit configuration value wins,
/// otherwise a small multiple of available parallelism, capped.
pub fn worker_pool_size(configured: usize) -> usize {
    if configured > 0 {
        return configured;
    }
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4);
    (cpus * 5).min(MAX_AUTO_WORKERS)
}

/// Run one collection pass over all collectors and return every snapshot
/// that was gathered successfully.
pub async fn run_collection(collectors: &[Arc<dyn Collector>], pool_size: usize) -> Vec<Snapshot> {
    let semaphore = Arc::new(Semaphore::new(pool_size.max(1)));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut tasks: JoinSet<()> = JoinSet::new();

    for collector in collectors {
        let resource_ids = match collector.discover().await {
            Ok(ids) => ids,
            Err(e) => {
                warn!(
                    namespace = %collector.namespace(),
                    error = %e,
                    "Discovery failed; category contributes no snapshots"
                );
                continue;
            }
        };
        debug!(
            namespace = %collector.namespace(),
            count = resource_ids.len(),
            "Discovered resources"
        );

        for resource_id in resource_ids {
            let collector = Arc::clone(collector);
            let semaphore = Arc::clone(&semaphore);
            let tx = tx.clone();
            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return; // semaphore is never closed while tasks run
                };
                match collector.collect(&resource_id).await {
                    Ok(snapshot) => {
                        let _ = tx.send(snapshot);
                    }
                    Err(e) => {
                        warn!(
                            namespace = %collector.namespace(),
                            resource = %resource_id,
                            error = %e,
                            "Collection failed; resource dropped from this run"
                        );
                    }
                }
            });
        }
    }
    drop(tx);

    // Wait until every submitted task is terminal. A panicked task surfaces
    // here as a join error and is isolated like any other failure.
    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            warn!(error = %e, "Collection task aborted");
        }
    }

    let mut snapshots = Vec::new();
    while let Some(snapshot) = rx.recv().await {
        snapshots.push(snapshot);
    }

    info!(count = snapshots.len(), "Collection pass complete");
    snapshots
}
