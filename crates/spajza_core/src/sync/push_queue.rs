//! Single-flight mirror push queue.
//!
//! # Responsibility
//! - Run mirror pushes on a background task, off the mutation path.
//! - Coalesce rapid edits: a push always carries the newest snapshot.
//!
//! # Invariants
//! - At most one push is in flight per queue.
//! - Generations are assigned under the channel lock, so the newest
//!   generation always holds the newest snapshot.
//! - A generation counts as delivered once it or any later one is acknowledged.

use crate::model::collection::Collection;
use crate::sync::mirror::{MirrorClient, MirrorError};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Observable progress of the push worker.
#[derive(Debug, Clone, Default)]
pub struct PushStatus {
    /// Newest generation the worker finished (successfully or not).
    pub attempted: u64,
    /// Newest generation the mirror accepted.
    pub acknowledged: u64,
    pub in_flight: bool,
    /// Failure of the newest attempt, cleared by the next success.
    pub last_error: Option<Arc<MirrorError>>,
    pub last_ack_at: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub enum FlushError {
    TimedOut(Duration),
    WorkerStopped,
    Push(Arc<MirrorError>),
}

impl Display for FlushError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TimedOut(after) => {
                write!(f, "mirror push not confirmed within {}s", after.as_secs())
            }
            Self::WorkerStopped => write!(f, "mirror push worker stopped"),
            Self::Push(err) => write!(f, "{err}"),
        }
    }
}

impl Error for FlushError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Push(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct PendingPush {
    generation: u64,
    snapshot: Collection,
}

struct Shared {
    pending: watch::Sender<Option<PendingPush>>,
    status: Arc<watch::Sender<PushStatus>>,
    scheduled: AtomicU64,
}

/// Cloneable handle to one push worker.
///
/// The worker stops once every handle is dropped.
#[derive(Clone)]
pub struct PushQueue {
    shared: Arc<Shared>,
}

impl PushQueue {
    /// Starts the push worker on the current Tokio runtime.
    ///
    /// # Panics
    /// - When called outside a Tokio runtime.
    pub fn spawn(client: Arc<dyn MirrorClient>) -> Self {
        let (pending_tx, pending_rx) = watch::channel(None);
        let (status_tx, _) = watch::channel(PushStatus::default());
        let status = Arc::new(status_tx);

        tokio::spawn(run_worker(client, pending_rx, Arc::clone(&status)));

        Self {
            shared: Arc::new(Shared {
                pending: pending_tx,
                status,
                scheduled: AtomicU64::new(0),
            }),
        }
    }

    /// Queues `snapshot` for delivery and returns its generation.
    ///
    /// Never blocks; an older queued snapshot that has not been picked up
    /// yet is replaced.
    pub fn schedule(&self, snapshot: Collection) -> u64 {
        let mut generation = 0;
        self.shared.pending.send_modify(|slot| {
            generation = self.shared.scheduled.fetch_add(1, Ordering::SeqCst) + 1;
            *slot = Some(PendingPush {
                generation,
                snapshot,
            });
        });
        debug!("event=mirror_push_scheduled module=sync status=queued generation={generation}");
        generation
    }

    /// Newest generation handed to `schedule`.
    pub fn scheduled(&self) -> u64 {
        self.shared.scheduled.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> PushStatus {
        self.shared.status.borrow().clone()
    }

    /// Waits until everything scheduled so far has been attempted.
    ///
    /// # Errors
    /// - `TimedOut` when the worker did not get there within `timeout`.
    /// - `Push` when the newest attempt failed.
    pub async fn flush(&self, timeout: Duration) -> Result<(), FlushError> {
        let target = self.scheduled();
        if target == 0 {
            return Ok(());
        }

        let mut status_rx = self.shared.status.subscribe();
        let waited = tokio::time::timeout(timeout, async move {
            let status = status_rx
                .wait_for(|status| status.attempted >= target)
                .await
                .map_err(|_| FlushError::WorkerStopped)?;
            Ok::<PushStatus, FlushError>((*status).clone())
        })
        .await;

        match waited {
            Err(_) => Err(FlushError::TimedOut(timeout)),
            Ok(Err(err)) => Err(err),
            Ok(Ok(status)) if status.acknowledged >= target => Ok(()),
            Ok(Ok(status)) => Err(status
                .last_error
                .map(FlushError::Push)
                .unwrap_or(FlushError::WorkerStopped)),
        }
    }
}

async fn run_worker(
    client: Arc<dyn MirrorClient>,
    mut pending: watch::Receiver<Option<PendingPush>>,
    status: Arc<watch::Sender<PushStatus>>,
) {
    while pending.changed().await.is_ok() {
        let Some(job) = pending.borrow_and_update().clone() else {
            continue;
        };

        status.send_modify(|status| status.in_flight = true);
        let started_at = Instant::now();
        let result = client.push(&job.snapshot).await;

        match result {
            Ok(()) => {
                info!(
                    "event=mirror_push module=sync status=ok generation={} products={} duration_ms={}",
                    job.generation,
                    job.snapshot.products.len(),
                    started_at.elapsed().as_millis()
                );
                status.send_modify(|status| {
                    status.in_flight = false;
                    status.attempted = job.generation;
                    status.acknowledged = job.generation;
                    status.last_error = None;
                    status.last_ack_at = Some(Utc::now());
                });
            }
            Err(err) => {
                warn!(
                    "event=mirror_push module=sync status=error generation={} duration_ms={} error={err}",
                    job.generation,
                    started_at.elapsed().as_millis()
                );
                let err = Arc::new(err);
                status.send_modify(|status| {
                    status.in_flight = false;
                    status.attempted = job.generation;
                    status.last_error = Some(err);
                });
            }
        }
    }
    debug!("event=mirror_push_worker module=sync status=stopped");
}
