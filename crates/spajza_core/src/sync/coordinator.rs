//! Mirror trigger policy.
//!
//! # Responsibility
//! - Decide when pulls happen automatically and how failures surface.
//! - Own the push queue and the session's last successful sync time.
//!
//! # Invariants
//! - The automatic pull runs at most once per session, and only while no
//!   successful sync has been recorded.
//! - `SyncTrigger::Background` failures are logged and swallowed.

use crate::model::collection::Collection;
use crate::sync::mirror::{MirrorClient, MirrorError, MirrorPayload};
use crate::sync::push_queue::{FlushError, PushQueue};
use crate::sync::sequencer::RequestSequencer;
use chrono::{DateTime, Utc};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Default wait for a user-triggered push confirmation.
pub const DEFAULT_PUSH_CONFIRM_TIMEOUT: Duration = Duration::from_secs(20);

/// Who asked for a sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTrigger {
    /// Implicit: startup pull, post-mutation push.
    Background,
    /// Explicit user action; failures are reported.
    User,
}

#[derive(Debug)]
pub enum SyncError {
    Pull(MirrorError),
    Push(FlushError),
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pull(err) => write!(f, "sync download failed: {err}"),
            Self::Push(err) => write!(f, "sync upload failed: {err}"),
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Pull(err) => Some(err),
            Self::Push(err) => Some(err),
        }
    }
}

/// Session-scoped mirror orchestration.
pub struct MirrorCoordinator {
    client: Arc<dyn MirrorClient>,
    queue: PushQueue,
    pulls: RequestSequencer,
    auto_pull_attempted: AtomicBool,
    last_pull_at: Mutex<Option<DateTime<Utc>>>,
    push_confirm_timeout: Duration,
}

impl MirrorCoordinator {
    /// Starts the push worker for `client`.
    ///
    /// # Panics
    /// - When called outside a Tokio runtime.
    pub fn start(client: Arc<dyn MirrorClient>) -> Self {
        let queue = PushQueue::spawn(Arc::clone(&client));
        Self {
            client,
            queue,
            pulls: RequestSequencer::new(),
            auto_pull_attempted: AtomicBool::new(false),
            last_pull_at: Mutex::new(None),
            push_confirm_timeout: DEFAULT_PUSH_CONFIRM_TIMEOUT,
        }
    }

    pub fn with_push_confirm_timeout(mut self, timeout: Duration) -> Self {
        self.push_confirm_timeout = timeout;
        self
    }

    /// Handle to attach to `ListService` for post-mutation pushes.
    pub fn push_queue(&self) -> PushQueue {
        self.queue.clone()
    }

    /// Time of the newest successful pull or acknowledged push.
    pub fn last_sync_at(&self) -> Option<DateTime<Utc>> {
        let pulled = self
            .last_pull_at
            .lock()
            .map(|guard| *guard)
            .unwrap_or_default();
        let pushed = self.queue.status().last_ack_at;
        pulled.max(pushed)
    }

    pub fn needs_initial_pull(&self) -> bool {
        !self.auto_pull_attempted.load(Ordering::SeqCst) && self.last_sync_at().is_none()
    }

    /// Runs the once-per-session background pull.
    ///
    /// Returns `None` when already attempted, already synced, failed, or stale.
    pub async fn auto_pull(&self) -> Option<MirrorPayload> {
        if !self.needs_initial_pull() {
            return None;
        }
        if self.auto_pull_attempted.swap(true, Ordering::SeqCst) {
            return None;
        }
        self.pull(SyncTrigger::Background).await.ok().flatten()
    }

    /// Fetches the remote collection.
    ///
    /// `Ok(None)` means there is nothing to apply: the response was stale,
    /// or a background pull failed.
    pub async fn pull(&self, trigger: SyncTrigger) -> Result<Option<MirrorPayload>, SyncError> {
        let ticket = self.pulls.begin();
        match self.client.pull().await {
            Ok(payload) => {
                if !self.pulls.complete(ticket) {
                    info!(
                        "event=mirror_pull module=sync status=stale ticket={}",
                        ticket.value()
                    );
                    return Ok(None);
                }
                if let Ok(mut guard) = self.last_pull_at.lock() {
                    *guard = Some(Utc::now());
                }
                Ok(Some(payload))
            }
            Err(err) => match trigger {
                SyncTrigger::Background => {
                    warn!(
                        "event=mirror_pull module=sync status=error trigger=background error={err}"
                    );
                    Ok(None)
                }
                SyncTrigger::User => Err(SyncError::Pull(err)),
            },
        }
    }

    /// Queues `snapshot` and waits for the mirror to accept it.
    pub async fn push_now(&self, snapshot: Collection) -> Result<(), SyncError> {
        self.queue.schedule(snapshot);
        self.queue
            .flush(self.push_confirm_timeout)
            .await
            .map_err(SyncError::Push)
    }

    /// Waits for queued background pushes; failures are logged only.
    pub async fn settle(&self, timeout: Duration) {
        if let Err(err) = self.queue.flush(timeout).await {
            warn!("event=mirror_settle module=sync status=error trigger=background error={err}");
        }
    }
}
