use async_trait::async_trait;
use spajza_core::{
    Collection, FlushError, MirrorClient, MirrorCoordinator, MirrorError, MirrorPayload,
    SyncError, SyncTrigger,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Default)]
struct ScriptedMirror {
    pulls: Mutex<VecDeque<Result<MirrorPayload, MirrorError>>>,
    pull_calls: AtomicUsize,
    push_fails: AtomicBool,
    push_hangs: AtomicBool,
    pushed: Mutex<Vec<Collection>>,
}

impl ScriptedMirror {
    fn with_pulls(pulls: Vec<Result<MirrorPayload, MirrorError>>) -> Arc<Self> {
        Arc::new(Self {
            pulls: Mutex::new(pulls.into()),
            ..Self::default()
        })
    }
}

#[async_trait]
impl MirrorClient for ScriptedMirror {
    async fn pull(&self) -> Result<MirrorPayload, MirrorError> {
        self.pull_calls.fetch_add(1, Ordering::SeqCst);
        self.pulls
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(MirrorError::Status(404)))
    }

    async fn push(&self, snapshot: &Collection) -> Result<(), MirrorError> {
        if self.push_hangs.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.push_fails.load(Ordering::SeqCst) {
            return Err(MirrorError::Status(500));
        }
        self.pushed.lock().unwrap().push(snapshot.clone());
        Ok(())
    }
}

fn payload(name_count: usize) -> MirrorPayload {
    let mut collection = Collection::seed();
    collection.products.truncate(name_count);
    MirrorPayload::from(&collection)
}

#[tokio::test]
async fn background_pull_failure_is_swallowed_user_pull_failure_is_not() {
    let mirror = ScriptedMirror::with_pulls(vec![
        Err(MirrorError::Status(500)),
        Err(MirrorError::Status(500)),
    ]);
    let coordinator = MirrorCoordinator::start(mirror);

    let background = coordinator.pull(SyncTrigger::Background).await.unwrap();
    assert_eq!(background, None);

    let err = coordinator.pull(SyncTrigger::User).await.unwrap_err();
    assert!(matches!(err, SyncError::Pull(MirrorError::Status(500))));
    assert!(coordinator.last_sync_at().is_none());
}

#[tokio::test]
async fn auto_pull_runs_once_per_session() {
    let mirror = ScriptedMirror::with_pulls(vec![Ok(payload(2)), Ok(payload(1))]);
    let coordinator = MirrorCoordinator::start(mirror.clone());
    assert!(coordinator.needs_initial_pull());

    let first = coordinator.auto_pull().await.unwrap();
    assert_eq!(first.products.len(), 2);
    assert!(coordinator.last_sync_at().is_some());
    assert!(!coordinator.needs_initial_pull());

    assert_eq!(coordinator.auto_pull().await, None);
    assert_eq!(mirror.pull_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_auto_pull_is_not_retried() {
    let mirror = ScriptedMirror::with_pulls(vec![Err(MirrorError::Status(502))]);
    let coordinator = MirrorCoordinator::start(mirror.clone());

    assert_eq!(coordinator.auto_pull().await, None);
    assert_eq!(coordinator.auto_pull().await, None);
    assert_eq!(mirror.pull_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn acknowledged_push_counts_as_sync_and_skips_auto_pull() {
    let mirror = ScriptedMirror::with_pulls(vec![Ok(payload(0))]);
    let coordinator = MirrorCoordinator::start(mirror.clone());

    coordinator.push_now(Collection::seed()).await.unwrap();
    assert!(coordinator.last_sync_at().is_some());
    assert_eq!(mirror.pushed.lock().unwrap().len(), 1);

    assert_eq!(coordinator.auto_pull().await, None);
    assert_eq!(mirror.pull_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn user_push_failure_is_surfaced() {
    let mirror = ScriptedMirror::with_pulls(vec![]);
    mirror.push_fails.store(true, Ordering::SeqCst);
    let coordinator = MirrorCoordinator::start(mirror);

    let err = coordinator.push_now(Collection::seed()).await.unwrap_err();
    assert!(matches!(err, SyncError::Push(FlushError::Push(_))), "{err}");
    assert!(coordinator.last_sync_at().is_none());

    coordinator.settle(Duration::from_secs(1)).await;
}

#[tokio::test]
async fn unconfirmed_push_times_out() {
    let mirror = ScriptedMirror::with_pulls(vec![]);
    mirror.push_hangs.store(true, Ordering::SeqCst);
    let coordinator =
        MirrorCoordinator::start(mirror).with_push_confirm_timeout(Duration::from_millis(50));

    let err = coordinator.push_now(Collection::seed()).await.unwrap_err();
    assert!(matches!(err, SyncError::Push(FlushError::TimedOut(_))), "{err}");
    assert!(coordinator.push_queue().status().in_flight);
}

/// Mirror whose first pull answers only after the second has finished.
struct RacingMirror {
    calls: AtomicUsize,
    second_done: Notify,
}

#[async_trait]
impl MirrorClient for RacingMirror {
    async fn pull(&self) -> Result<MirrorPayload, MirrorError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call == 0 {
            self.second_done.notified().await;
            Ok(payload(4))
        } else {
            self.second_done.notify_one();
            Ok(payload(1))
        }
    }

    async fn push(&self, _snapshot: &Collection) -> Result<(), MirrorError> {
        Ok(())
    }
}

#[tokio::test]
async fn pull_that_finishes_after_a_newer_one_is_dropped() {
    let coordinator = MirrorCoordinator::start(Arc::new(RacingMirror {
        calls: AtomicUsize::new(0),
        second_done: Notify::new(),
    }));

    let (older, newer) = tokio::join!(
        coordinator.pull(SyncTrigger::User),
        coordinator.pull(SyncTrigger::User),
    );

    assert_eq!(older.unwrap(), None);
    assert_eq!(newer.unwrap().unwrap().products.len(), 1);
}
