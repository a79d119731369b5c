//! Review queue controller.
//!
//! A single owner task holds all triage state and applies every mutation. Handles
//! send intents (swipe, fetch more, delete all) over a channel; store enumeration,
//! image decoding and deletion run in spawned tasks whose results come back to the
//! owner as completion messages. Observers read snapshots from a `watch` channel and
//! lifecycle events from a `broadcast` channel.

use crate::config::ReviewConfig;
use crate::domain::{
    AccessResult, AssetId, AssetRef, Decision, Photo, ReviewPhase, ReviewQueue, Size,
    TriageStatistics,
};
use crate::error::{DeleteError, PhotoTinderError, Result};
use crate::source::AssetSource;
use futures::{future, stream, StreamExt};
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{debug, info, warn};

const COMMAND_CAPACITY: usize = 32;
const EVENT_CAPACITY: usize = 64;

/// Read-only view of the controller state, published after every change
#[derive(Debug, Clone, Default)]
pub struct ReviewSnapshot {
    pub phase: ReviewPhase,
    /// Front first
    pub queue: Vec<Photo>,
    /// Photos swiped left and not yet deleted, in swipe order
    pub pending: Vec<Photo>,
    pub statistics: TriageStatistics,
    pub fetch_limit: usize,
    pub is_fetching: bool,
    pub is_deleting: bool,
    pub access: Option<AccessResult>,
    pub last_error: Option<String>,
}

impl ReviewSnapshot {
    pub fn front(&self) -> Option<&Photo> {
        self.queue.first()
    }

    pub fn queue_ids(&self) -> Vec<AssetId> {
        self.queue.iter().map(|photo| photo.id.clone()).collect()
    }

    pub fn pending_ids(&self) -> Vec<AssetId> {
        self.pending.iter().map(|photo| photo.id.clone()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewEvent {
    AccessResolved(AccessResult),
    FetchCompleted { limit: usize, appended: usize },
    FetchFailed(String),
    DeleteCommitted { count: usize },
    DeleteFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwipeOutcome {
    pub id: AssetId,
    pub decision: Decision,
    /// Whether this swipe started a background fetch cycle
    pub refetch_started: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Nothing was marked for deletion; the store was not called
    NothingPending,
    Committed { count: usize },
}

/// Intents sent by handles
enum Command {
    Swipe {
        index: usize,
        decision: Decision,
        reply: oneshot::Sender<Result<SwipeOutcome>>,
    },
    FetchMore {
        reply: oneshot::Sender<bool>,
    },
    DeleteAll {
        reply: oneshot::Sender<Result<DeleteOutcome>>,
    },
    Shutdown,
}

/// Results of background work, re-joined on the owner task
enum Completion {
    Access(AccessResult),
    Fetch {
        limit: NonZeroUsize,
        result: Result<Vec<Photo>>,
    },
    Delete {
        ids: Vec<AssetId>,
        result: std::result::Result<(), DeleteError>,
        reply: oneshot::Sender<Result<DeleteOutcome>>,
    },
}

/// Cloneable handle to a running controller
#[derive(Clone)]
pub struct ReviewHandle {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<ReviewSnapshot>,
    events: broadcast::Sender<ReviewEvent>,
}

impl ReviewHandle {
    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(make(reply))
            .await
            .map_err(|_| PhotoTinderError::ControllerStopped)?;
        response
            .await
            .map_err(|_| PhotoTinderError::ControllerStopped)
    }

    /// Resolves the photo at `index`. Only index 0, the front, is actionable.
    pub async fn swipe(&self, index: usize, decision: Decision) -> Result<SwipeOutcome> {
        self.request(|reply| Command::Swipe {
            index,
            decision,
            reply,
        })
        .await?
    }

    pub async fn swipe_front(&self, decision: Decision) -> Result<SwipeOutcome> {
        self.swipe(0, decision).await
    }

    /// Starts a fetch cycle unless one is already running or access was not granted.
    /// Returns whether a cycle was started; it completes in the background.
    pub async fn fetch_more(&self) -> Result<bool> {
        self.request(|reply| Command::FetchMore { reply }).await
    }

    /// Deletes every pending photo from the store and waits for the outcome
    pub async fn delete_all(&self) -> Result<DeleteOutcome> {
        self.request(|reply| Command::DeleteAll { reply }).await?
    }

    pub fn snapshot(&self) -> ReviewSnapshot {
        ReviewSnapshot::clone(&self.state.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<ReviewSnapshot> {
        self.state.clone()
    }

    pub fn events(&self) -> broadcast::Receiver<ReviewEvent> {
        self.events.subscribe()
    }

    /// Stops the owner task; in-flight work finishes but its results are discarded
    pub async fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown).await;
    }
}

pub struct ReviewController {
    source: Arc<dyn AssetSource>,
    config: ReviewConfig,
    queue: ReviewQueue,
    phase: ReviewPhase,
    access: Option<AccessResult>,
    is_fetching: bool,
    /// The running cycle started with nothing to review
    fetching_from_empty: bool,
    is_deleting: bool,
    last_error: Option<String>,
    completions: mpsc::UnboundedSender<Completion>,
    state: watch::Sender<ReviewSnapshot>,
    events: broadcast::Sender<ReviewEvent>,
}

impl ReviewController {
    /// Spawns the owner task on the current tokio runtime and requests library access
    pub fn spawn(source: Arc<dyn AssetSource>, config: ReviewConfig) -> ReviewHandle {
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ReviewSnapshot::default());
        let (events_tx, _) = broadcast::channel(EVENT_CAPACITY);

        let controller = Self {
            source,
            config,
            queue: ReviewQueue::new(),
            phase: ReviewPhase::Idle,
            access: None,
            is_fetching: false,
            fetching_from_empty: false,
            is_deleting: false,
            last_error: None,
            completions: completions_tx,
            state: state_tx,
            events: events_tx.clone(),
        };

        tokio::spawn(controller.run(commands_rx, completions_rx));

        ReviewHandle {
            commands: commands_tx,
            state: state_rx,
            events: events_tx,
        }
    }

    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut completions: mpsc::UnboundedReceiver<Completion>,
    ) {
        self.request_access();

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                Some(completion) = completions.recv() => self.handle_completion(completion),
            }
        }

        info!("review controller stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Swipe {
                index,
                decision,
                reply,
            } => {
                let result = self.swipe(index, decision);
                let _ = reply.send(result);
            }
            Command::FetchMore { reply } => {
                let started = self.start_fetch_cycle();
                if started {
                    self.publish();
                }
                let _ = reply.send(started);
            }
            Command::DeleteAll { reply } => self.delete_all(reply),
            Command::Shutdown => {}
        }
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Access(access) => self.access_resolved(access),
            Completion::Fetch { limit, result } => self.fetch_finished(limit, result),
            Completion::Delete { ids, result, reply } => self.delete_finished(ids, result, reply),
        }
    }

    fn request_access(&mut self) {
        self.phase = ReviewPhase::RequestingAccess;
        self.publish();

        let source = Arc::clone(&self.source);
        let completions = self.completions.clone();
        tokio::spawn(async move {
            let access = source.request_access().await;
            let _ = completions.send(Completion::Access(access));
        });
    }

    fn access_resolved(&mut self, access: AccessResult) {
        info!(?access, "photo library access resolved");
        self.access = Some(access);
        self.emit(ReviewEvent::AccessResolved(access));

        if access.is_granted() {
            self.start_fetch_cycle();
        } else {
            // Terminal for the session
            self.last_error = Some(PhotoTinderError::AccessDenied.to_string());
            self.phase = ReviewPhase::Empty;
        }
        self.publish();
    }

    fn swipe(&mut self, index: usize, decision: Decision) -> Result<SwipeOutcome> {
        let id = self.queue.resolve(index, decision)?;
        debug!(asset = %id, ?decision, remaining = self.queue.len(), "swipe resolved");

        self.settle_phase();
        let refetch_started =
            self.queue.needs_refetch(self.config.refetch_threshold) && self.start_fetch_cycle();
        self.publish();

        Ok(SwipeOutcome {
            id,
            decision,
            refetch_started,
        })
    }

    /// Starts a fetch cycle in the background. At most one cycle runs at a time.
    fn start_fetch_cycle(&mut self) -> bool {
        if self.is_fetching || !self.access.is_some_and(AccessResult::is_granted) {
            return false;
        }

        self.is_fetching = true;
        self.fetching_from_empty = self.queue.is_empty();
        let limit = self.queue.advance_cursor(self.config.page_size);
        let excluded = self.queue.exclusion_set();
        self.settle_phase();
        info!(limit = limit.get(), queued = self.queue.len(), "fetch cycle started");

        let source = Arc::clone(&self.source);
        let completions = self.completions.clone();
        let target = self.config.target_size;
        let concurrency = self.config.decode_concurrency;
        tokio::spawn(async move {
            let result = run_fetch_cycle(source, limit, excluded, target, concurrency).await;
            let _ = completions.send(Completion::Fetch { limit, result });
        });

        true
    }

    fn fetch_finished(&mut self, limit: NonZeroUsize, result: Result<Vec<Photo>>) {
        self.is_fetching = false;
        self.fetching_from_empty = false;

        match result {
            Ok(photos) => {
                let decoded = photos.len();
                let appended = self.queue.admit(photos);
                self.last_error = None;
                info!(
                    limit = limit.get(),
                    decoded,
                    appended,
                    queued = self.queue.len(),
                    "fetch cycle completed"
                );
                self.emit(ReviewEvent::FetchCompleted {
                    limit: limit.get(),
                    appended,
                });
            }
            Err(e) => {
                warn!(limit = limit.get(), error = %e, "fetch cycle failed");
                self.last_error = Some(e.to_string());
                self.emit(ReviewEvent::FetchFailed(e.to_string()));
            }
        }

        self.settle_phase();
        self.publish();
    }

    fn delete_all(&mut self, reply: oneshot::Sender<Result<DeleteOutcome>>) {
        if self.queue.pending().is_empty() {
            let _ = reply.send(Ok(DeleteOutcome::NothingPending));
            return;
        }
        if self.is_deleting {
            let _ = reply.send(Err(PhotoTinderError::DeleteInProgress));
            return;
        }

        let ids = self.queue.pending_ids();
        info!(count = ids.len(), "bulk delete started");
        self.is_deleting = true;
        self.phase = ReviewPhase::Deleting;
        self.publish();

        let source = Arc::clone(&self.source);
        let completions = self.completions.clone();
        tokio::spawn(async move {
            let result = source.delete_assets(&ids).await;
            let _ = completions.send(Completion::Delete { ids, result, reply });
        });
    }

    fn delete_finished(
        &mut self,
        ids: Vec<AssetId>,
        result: std::result::Result<(), DeleteError>,
        reply: oneshot::Sender<Result<DeleteOutcome>>,
    ) {
        self.is_deleting = false;

        let outcome = match result {
            Ok(()) => {
                let count = self.queue.commit_deleted(&ids);
                info!(count, "bulk delete committed");
                self.emit(ReviewEvent::DeleteCommitted { count });
                Ok(DeleteOutcome::Committed { count })
            }
            Err(e) => {
                // Pending photos stay pending so the user can retry
                warn!(error = %e, pending = self.queue.pending().len(), "bulk delete failed");
                self.last_error = Some(e.to_string());
                self.emit(ReviewEvent::DeleteFailed(e.to_string()));
                Err(PhotoTinderError::Delete(e))
            }
        };

        self.settle_phase();
        self.publish();
        let _ = reply.send(outcome);
    }

    /// Derives the phase from the queue and the work in flight.
    ///
    /// `Fetching` only covers a cycle that started with an empty queue; a queue
    /// drained while a cycle runs stays `Empty` until that cycle resolves.
    fn settle_phase(&mut self) {
        self.phase = if self.is_deleting {
            ReviewPhase::Deleting
        } else if !self.queue.is_empty() {
            ReviewPhase::Ready
        } else if self.is_fetching && self.fetching_from_empty {
            ReviewPhase::Fetching
        } else {
            ReviewPhase::Empty
        };
    }

    fn emit(&self, event: ReviewEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn publish(&self) {
        debug_assert!(self.queue.is_disjoint());
        self.state.send_replace(self.snapshot());
    }

    fn snapshot(&self) -> ReviewSnapshot {
        ReviewSnapshot {
            phase: self.phase,
            queue: self.queue.photos().cloned().collect(),
            pending: self.queue.pending().to_vec(),
            statistics: self.queue.statistics(),
            fetch_limit: self.queue.fetch_limit(),
            is_fetching: self.is_fetching,
            is_deleting: self.is_deleting,
            access: self.access,
            last_error: self.last_error.clone(),
        }
    }
}

/// One enumerate-then-decode pass.
///
/// Skips excluded identifiers and duplicates within the enumeration, decodes the rest
/// with bounded concurrency and returns them in enumeration order. Per-asset failures
/// are dropped from the batch.
async fn run_fetch_cycle(
    source: Arc<dyn AssetSource>,
    limit: NonZeroUsize,
    excluded: HashSet<AssetId>,
    target: Size,
    concurrency: NonZeroUsize,
) -> Result<Vec<Photo>> {
    let assets = source.enumerate_newest(limit).await?;
    if assets.is_empty() {
        return Ok(Vec::new());
    }

    let mut seen = excluded;
    let candidates: Vec<AssetRef> = assets
        .into_iter()
        .filter(|asset| seen.insert(asset.id.clone()))
        .collect();

    let source = &source;
    let photos = stream::iter(candidates)
        .map(|asset| async move {
            match source.fetch_image(&asset, target).await {
                Ok(image) => Some(Photo::new(asset.id, image)),
                Err(e) if e.is_per_asset() => {
                    debug!(asset = %asset.id, error = %e, "dropping photo from batch");
                    None
                }
                Err(e) => {
                    warn!(asset = %asset.id, error = %e, "store failed while decoding photo");
                    None
                }
            }
        })
        .buffered(concurrency.get())
        .filter_map(future::ready)
        .collect::<Vec<_>>()
        .await;

    Ok(photos)
}

/// Blocking wrapper around a controller for synchronous UI loops.
///
/// Owns its runtime. Swipes and fetch requests round-trip to the owner task and
/// return immediately; deletes run in the background and are polled.
pub struct SyncReviewClient {
    runtime: tokio::runtime::Runtime,
    handle: ReviewHandle,
    delete_rx: Option<oneshot::Receiver<Result<DeleteOutcome>>>,
}

impl SyncReviewClient {
    pub fn start(source: Arc<dyn AssetSource>, config: ReviewConfig) -> Result<Self> {
        let runtime = tokio::runtime::Runtime::new()?;
        let handle = runtime.block_on(async { ReviewController::spawn(source, config) });
        Ok(Self {
            runtime,
            handle,
            delete_rx: None,
        })
    }

    pub fn snapshot(&self) -> ReviewSnapshot {
        self.handle.snapshot()
    }

    pub fn swipe_front(&self, decision: Decision) -> Result<SwipeOutcome> {
        self.runtime.block_on(self.handle.swipe_front(decision))
    }

    pub fn fetch_more(&self) -> Result<bool> {
        self.runtime.block_on(self.handle.fetch_more())
    }

    /// Starts a bulk delete in the background. Returns false if this client is
    /// still waiting on a previous one.
    pub fn start_delete(&mut self) -> bool {
        if self.delete_rx.is_some() {
            return false;
        }

        let (tx, rx) = oneshot::channel();
        let handle = self.handle.clone();
        self.runtime.spawn(async move {
            let _ = tx.send(handle.delete_all().await);
        });
        self.delete_rx = Some(rx);
        true
    }

    /// Returns the outcome of the background delete once it has finished
    pub fn poll_delete(&mut self) -> Option<Result<DeleteOutcome>> {
        let rx = self.delete_rx.as_mut()?;
        match rx.try_recv() {
            Ok(outcome) => {
                self.delete_rx = None;
                Some(outcome)
            }
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => {
                self.delete_rx = None;
                Some(Err(PhotoTinderError::ControllerStopped))
            }
        }
    }

    /// Blocks until the background delete finishes. Returns `None` when no
    /// delete was started.
    pub fn wait_delete(&mut self) -> Option<Result<DeleteOutcome>> {
        let rx = self.delete_rx.take()?;
        Some(
            self.runtime
                .block_on(rx)
                .unwrap_or(Err(PhotoTinderError::ControllerStopped)),
        )
    }

    pub fn is_delete_running(&self) -> bool {
        self.delete_rx.is_some()
    }

    pub fn shutdown(self) {
        self.runtime.block_on(self.handle.shutdown());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::FixtureSource;
    use std::time::Duration;

    fn spawn_with(source: &Arc<FixtureSource>, config: ReviewConfig) -> ReviewHandle {
        ReviewController::spawn(Arc::clone(source) as Arc<dyn AssetSource>, config)
    }

    fn spawn_default(source: &Arc<FixtureSource>) -> ReviewHandle {
        spawn_with(source, ReviewConfig::default())
    }

    async fn wait_until(
        handle: &ReviewHandle,
        predicate: impl FnMut(&ReviewSnapshot) -> bool,
    ) -> ReviewSnapshot {
        let mut rx = handle.subscribe();
        let snapshot = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(predicate))
            .await
            .expect("timed out waiting for controller")
            .expect("controller stopped");
        ReviewSnapshot::clone(&snapshot)
    }

    /// Waits for a settled state with no fetch cycle in flight
    async fn wait_idle(handle: &ReviewHandle) -> ReviewSnapshot {
        wait_until(handle, |s| {
            s.access.is_some()
                && !s.is_fetching
                && !s.is_deleting
                && matches!(s.phase, ReviewPhase::Ready | ReviewPhase::Empty)
        })
        .await
    }

    fn ids(names: &[&str]) -> Vec<AssetId> {
        names.iter().map(|n| AssetId::new(*n)).collect()
    }

    fn asset_names(range: std::ops::Range<usize>) -> Vec<AssetId> {
        range.map(|i| AssetId::new(format!("asset-{:02}", i))).collect()
    }

    #[tokio::test]
    async fn test_fresh_start_fetches_first_page() {
        let source = Arc::new(FixtureSource::with_assets(25));
        let handle = spawn_default(&source);

        let snapshot = wait_idle(&handle).await;

        assert_eq!(snapshot.phase, ReviewPhase::Ready);
        assert_eq!(snapshot.access, Some(AccessResult::Granted));
        assert_eq!(source.enumerate_calls(), vec![10]);
        assert_eq!(snapshot.fetch_limit, 10);
        assert_eq!(snapshot.queue_ids(), asset_names(0..10));
        assert_eq!(source.access_calls(), 1);
        assert!(snapshot.last_error.is_none());
    }

    #[tokio::test]
    async fn test_decode_failures_are_dropped_silently() {
        let source = Arc::new(FixtureSource::with_assets(25));
        source.mark_undecodable("asset-03");
        source.mark_unavailable("asset-07");
        let handle = spawn_default(&source);

        let snapshot = wait_idle(&handle).await;

        let mut expected = asset_names(0..10);
        expected.retain(|id| id.as_str() != "asset-03" && id.as_str() != "asset-07");
        assert_eq!(snapshot.queue_ids(), expected);
        assert!(snapshot.last_error.is_none());
        assert_eq!(snapshot.phase, ReviewPhase::Ready);
    }

    #[tokio::test]
    async fn test_store_error_while_decoding_drops_only_that_photo() {
        let source = Arc::new(FixtureSource::with_assets(5));
        source.mark_store_error("asset-02");
        let handle = spawn_default(&source);

        let snapshot = wait_idle(&handle).await;

        assert_eq!(
            snapshot.queue_ids(),
            ids(&["asset-00", "asset-01", "asset-03", "asset-04"])
        );
        assert_eq!(snapshot.phase, ReviewPhase::Ready);
        assert!(snapshot.last_error.is_none());
    }

    #[tokio::test]
    async fn test_queue_drained_mid_fetch_is_empty_until_cycle_resolves() {
        let source = Arc::new(FixtureSource::with_assets(4));
        let handle = spawn_default(&source);
        assert_eq!(wait_idle(&handle).await.queue.len(), 4);

        source.pause_enumeration();
        for _ in 0..4 {
            handle.swipe_front(Decision::Keep).await.unwrap();
        }

        let snapshot = handle.snapshot();
        assert!(snapshot.queue.is_empty());
        assert!(snapshot.is_fetching);
        assert_eq!(snapshot.phase, ReviewPhase::Empty);

        source.resume_enumeration();
        let snapshot = wait_idle(&handle).await;
        assert_eq!(snapshot.phase, ReviewPhase::Empty);
        assert_eq!(source.enumerate_calls(), vec![10, 20]);
        assert_eq!(snapshot.statistics.kept, 4);
    }

    #[tokio::test]
    async fn test_cycle_started_on_empty_queue_reports_fetching() {
        let source = Arc::new(FixtureSource::new());
        let handle = spawn_default(&source);
        assert_eq!(wait_idle(&handle).await.phase, ReviewPhase::Empty);

        source.push_newest("fresh");
        source.pause_enumeration();
        assert!(handle.fetch_more().await.unwrap());

        let snapshot = handle.snapshot();
        assert!(snapshot.is_fetching);
        assert_eq!(snapshot.phase, ReviewPhase::Fetching);

        source.resume_enumeration();
        let snapshot = wait_idle(&handle).await;
        assert_eq!(snapshot.phase, ReviewPhase::Ready);
        assert_eq!(snapshot.queue_ids(), ids(&["fresh"]));
    }

    #[tokio::test]
    async fn test_failed_decode_is_retried_on_a_later_cycle() {
        let source = Arc::new(FixtureSource::with_assets(3));
        source.mark_undecodable("asset-01");
        let config = ReviewConfig {
            refetch_threshold: 0,
            ..ReviewConfig::default()
        };
        let handle = spawn_with(&source, config);
        let snapshot = wait_idle(&handle).await;
        assert_eq!(snapshot.queue_ids(), ids(&["asset-00", "asset-02"]));

        // Not excluded, so the next cycle asks for it again
        let fetches_before = source.fetch_calls();
        assert!(handle.fetch_more().await.unwrap());
        wait_idle(&handle).await;
        assert_eq!(source.fetch_calls(), fetches_before + 1);
    }

    #[tokio::test]
    async fn test_swipe_at_threshold_fetches_in_background() {
        let source = Arc::new(FixtureSource::with_assets(4));
        let handle = spawn_default(&source);
        let snapshot = wait_idle(&handle).await;
        assert_eq!(snapshot.queue.len(), 4);

        source.pause_enumeration();
        let outcome = handle.swipe_front(Decision::Delete).await.unwrap();

        assert_eq!(outcome.id, AssetId::new("asset-00"));
        assert!(outcome.refetch_started);
        let snapshot = handle.snapshot();
        assert_eq!(snapshot.queue.len(), 3);
        assert!(snapshot.is_fetching);
        assert_eq!(snapshot.phase, ReviewPhase::Ready);

        // Still responsive while the cycle is blocked in the store
        let outcome = handle.swipe_front(Decision::Keep).await.unwrap();
        assert_eq!(outcome.id, AssetId::new("asset-01"));
        assert!(!outcome.refetch_started);

        source.resume_enumeration();
        let snapshot = wait_idle(&handle).await;
        assert_eq!(source.enumerate_calls(), vec![10, 20]);
        assert_eq!(snapshot.queue_ids(), ids(&["asset-02", "asset-03"]));
        assert_eq!(snapshot.pending_ids(), ids(&["asset-00"]));
        assert_eq!(snapshot.statistics.kept, 1);
    }

    #[tokio::test]
    async fn test_only_one_fetch_cycle_in_flight() {
        let source = Arc::new(FixtureSource::with_assets(15));
        let handle = spawn_default(&source);
        wait_idle(&handle).await;

        source.pause_enumeration();
        assert!(handle.fetch_more().await.unwrap());
        assert!(!handle.fetch_more().await.unwrap());
        assert!(!handle.fetch_more().await.unwrap());
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(source.enumerate_calls(), vec![10, 20]);

        source.resume_enumeration();
        let snapshot = wait_idle(&handle).await;
        assert_eq!(snapshot.queue_ids(), asset_names(0..15));
        assert_eq!(source.enumerate_calls(), vec![10, 20]);

        // The guard is released once the cycle completes
        assert!(handle.fetch_more().await.unwrap());
        wait_idle(&handle).await;
        assert_eq!(source.enumerate_calls(), vec![10, 20, 30]);
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_pending() {
        let source = Arc::new(FixtureSource::with_assets(5));
        let handle = spawn_default(&source);
        wait_idle(&handle).await;

        for _ in 0..3 {
            handle.swipe_front(Decision::Delete).await.unwrap();
        }
        wait_idle(&handle).await;
        source.set_delete_failure(true);

        let err = handle.delete_all().await.unwrap_err();

        assert!(matches!(err, PhotoTinderError::Delete(_)));
        let snapshot = handle.snapshot();
        assert_eq!(
            snapshot.pending_ids(),
            ids(&["asset-00", "asset-01", "asset-02"])
        );
        assert!(snapshot.last_error.is_some());
        assert_eq!(snapshot.phase, ReviewPhase::Ready);
        assert_eq!(source.delete_calls().len(), 1);

        // Retrying after the store recovers commits the same photos
        source.set_delete_failure(false);
        let outcome = handle.delete_all().await.unwrap();
        assert_eq!(outcome, DeleteOutcome::Committed { count: 3 });
        let snapshot = handle.snapshot();
        assert!(snapshot.pending.is_empty());
        assert_eq!(snapshot.statistics.deleted, 3);
        assert_eq!(source.asset_ids(), ids(&["asset-03", "asset-04"]));
    }

    #[tokio::test]
    async fn test_delete_with_nothing_pending_is_noop() {
        let source = Arc::new(FixtureSource::with_assets(5));
        let handle = spawn_default(&source);
        let before = wait_idle(&handle).await;

        let outcome = handle.delete_all().await.unwrap();

        assert_eq!(outcome, DeleteOutcome::NothingPending);
        assert!(source.delete_calls().is_empty());
        let after = handle.snapshot();
        assert_eq!(after.phase, before.phase);
        assert_eq!(after.statistics, before.statistics);
        assert_eq!(after.queue_ids(), before.queue_ids());
    }

    #[tokio::test]
    async fn test_access_denied_never_fetches() {
        let source = Arc::new(FixtureSource::with_assets(5).with_access(AccessResult::Denied));
        let handle = spawn_default(&source);

        let snapshot = wait_until(&handle, |s| s.access.is_some()).await;

        assert_eq!(snapshot.phase, ReviewPhase::Empty);
        assert_eq!(snapshot.access, Some(AccessResult::Denied));
        assert!(snapshot.queue.is_empty());
        assert!(snapshot.last_error.is_some());
        assert!(!handle.fetch_more().await.unwrap());
        assert!(matches!(
            handle.swipe_front(Decision::Keep).await,
            Err(PhotoTinderError::IndexOutOfRange { index: 0, len: 0 })
        ));
        assert!(source.enumerate_calls().is_empty());
    }

    #[tokio::test]
    async fn test_limited_access_still_fetches() {
        let source =
            Arc::new(FixtureSource::with_assets(2).with_access(AccessResult::GrantedLimited));
        let handle = spawn_default(&source);

        let snapshot = wait_idle(&handle).await;
        assert_eq!(snapshot.queue.len(), 2);
    }

    #[tokio::test]
    async fn test_duplicates_from_store_are_not_appended_twice() {
        let source = Arc::new(FixtureSource::with_assets(5));
        let handle = spawn_default(&source);
        wait_idle(&handle).await;

        let listed = source
            .enumerate_newest(NonZeroUsize::new(3).unwrap())
            .await
            .unwrap();
        source.push_raw(listed[2].clone());
        source.push_newest("fresh");
        assert!(handle.fetch_more().await.unwrap());
        let snapshot = wait_idle(&handle).await;

        let mut expected = asset_names(0..5);
        expected.push(AssetId::new("fresh"));
        assert_eq!(snapshot.queue_ids(), expected);
        let copies = snapshot
            .queue
            .iter()
            .filter(|p| p.id.as_str() == "asset-02")
            .count();
        assert_eq!(copies, 1);
    }

    #[tokio::test]
    async fn test_judged_photos_are_never_refetched() {
        let source = Arc::new(FixtureSource::with_assets(12));
        let handle = spawn_default(&source);
        wait_idle(&handle).await;

        for decision in [
            Decision::Keep,
            Decision::Delete,
            Decision::Keep,
            Decision::Delete,
            Decision::Keep,
            Decision::Delete,
            Decision::Keep,
        ] {
            handle.swipe_front(decision).await.unwrap();
        }
        let snapshot = wait_idle(&handle).await;

        assert_eq!(source.enumerate_calls(), vec![10, 20]);
        assert_eq!(snapshot.queue_ids(), asset_names(7..12));
        assert_eq!(snapshot.pending_ids(), ids(&["asset-01", "asset-03", "asset-05"]));
        assert_eq!(snapshot.statistics.kept, 4);
        let queued: HashSet<AssetId> = snapshot.queue_ids().into_iter().collect();
        assert!(snapshot.pending_ids().iter().all(|id| !queued.contains(id)));
    }

    #[tokio::test]
    async fn test_new_pages_are_appended_in_order() {
        let source = Arc::new(FixtureSource::with_assets(25));
        let handle = spawn_default(&source);
        wait_idle(&handle).await;

        assert!(handle.fetch_more().await.unwrap());
        let snapshot = wait_idle(&handle).await;
        assert_eq!(snapshot.queue_ids(), asset_names(0..20));

        assert!(handle.fetch_more().await.unwrap());
        let snapshot = wait_idle(&handle).await;
        assert_eq!(snapshot.queue_ids(), asset_names(0..25));
        assert_eq!(snapshot.fetch_limit, 30);
    }

    #[tokio::test]
    async fn test_only_front_is_actionable() {
        let source = Arc::new(FixtureSource::with_assets(5));
        let handle = spawn_default(&source);
        let before = wait_idle(&handle).await;

        let err = handle.swipe(2, Decision::Delete).await.unwrap_err();

        assert!(matches!(
            err,
            PhotoTinderError::IndexOutOfRange { index: 2, len: 5 }
        ));
        let after = handle.snapshot();
        assert_eq!(after.queue_ids(), before.queue_ids());
        assert!(after.pending.is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_lands_in_empty_and_can_retry() {
        let source = Arc::new(FixtureSource::with_assets(5));
        source.set_enumerate_failure(true);
        let handle = spawn_default(&source);

        let snapshot = wait_idle(&handle).await;
        assert_eq!(snapshot.phase, ReviewPhase::Empty);
        assert!(snapshot
            .last_error
            .as_deref()
            .is_some_and(|e| e.contains("unavailable")));

        source.set_enumerate_failure(false);
        assert!(handle.fetch_more().await.unwrap());
        let snapshot = wait_idle(&handle).await;
        assert_eq!(snapshot.phase, ReviewPhase::Ready);
        assert_eq!(snapshot.queue.len(), 5);
        assert!(snapshot.last_error.is_none());
    }

    #[tokio::test]
    async fn test_empty_library_ends_empty() {
        let source = Arc::new(FixtureSource::new());
        let handle = spawn_default(&source);

        let snapshot = wait_idle(&handle).await;
        assert_eq!(snapshot.phase, ReviewPhase::Empty);
        assert!(snapshot.last_error.is_none());
        assert_eq!(source.enumerate_calls(), vec![10]);
        assert_eq!(source.fetch_calls(), 0);
    }

    #[tokio::test]
    async fn test_draining_the_queue_ends_empty() {
        let source = Arc::new(FixtureSource::with_assets(2));
        let handle = spawn_default(&source);
        wait_idle(&handle).await;

        handle.swipe_front(Decision::Keep).await.unwrap();
        handle.swipe_front(Decision::Delete).await.unwrap();
        let snapshot = wait_idle(&handle).await;

        assert_eq!(snapshot.phase, ReviewPhase::Empty);
        assert!(snapshot.queue.is_empty());
        assert_eq!(snapshot.statistics.reviewed(), 2);
    }

    #[tokio::test]
    async fn test_second_delete_is_rejected_while_one_runs() {
        let source = Arc::new(FixtureSource::with_assets(6));
        let handle = spawn_default(&source);
        wait_idle(&handle).await;
        handle.swipe_front(Decision::Delete).await.unwrap();

        source.pause_deletion();
        let first = {
            let handle = handle.clone();
            tokio::spawn(async move { handle.delete_all().await })
        };
        let snapshot = wait_until(&handle, |s| s.is_deleting).await;
        assert_eq!(snapshot.phase, ReviewPhase::Deleting);

        assert!(matches!(
            handle.delete_all().await,
            Err(PhotoTinderError::DeleteInProgress)
        ));
        // Swipes are not blocked by the delete
        handle.swipe_front(Decision::Delete).await.unwrap();
        assert_eq!(handle.snapshot().phase, ReviewPhase::Deleting);

        source.resume_deletion();
        let outcome = first.await.unwrap().unwrap();
        assert_eq!(outcome, DeleteOutcome::Committed { count: 1 });

        let snapshot = handle.snapshot();
        assert_eq!(snapshot.phase, ReviewPhase::Ready);
        assert_eq!(snapshot.pending_ids(), ids(&["asset-01"]));
        assert_eq!(source.delete_calls(), vec![ids(&["asset-00"])]);
    }

    #[tokio::test]
    async fn test_events_are_broadcast() {
        let source = Arc::new(FixtureSource::with_assets(5));
        let handle = spawn_default(&source);
        wait_idle(&handle).await;
        let mut events = handle.events();

        handle.swipe_front(Decision::Delete).await.unwrap();
        handle.delete_all().await.unwrap();

        let event = tokio::time::timeout(Duration::from_secs(1), events.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event, ReviewEvent::DeleteCommitted { count: 1 });
    }

    #[tokio::test]
    async fn test_sets_stay_disjoint_over_a_session() {
        let source = Arc::new(FixtureSource::with_assets(40));
        let handle = spawn_default(&source);
        wait_idle(&handle).await;

        for i in 0..30 {
            let decision = if i % 3 == 0 {
                Decision::Delete
            } else {
                Decision::Keep
            };
            if handle.swipe_front(decision).await.is_err() {
                wait_idle(&handle).await;
                continue;
            }
            let snapshot = handle.snapshot();
            let queued: HashSet<AssetId> = snapshot.queue_ids().into_iter().collect();
            assert_eq!(queued.len(), snapshot.queue.len());
            assert!(snapshot.pending_ids().iter().all(|id| !queued.contains(id)));
        }

        let snapshot = wait_idle(&handle).await;
        let total = snapshot.statistics.reviewed() + snapshot.queue.len();
        assert!(total <= 40);
    }

    #[tokio::test]
    async fn test_shutdown_stops_controller() {
        let source = Arc::new(FixtureSource::with_assets(1));
        let handle = spawn_default(&source);
        wait_idle(&handle).await;

        handle.shutdown().await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(matches!(
            handle.fetch_more().await,
            Err(PhotoTinderError::ControllerStopped)
        ));
    }

    #[test]
    fn test_sync_client_swipes_and_deletes() {
        let source = Arc::new(FixtureSource::with_assets(5));
        let mut client = SyncReviewClient::start(
            Arc::clone(&source) as Arc<dyn AssetSource>,
            ReviewConfig::default(),
        )
        .unwrap();

        let mut ready = false;
        for _ in 0..50 {
            if client.snapshot().phase == ReviewPhase::Ready {
                ready = true;
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(ready, "controller should load photos");

        client.swipe_front(Decision::Delete).unwrap();
        assert!(client.start_delete());
        assert!(!client.start_delete());

        let mut outcome = None;
        for _ in 0..50 {
            if let Some(result) = client.poll_delete() {
                outcome = Some(result);
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(
            outcome.unwrap().unwrap(),
            DeleteOutcome::Committed { count: 1 }
        );
        assert!(!client.is_delete_running());
        assert!(!source.contains(&AssetId::new("asset-00")));

        client.shutdown();
    }

    #[test]
    fn test_sync_client_wait_delete_blocks_until_committed() {
        let source = Arc::new(FixtureSource::with_assets(5));
        let mut client = SyncReviewClient::start(
            Arc::clone(&source) as Arc<dyn AssetSource>,
            ReviewConfig::default(),
        )
        .unwrap();
        assert!(client.wait_delete().is_none());

        for _ in 0..50 {
            if client.snapshot().phase == ReviewPhase::Ready {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }

        client.swipe_front(Decision::Delete).unwrap();
        source.pause_deletion();
        assert!(client.start_delete());

        let resumer = {
            let source = Arc::clone(&source);
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(50));
                source.resume_deletion();
            })
        };
        let outcome = client.wait_delete().unwrap().unwrap();
        assert_eq!(outcome, DeleteOutcome::Committed { count: 1 });
        assert!(!client.is_delete_running());

        let stats = client.snapshot().statistics;
        assert_eq!(stats.deleted, 1);
        assert_eq!(stats.pending_delete, 0);

        resumer.join().unwrap();
        client.shutdown();
    }
}
