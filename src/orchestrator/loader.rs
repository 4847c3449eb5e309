//! Run orchestration with cooperative cancellation

use super::state::{LoadingState, LoadingStatus, RunOutcome};
use crate::aggregator::Aggregate;
use crate::config::FetchConfig;
use crate::integrations::{GitHubSource, RemoteSource};
use crate::model::RequestData;
use crate::strategy::{self, SnapshotStream, StrategyKind};
use crate::{ContributorsError, Result};
use futures::StreamExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Builds the remote source of a run from its request
pub type SourceFactory = Box<dyn Fn(&RequestData) -> Result<Arc<dyn RemoteSource>> + Send + Sync>;

/// Handle to a started run
#[must_use = "a run handle is needed to wait for or cancel the run"]
pub struct RunHandle {
    id: u64,
    cancel: CancellationToken,
    task: JoinHandle<RunOutcome>,
}

impl RunHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Wait for the run to end on its own
    pub async fn wait(self) -> RunOutcome {
        join_outcome(self.task).await
    }
}

/// Id stored in `Orchestrator::active` while no run is active
const IDLE: u64 = 0;

/// Starts loading runs and publishes their progress
///
/// At most one run is active at a time. Progress is published as a
/// [`LoadingState`] on a watch channel; see [`Orchestrator::subscribe`].
///
/// A run stops being active as soon as its terminal state is published, so
/// a subscriber seeing `can_start()` may start the next run right away.
pub struct Orchestrator {
    source_factory: SourceFactory,
    config: FetchConfig,
    state: Arc<watch::Sender<LoadingState>>,
    /// Id of the active run, or `IDLE`
    active: Arc<AtomicU64>,
    next_id: AtomicU64,
}

impl Orchestrator {
    /// Create an orchestrator building its source with `source_factory`
    pub fn new(source_factory: SourceFactory, config: FetchConfig) -> Self {
        let (state, _) = watch::channel(LoadingState::default());
        Self {
            source_factory,
            config,
            state: Arc::new(state),
            active: Arc::new(AtomicU64::new(IDLE)),
            next_id: AtomicU64::new(1),
        }
    }

    /// Orchestrator fetching from GitHub at `config.api_url`
    pub fn github(config: FetchConfig) -> Self {
        let api_url = config.api_url.clone();
        Self::new(
            Box::new(move |req: &RequestData| {
                let source: Arc<dyn RemoteSource> =
                    Arc::new(GitHubSource::with_base_url(req, &api_url)?);
                Ok(source)
            }),
            config,
        )
    }

    /// Orchestrator reusing one source for every run
    pub fn with_source(source: Arc<dyn RemoteSource>, config: FetchConfig) -> Self {
        Self::new(Box::new(move |_: &RequestData| Ok(source.clone())), config)
    }

    /// Receiver of every published loading state
    pub fn subscribe(&self) -> watch::Receiver<LoadingState> {
        self.state.subscribe()
    }

    /// Current loading state
    pub fn state(&self) -> LoadingState {
        self.state.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.active.load(Ordering::SeqCst) != IDLE
    }

    /// Start loading contributors of `req.org` with `kind`
    ///
    /// Fails with [`ContributorsError::AlreadyRunning`] while a previous run
    /// has not ended.
    pub fn start(&self, req: RequestData, kind: StrategyKind) -> Result<RunHandle> {
        req.validate()?;

        // Ids are never reused, so a stale handle can never match a newer run
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        if self
            .active
            .compare_exchange(IDLE, id, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ContributorsError::AlreadyRunning);
        }

        let source = match (self.source_factory)(&req) {
            Ok(source) => source,
            Err(e) => {
                self.active.store(IDLE, Ordering::SeqCst);
                return Err(e);
            }
        };

        let cancel = CancellationToken::new();
        let started = Instant::now();

        self.state.send_replace(LoadingState {
            status: LoadingStatus::InProgress,
            users: Aggregate::new(),
            elapsed: std::time::Duration::ZERO,
        });

        info!(run = id, org = %req.org, strategy = %kind, "Starting run");

        let stream = strategy::launch(kind, source, &req, &self.config, cancel.clone());
        let state = Arc::clone(&self.state);
        let active = Arc::clone(&self.active);
        let run_cancel = cancel.clone();

        let task = tokio::spawn(async move {
            let run = ActiveRun {
                id,
                active: &active,
                cancel: &run_cancel,
            };
            let outcome = observe(stream, &state, &run, started).await;
            run.release();
            info!(run = id, outcome = %outcome, "Run finished");
            outcome
        });

        Ok(RunHandle { id, cancel, task })
    }

    /// Cancel a run and wait until none of its tasks is left running
    ///
    /// Nothing from the run is published once this is called. A run that
    /// already ended keeps its outcome, which is returned as is, and the
    /// published state of any newer run is left alone.
    pub async fn cancel(&self, handle: RunHandle) -> RunOutcome {
        let run = ActiveRun {
            id: handle.id,
            active: &self.active,
            cancel: &handle.cancel,
        };
        let canceled = self.state.send_if_modified(|state| {
            if !run.is_active() || state.status != LoadingStatus::InProgress {
                return false;
            }
            run.cancel.cancel();
            run.release();
            state.status = LoadingStatus::Canceled;
            state.elapsed = std::time::Duration::ZERO;
            true
        });

        if canceled {
            info!(run = handle.id, "Run canceled");
        } else {
            debug!(run = handle.id, "Cancel requested for a run that already ended");
        }

        join_outcome(handle.task).await
    }
}

/// One run's claim on `Orchestrator::active`
struct ActiveRun<'a> {
    id: u64,
    active: &'a AtomicU64,
    cancel: &'a CancellationToken,
}

impl ActiveRun<'_> {
    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst) == self.id
    }

    /// Give up the claim; a no-op once a newer run holds it
    fn release(&self) {
        let _ = self
            .active
            .compare_exchange(self.id, IDLE, Ordering::SeqCst, Ordering::SeqCst);
    }

    /// Whether this run may still publish
    fn may_publish(&self) -> bool {
        !self.cancel.is_cancelled()
    }
}

/// Publish every snapshot of `stream` until it ends or the run is cancelled
///
/// Every terminal state is published together with releasing `run`, under
/// the watch lock.
async fn observe(
    mut stream: SnapshotStream,
    state: &watch::Sender<LoadingState>,
    run: &ActiveRun<'_>,
    started: Instant,
) -> RunOutcome {
    let mut outcome = None;

    while let Some(item) = stream.next().await {
        match item {
            Ok(snapshot) => {
                let completed = snapshot.completed;
                // Checked under the watch lock, which cancel() also takes
                let published = state.send_if_modified(|s| {
                    if !run.may_publish() {
                        return false;
                    }
                    s.status = if completed {
                        run.release();
                        LoadingStatus::Completed
                    } else {
                        LoadingStatus::InProgress
                    };
                    s.users = snapshot.users.clone();
                    s.elapsed = started.elapsed();
                    true
                });

                if !published {
                    break;
                }
                if completed {
                    outcome = Some(RunOutcome::Completed(snapshot.users));
                }
            }
            Err(e) => {
                let message = e.to_string();
                let published = state.send_if_modified(|s| {
                    if !run.may_publish() {
                        return false;
                    }
                    run.release();
                    s.status = LoadingStatus::Failed(message.clone());
                    // A partial aggregate is never left on display as a result
                    s.users = Aggregate::new();
                    s.elapsed = started.elapsed();
                    true
                });
                if published {
                    warn!(error = %message, "Run failed");
                    outcome = Some(RunOutcome::Failed(message));
                }
                break;
            }
        }
    }

    stream.close().await;

    match outcome {
        Some(outcome) => outcome,
        None if !run.may_publish() => RunOutcome::Canceled,
        None => {
            let message = "Run ended before all contributors were loaded".to_string();
            let published = state.send_if_modified(|s| {
                if !run.may_publish() {
                    return false;
                }
                run.release();
                s.status = LoadingStatus::Failed(message.clone());
                s.users = Aggregate::new();
                true
            });
            if published {
                RunOutcome::Failed(message)
            } else {
                RunOutcome::Canceled
            }
        }
    }
}

async fn join_outcome(task: JoinHandle<RunOutcome>) -> RunOutcome {
    match task.await {
        Ok(outcome) => outcome,
        Err(e) => RunOutcome::Failed(format!("Run task failed: {}", e)),
    }
}
