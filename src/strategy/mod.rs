//! Fetch strategies
//!
//! Every strategy answers the same question: fan out one contributors fetch
//! per repository and hand each result to the run's aggregator as it
//! arrives. They differ only in how fetches are launched and collected.
//!
//! # Variants
//!
//! - **Sequential**: one fetch at a time, in repository order
//! - **Concurrent**: every fetch spawned at once, collected in completion order
//! - **Channel**: spawned producers send into a channel sized to the repository count
//! - **Progress**: a bounded `buffer_unordered` stream of fetch futures
//!
//! # Run lifecycle
//!
//! [`launch`] spawns a driver task that fetches the repository list, builds a
//! fresh [`SnapshotSink`] and lets the strategy collect into it. Snapshots come
//! out of the returned [`SnapshotStream`]. Cancelling the token passed to
//! `launch` stops every fetch at its next suspension point; the stream then
//! ends without a completed snapshot.

mod channel;
mod concurrent;
mod progress;
mod sequential;
mod stream;

pub use channel::ChannelStrategy;
pub use concurrent::ConcurrentStrategy;
pub use progress::{ProgressStrategy, DEFAULT_MAX_IN_FLIGHT};
pub use sequential::SequentialStrategy;
pub use stream::SnapshotStream;

use crate::aggregator::{Aggregator, Snapshot};
use crate::config::FetchConfig;
use crate::integrations::RemoteSource;
use crate::model::{Repo, RequestData, User};
use crate::{ContributorsError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Available fetch strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// One fetch at a time, in repository order
    #[default]
    Sequential,

    /// All fetches spawned at once, results in completion order
    Concurrent,

    /// Spawned producers feeding a buffered channel
    Channel,

    /// Backpressure-aware stream with a bounded number of fetches in flight
    Progress,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::Sequential,
        StrategyKind::Concurrent,
        StrategyKind::Channel,
        StrategyKind::Progress,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::Sequential => "sequential",
            StrategyKind::Concurrent => "concurrent",
            StrategyKind::Channel => "channel",
            StrategyKind::Progress => "progress",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            StrategyKind::Sequential => "One request at a time, results in repository order",
            StrategyKind::Concurrent => "All requests at once, results as they complete",
            StrategyKind::Channel => "Concurrent requests handing results over a buffered channel",
            StrategyKind::Progress => "Bounded stream of requests with backpressure",
        }
    }

    /// Instantiate the strategy
    pub fn build(&self, config: &FetchConfig) -> Arc<dyn FetchStrategy> {
        match self {
            StrategyKind::Sequential => Arc::new(SequentialStrategy),
            StrategyKind::Concurrent => Arc::new(ConcurrentStrategy),
            StrategyKind::Channel => Arc::new(ChannelStrategy),
            StrategyKind::Progress => Arc::new(ProgressStrategy::new(config.max_in_flight)),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = ContributorsError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase();
        StrategyKind::ALL
            .into_iter()
            .find(|kind| kind.name() == normalized)
            .ok_or_else(|| {
                ContributorsError::Validation(format!(
                    "Unknown strategy '{}'. Must be one of: sequential, concurrent, channel, progress",
                    s
                ))
            })
    }
}

/// Launch/collect policy for the contributors fetches of one run
#[async_trait]
pub trait FetchStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Fetch contributors of every repository and deliver each list to `sink`
    ///
    /// Must deliver exactly one result per repository on success and return
    /// the first error otherwise, leaving no spawned task running.
    async fn collect(&self, ctx: FetchContext, repos: Vec<Repo>, sink: &mut SnapshotSink)
        -> Result<()>;
}

/// What a strategy needs to issue contributors fetches
#[derive(Clone)]
pub struct FetchContext {
    source: Arc<dyn RemoteSource>,
    owner: Arc<str>,
    cancel: CancellationToken,
}

impl FetchContext {
    pub fn new(source: Arc<dyn RemoteSource>, owner: &str, cancel: CancellationToken) -> Self {
        Self {
            source,
            owner: Arc::from(owner),
            cancel,
        }
    }

    /// Fetch one repository's contributors, giving up as soon as the run is cancelled
    pub async fn fetch(&self, repo: &Repo) -> Result<Vec<User>> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ContributorsError::Canceled),
            result = self.source.fetch_contributors(&self.owner, repo) => {
                result.map_err(|source| {
                    warn!(repo = %repo.name, error = %source, "Contributors fetch failed");
                    ContributorsError::PartialFetch {
                        repo: repo.name.clone(),
                        source,
                    }
                })
            }
        }
    }

    /// Resolves when the run is cancelled
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }
}

/// Single consumption point of a run
///
/// Owns the run's [`Aggregator`]; every delivered result is merged here and
/// the resulting snapshot is pushed to the [`SnapshotStream`].
pub struct SnapshotSink {
    aggregator: Aggregator,
    tx: mpsc::Sender<Result<Snapshot>>,
    cancel: CancellationToken,
}

impl SnapshotSink {
    fn new(expected: usize, tx: mpsc::Sender<Result<Snapshot>>, cancel: CancellationToken) -> Self {
        Self {
            aggregator: Aggregator::new(expected),
            tx,
            cancel,
        }
    }

    /// Merge one repository's contributors and emit a snapshot
    ///
    /// Results arriving after cancellation are discarded unmerged.
    pub async fn deliver(&mut self, repo: &Repo, users: Vec<User>) -> Result<()> {
        if self.cancel.is_cancelled() {
            debug!(repo = %repo.name, "Discarding result of cancelled run");
            return Err(ContributorsError::Canceled);
        }

        let snapshot = self.aggregator.accept(&users)?;
        debug!(
            repo = %repo.name,
            received = self.aggregator.received(),
            expected = self.aggregator.expected(),
            "Delivered contributors"
        );
        self.emit(snapshot).await
    }

    /// Number of results still expected
    pub fn remaining(&self) -> usize {
        self.aggregator.expected() - self.aggregator.received()
    }

    pub fn is_complete(&self) -> bool {
        self.aggregator.is_complete()
    }

    async fn emit(&self, snapshot: Snapshot) -> Result<()> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ContributorsError::Canceled),
            // A dropped stream means nobody is listening any more
            sent = self.tx.send(Ok(snapshot)) => sent.map_err(|_| ContributorsError::Canceled),
        }
    }
}

/// Start a run of `kind` against `source`
pub fn launch(
    kind: StrategyKind,
    source: Arc<dyn RemoteSource>,
    req: &RequestData,
    config: &FetchConfig,
    cancel: CancellationToken,
) -> SnapshotStream {
    launch_with(
        kind.build(config),
        source,
        &req.org,
        config.snapshot_buffer,
        cancel,
    )
}

/// Start a run with an already built strategy
pub fn launch_with(
    strategy: Arc<dyn FetchStrategy>,
    source: Arc<dyn RemoteSource>,
    org: &str,
    snapshot_buffer: usize,
    cancel: CancellationToken,
) -> SnapshotStream {
    let (tx, rx) = mpsc::channel(snapshot_buffer.max(1));
    let org = org.to_string();

    let driver = tokio::spawn(async move {
        let result = drive(strategy, source, &org, tx.clone(), cancel).await;
        match result {
            Ok(()) => {}
            Err(ContributorsError::Canceled) => {
                debug!(org = %org, "Run cancelled");
            }
            Err(e) => {
                // Receiver may already be gone; nothing left to report to then
                let _ = tx.send(Err(e)).await;
            }
        }
    });

    SnapshotStream::new(rx, driver)
}

async fn drive(
    strategy: Arc<dyn FetchStrategy>,
    source: Arc<dyn RemoteSource>,
    org: &str,
    tx: mpsc::Sender<Result<Snapshot>>,
    cancel: CancellationToken,
) -> Result<()> {
    let repos = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(ContributorsError::Canceled),
        result = source.fetch_repos(org) => result.map_err(ContributorsError::Transport)?,
    };

    info!(
        org = %org,
        repos = repos.len(),
        strategy = %strategy.kind(),
        "Loading contributors"
    );

    let mut sink = SnapshotSink::new(repos.len(), tx, cancel.clone());
    if repos.is_empty() {
        let snapshot = sink.aggregator.snapshot();
        return sink.emit(snapshot).await;
    }

    let ctx = FetchContext::new(source, org, cancel);
    strategy.collect(ctx, repos, &mut sink).await?;

    if !sink.is_complete() {
        return Err(ContributorsError::Other(format!(
            "{} strategy finished with {} result(s) missing",
            strategy.kind(),
            sink.remaining()
        )));
    }

    info!(org = %org, "All contributors loaded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_kind_parsing() {
        assert_eq!(
            "sequential".parse::<StrategyKind>().unwrap(),
            StrategyKind::Sequential
        );
        assert_eq!(" Progress ".parse::<StrategyKind>().unwrap(), StrategyKind::Progress);
        assert!("blocking".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn test_strategy_kind_names_round_trip() {
        for kind in StrategyKind::ALL {
            assert_eq!(kind.to_string().parse::<StrategyKind>().unwrap(), kind);
            assert!(!kind.description().is_empty());
        }
    }

    #[test]
    fn test_strategy_kind_serde_kebab_case() {
        let yaml = serde_yaml::to_string(&StrategyKind::Concurrent).unwrap();
        assert_eq!(yaml.trim(), "concurrent");
        let kind: StrategyKind = serde_yaml::from_str("channel").unwrap();
        assert_eq!(kind, StrategyKind::Channel);
    }

    #[test]
    fn test_build_matches_kind() {
        let config = FetchConfig::default();
        for kind in StrategyKind::ALL {
            assert_eq!(kind.build(&config).kind(), kind);
        }
    }
}
