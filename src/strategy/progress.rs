//! Backpressure-aware stream of fetches

use super::{FetchContext, FetchStrategy, SnapshotSink, StrategyKind};
use crate::model::Repo;
use crate::{ContributorsError, Result};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tokio_util::task::AbortOnDropHandle;

/// Default cap on concurrently pending fetches
pub const DEFAULT_MAX_IN_FLIGHT: usize = 10;

/// Drives spawned fetches through `buffer_unordered`
///
/// At most `max_in_flight` fetches are pending at any time and new ones are
/// only started as the sink consumes results, so a slow consumer throttles
/// the fetching. Each fetch runs in its own task, so fetches already started
/// keep going while the sink waits on the consumer. Their handles abort the
/// task on drop, so no fetch outlives the strategy.
#[derive(Debug, Clone, Copy)]
pub struct ProgressStrategy {
    max_in_flight: usize,
}

impl ProgressStrategy {
    pub fn new(max_in_flight: usize) -> Self {
        Self {
            max_in_flight: max_in_flight.max(1),
        }
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }
}

impl Default for ProgressStrategy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_IN_FLIGHT)
    }
}

#[async_trait]
impl FetchStrategy for ProgressStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Progress
    }

    async fn collect(
        &self,
        ctx: FetchContext,
        repos: Vec<Repo>,
        sink: &mut SnapshotSink,
    ) -> Result<()> {
        let mut results = stream::iter(repos)
            .map(|repo| {
                let ctx = ctx.clone();
                AbortOnDropHandle::new(tokio::spawn(async move {
                    let users = ctx.fetch(&repo).await;
                    (repo, users)
                }))
            })
            .buffer_unordered(self.max_in_flight);

        while let Some(joined) = results.next().await {
            let (repo, users) = joined.map_err(|e| {
                ContributorsError::Other(format!("Contributors task failed: {}", e))
            })?;
            sink.deliver(&repo, users?).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::MockSource;
    use crate::model::User;
    use crate::strategy::launch_with;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::Instant;
    use tokio_util::sync::CancellationToken;

    #[test]
    fn test_max_in_flight_is_at_least_one() {
        assert_eq!(ProgressStrategy::new(0).max_in_flight(), 1);
        assert_eq!(ProgressStrategy::default().max_in_flight(), DEFAULT_MAX_IN_FLIGHT);
    }

    #[tokio::test(start_paused = true)]
    async fn test_observes_progress_while_fetches_in_flight() {
        let source = Arc::new(MockSource::sample());
        let start = Instant::now();
        let mut stream = launch_with(
            Arc::new(ProgressStrategy::default()),
            source.clone(),
            "kotlin",
            16,
            CancellationToken::new(),
        );

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(1800));
        assert!(!first.completed);
        // The two slower repositories are still being fetched
        assert_eq!(source.contributor_calls(), 3);
        assert_eq!(source.contributor_completions(), 1);

        let mut times = vec![1800];
        while let Some(item) = stream.next().await {
            item.unwrap();
            times.push(start.elapsed().as_millis());
        }
        assert_eq!(times, vec![1800, 2000, 2200]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_limits_fetches_in_flight() {
        let mut source = MockSource::new();
        for id in 0..6u64 {
            source = source.with_repo(
                Repo::new(id, format!("repo-{}", id)),
                Duration::from_millis(100),
                vec![User::new("x", 1)],
            );
        }
        let source = Arc::new(source);
        let start = Instant::now();

        let stream = launch_with(
            Arc::new(ProgressStrategy::new(2)),
            source.clone(),
            "org",
            16,
            CancellationToken::new(),
        );

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(source.contributor_calls(), 2);

        let last = stream.last().await.unwrap();
        assert_eq!(last.users.contributions("x"), Some(6));
        // Three waves of two
        assert_eq!(start.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetches_keep_running_while_consumer_lags() {
        let mut source = MockSource::new();
        for id in 0..3u64 {
            source = source.with_repo(
                Repo::new(id, format!("repo-{}", id)),
                Duration::from_millis(100),
                vec![User::new("x", 1)],
            );
        }
        let source = Arc::new(source);

        // One buffered snapshot: the second delivery waits for the consumer
        let mut stream = launch_with(
            Arc::new(ProgressStrategy::new(3)),
            source.clone(),
            "org",
            1,
            CancellationToken::new(),
        );

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(source.contributor_completions(), 3);

        let mut received = 0;
        while let Some(item) = stream.next().await {
            item.unwrap();
            received += 1;
        }
        assert_eq!(received, 3);
    }
}
