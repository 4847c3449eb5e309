//! All requests at once, collected in completion order

use super::{FetchContext, FetchStrategy, SnapshotSink, StrategyKind};
use crate::model::{Repo, User};
use crate::{ContributorsError, Result};
use async_trait::async_trait;
use tokio::task::JoinSet;
use tracing::trace;

type FetchOutcome = (Repo, Result<Vec<User>>);

/// Spawns one task per repository and merges results as tasks finish
///
/// Tasks live in a [`JoinSet`], so whichever fetch finishes first is merged
/// first and no task outlives the run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConcurrentStrategy;

#[async_trait]
impl FetchStrategy for ConcurrentStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Concurrent
    }

    async fn collect(
        &self,
        ctx: FetchContext,
        repos: Vec<Repo>,
        sink: &mut SnapshotSink,
    ) -> Result<()> {
        let mut tasks: JoinSet<FetchOutcome> = JoinSet::new();
        for repo in repos {
            let ctx = ctx.clone();
            tasks.spawn(async move {
                let users = ctx.fetch(&repo).await;
                (repo, users)
            });
        }
        trace!(tasks = tasks.len(), "Spawned contributors fetches");

        let result = drain(&ctx, &mut tasks, sink).await;
        if result.is_err() {
            tasks.shutdown().await;
        }
        result
    }
}

async fn drain(
    ctx: &FetchContext,
    tasks: &mut JoinSet<FetchOutcome>,
    sink: &mut SnapshotSink,
) -> Result<()> {
    loop {
        let joined = tokio::select! {
            biased;
            _ = ctx.cancelled() => return Err(ContributorsError::Canceled),
            joined = tasks.join_next() => joined,
        };

        let Some(joined) = joined else {
            return Ok(());
        };
        let (repo, users) = joined
            .map_err(|e| ContributorsError::Other(format!("Contributors task failed: {}", e)))?;
        sink.deliver(&repo, users?).await?;
    }
}

#[cfg(test)]
mod tests {
    use crate::integrations::MockSource;
    use crate::model::{Repo, User};
    use crate::strategy::{launch_with, ConcurrentStrategy};
    use crate::ContributorsError;
    use futures::StreamExt;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::Instant;
    use tokio_util::sync::CancellationToken;

    #[tokio::test(start_paused = true)]
    async fn test_emits_in_completion_order() {
        let source = Arc::new(MockSource::sample());
        let start = Instant::now();
        let mut stream = launch_with(
            Arc::new(ConcurrentStrategy),
            source,
            "kotlin",
            16,
            CancellationToken::new(),
        );

        let mut times = Vec::new();
        let mut snapshots = Vec::new();
        while let Some(item) = stream.next().await {
            times.push(start.elapsed().as_millis());
            snapshots.push(item.unwrap());
        }

        assert_eq!(times, vec![1800, 2000, 2200]);
        // repo-3 (800ms) first
        assert_eq!(
            snapshots[0].users.users(),
            &[User::new("user-3", 60), User::new("user-2", 50)]
        );
        assert_eq!(snapshots[1].users.contributions("user-2"), Some(70));
        assert!(snapshots[2].completed);
        assert_eq!(snapshots[2].users.contributions("user-1"), Some(50));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_aborts_outstanding_fetches() {
        let source = Arc::new(
            MockSource::new()
                .with_repo(Repo::new(1, "slow"), Duration::from_secs(10), vec![User::new("x", 1)])
                .with_failing_repo(Repo::new(2, "broken"), Duration::from_millis(100), "reset"),
        );
        let mut stream = launch_with(
            Arc::new(ConcurrentStrategy),
            source.clone(),
            "org",
            16,
            CancellationToken::new(),
        );

        let first = stream.next().await.unwrap();
        assert!(matches!(
            first,
            Err(ContributorsError::PartialFetch { ref repo, .. }) if repo == "broken"
        ));
        assert!(stream.next().await.is_none());

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(source.contributor_completions(), 1);
    }
}
