//! One request at a time

use super::{FetchContext, FetchStrategy, SnapshotSink, StrategyKind};
use crate::model::Repo;
use crate::Result;
use async_trait::async_trait;

/// Fetches repositories strictly one after another in list order
///
/// The next fetch starts only after the previous snapshot has been handed to
/// the stream, so snapshot order equals repository order.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialStrategy;

#[async_trait]
impl FetchStrategy for SequentialStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Sequential
    }

    async fn collect(
        &self,
        ctx: FetchContext,
        repos: Vec<Repo>,
        sink: &mut SnapshotSink,
    ) -> Result<()> {
        for repo in repos {
            let users = ctx.fetch(&repo).await?;
            sink.deliver(&repo, users).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::integrations::MockSource;
    use crate::model::{Repo, User};
    use crate::strategy::{launch_with, SequentialStrategy};
    use futures::StreamExt;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::Instant;
    use tokio_util::sync::CancellationToken;

    #[tokio::test(start_paused = true)]
    async fn test_emits_in_repository_order() {
        let source = Arc::new(MockSource::sample());
        let start = Instant::now();
        let mut stream = launch_with(
            Arc::new(SequentialStrategy),
            source.clone(),
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

        // repos list 1000ms, then 1000 + 1200 + 800 one after another
        assert_eq!(times, vec![2000, 3200, 4000]);
        assert_eq!(
            snapshots[0].users.users(),
            &[User::new("user-2", 20), User::new("user-1", 10)]
        );
        assert_eq!(
            snapshots[1].users.users(),
            &[User::new("user-1", 50), User::new("user-2", 50)]
        );
        assert!(!snapshots[1].completed);
        assert!(snapshots[2].completed);
        assert_eq!(snapshots[2].users.contributions("user-2"), Some(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_does_not_start_next_fetch_before_previous_finishes() {
        let source = Arc::new(
            MockSource::new()
                .with_repo(Repo::new(1, "a"), Duration::from_millis(500), vec![])
                .with_repo(Repo::new(2, "b"), Duration::from_millis(500), vec![]),
        );
        let mut stream = launch_with(
            Arc::new(SequentialStrategy),
            source.clone(),
            "org",
            16,
            CancellationToken::new(),
        );

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(source.contributor_calls(), 1);

        stream.next().await.unwrap().unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(source.contributor_calls(), 2);
    }
}
