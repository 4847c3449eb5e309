//! Concurrent producers feeding a buffered channel

use super::{FetchContext, FetchStrategy, SnapshotSink, StrategyKind};
use crate::model::{Repo, User};
use crate::{ContributorsError, Result};
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::trace;

/// Spawned producers send results into an `mpsc` channel drained by the sink
///
/// The channel is sized to the repository count, so no producer can ever
/// block on a full buffer while the consumer is still launching producers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelStrategy;

#[async_trait]
impl FetchStrategy for ChannelStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Channel
    }

    async fn collect(
        &self,
        ctx: FetchContext,
        repos: Vec<Repo>,
        sink: &mut SnapshotSink,
    ) -> Result<()> {
        let (tx, mut rx) = mpsc::channel::<(Repo, Result<Vec<User>>)>(repos.len().max(1));

        let mut producers = JoinSet::new();
        for repo in repos {
            let ctx = ctx.clone();
            let tx = tx.clone();
            producers.spawn(async move {
                let users = ctx.fetch(&repo).await;
                // Consumer gone means the run is over
                let _ = tx.send((repo, users)).await;
            });
        }
        // Only producers hold senders now; the channel closes when they are all done
        drop(tx);
        trace!(producers = producers.len(), "Spawned contributors producers");

        let result = receive(&ctx, &mut rx, sink).await;
        if result.is_err() {
            rx.close();
            producers.shutdown().await;
        }
        result
    }
}

async fn receive(
    ctx: &FetchContext,
    rx: &mut mpsc::Receiver<(Repo, Result<Vec<User>>)>,
    sink: &mut SnapshotSink,
) -> Result<()> {
    while sink.remaining() > 0 {
        let received = tokio::select! {
            biased;
            _ = ctx.cancelled() => return Err(ContributorsError::Canceled),
            received = rx.recv() => received,
        };

        match received {
            Some((repo, users)) => sink.deliver(&repo, users?).await?,
            None => {
                return Err(ContributorsError::Other(format!(
                    "Channel closed with {} result(s) missing",
                    sink.remaining()
                )))
            }
        }
    }
    Ok(())
}
