//! Snapshot stream returned by a run

use crate::aggregator::Snapshot;
use crate::{ContributorsError, Result};
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Lazy, single-use sequence of snapshots of one run
///
/// Yields one `Ok(Snapshot)` per merged repository, the last of which has
/// `completed == true`. A failed run yields a single `Err` and ends. A
/// cancelled run simply ends, without a completed snapshot.
///
/// Dropping the stream aborts the run.
pub struct SnapshotStream {
    rx: mpsc::Receiver<Result<Snapshot>>,
    driver: Option<JoinHandle<()>>,
}

impl SnapshotStream {
    pub(super) fn new(rx: mpsc::Receiver<Result<Snapshot>>, driver: JoinHandle<()>) -> Self {
        Self {
            rx,
            driver: Some(driver),
        }
    }

    /// Drain the stream and return its completed snapshot
    ///
    /// Returns `ContributorsError::Canceled` when the stream ends before
    /// completion.
    pub async fn last(mut self) -> Result<Snapshot> {
        let mut last = None;
        while let Some(item) = self.rx.recv().await {
            last = Some(item?);
        }
        self.close().await;

        match last {
            Some(snapshot) if snapshot.completed => Ok(snapshot),
            _ => Err(ContributorsError::Canceled),
        }
    }

    /// Stop receiving and wait for the run's driver task to finish
    ///
    /// The driver observes the closed channel at its next emission, so this
    /// only returns once no fetch of the run is still running.
    pub async fn close(mut self) {
        self.rx.close();
        if let Some(driver) = self.driver.take() {
            if let Err(e) = driver.await {
                if e.is_panic() {
                    tracing::error!(error = %e, "Run driver panicked");
                }
            }
        }
    }
}

impl Stream for SnapshotStream {
    type Item = Result<Snapshot>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for SnapshotStream {
    fn drop(&mut self) {
        if let Some(driver) = self.driver.take() {
            driver.abort();
        }
    }
}
