//! Per-run aggregator producing progressive snapshots

use super::merge::{merge, Aggregate};
use crate::model::User;
use crate::{ContributorsError, Result};

/// Point-in-time view of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Contributors aggregated so far
    pub users: Aggregate,

    /// True once every repository has been merged
    pub completed: bool,
}

/// Owner of a run's running aggregate
///
/// Exactly one aggregator exists per run and it is the only thing that ever
/// merges into the aggregate. Producers hand their results to whoever owns
/// the aggregator (see `strategy::SnapshotSink`).
#[derive(Debug)]
pub struct Aggregator {
    expected: usize,
    received: usize,
    current: Aggregate,
}

impl Aggregator {
    /// Create an aggregator expecting `expected` contributor lists
    pub fn new(expected: usize) -> Self {
        Self {
            expected,
            received: 0,
            current: Aggregate::new(),
        }
    }

    /// Merge one contributor list and return the resulting snapshot
    pub fn accept(&mut self, users: &[User]) -> Result<Snapshot> {
        if self.is_complete() {
            return Err(ContributorsError::Other(format!(
                "Aggregator received more than the {} expected results",
                self.expected
            )));
        }

        self.current = merge(&self.current, users);
        self.received += 1;

        tracing::debug!(
            received = self.received,
            expected = self.expected,
            contributors = self.current.len(),
            "Merged contributors"
        );

        Ok(self.snapshot())
    }

    /// Current snapshot without merging anything
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            users: self.current.clone(),
            completed: self.is_complete(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.received == self.expected
    }

    pub fn received(&self) -> usize {
        self.received
    }

    pub fn expected(&self) -> usize {
        self.expected
    }

    pub fn current(&self) -> &Aggregate {
        &self.current
    }
}
