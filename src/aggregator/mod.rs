//! Contributor aggregation
//!
//! Merges per-repository contributor lists into one running aggregate and
//! turns every merge into an observable [`Snapshot`].

mod merge;
mod run_aggregator;

pub use merge::{merge, Aggregate};
pub use run_aggregator::{Aggregator, Snapshot};
