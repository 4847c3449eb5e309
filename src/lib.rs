//! Contributors - GitHub organization contributor aggregation
//!
//! Loads the repositories of an organization, then the contributors of every
//! repository, and merges them into one running total that can be observed
//! while it grows.
//!
//! # Architecture
//!
//! - **model**: Core data types (Repo, User, RequestData)
//! - **integrations**: Remote sources (GitHub REST, in-memory mock)
//! - **aggregator**: Merging contributor lists and producing snapshots
//! - **strategy**: Sequential, concurrent, channel and progress fetch strategies
//! - **orchestrator**: Single-run lifecycle, published loading state, cancellation
//! - **config**: Stored loading parameters and validation

// Core modules
pub mod aggregator;
pub mod config;
pub mod error;
pub mod model;

// Pipeline
pub mod integrations;
pub mod orchestrator;
pub mod strategy;

pub mod logging;

// Re-exports
pub use error::{ContributorsError, Result};
