//! Remote sources
//!
//! The aggregation pipeline talks to the remote API only through the
//! [`RemoteSource`] trait.
//!
//! # Built-in Sources
//!
//! - **GitHub**: REST v3 adapter (`orgs/{org}/repos`, `repos/{owner}/{repo}/contributors`)
//! - **Mock**: scripted in-memory source with simulated latency

pub mod github;
pub mod mock;
mod source;

pub use github::{GitHubSource, DEFAULT_API_URL};
pub use mock::MockSource;
pub use source::{RemoteSource, SourceError};
