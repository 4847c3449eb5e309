//! Remote source boundary
//!
//! The pipeline only needs two idempotent reads from the remote API: the
//! repositories of an organization, and the contributors of one repository.

use crate::model::{Repo, User};
use async_trait::async_trait;

/// Failure kinds surfaced by a remote source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Rate limited")]
    RateLimited,
    #[error("API error: HTTP {status}: {body}")]
    Api { status: u16, body: String },
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        SourceError::Network(e.to_string())
    }
}

/// Paginated remote API returning repositories and their contributors
///
/// Implementations must be shareable across tasks: concurrent strategies call
/// `fetch_contributors` from many tasks at once.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Fetch the repositories of an organization (first page only)
    async fn fetch_repos(&self, org: &str) -> Result<Vec<Repo>, SourceError>;

    /// Fetch the contributors of one repository (first page only)
    async fn fetch_contributors(&self, owner: &str, repo: &Repo)
        -> Result<Vec<User>, SourceError>;
}
