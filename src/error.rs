//! Error types for the contributors pipeline
//!
//! Defines the crate-wide error enum covering transport, aggregation,
//! cancellation and configuration failures. Uses thiserror for ergonomic
//! error handling.

use crate::integrations::SourceError;
use thiserror::Error;

/// Result type alias for contributors operations
pub type Result<T> = std::result::Result<T, ContributorsError>;

/// Comprehensive error type for contributors operations
#[derive(Error, Debug)]
pub enum ContributorsError {
    /// Fetching the repository list failed; nothing was aggregated
    #[error("Failed to load repositories: {0}")]
    Transport(#[source] SourceError),

    /// One contributors fetch failed, aborting the whole run
    #[error("Failed to load contributors of {repo}: {source}")]
    PartialFetch {
        repo: String,
        #[source]
        source: SourceError,
    },

    /// The run was canceled by the caller
    #[error("Loading canceled")]
    Canceled,

    /// A run is already active on this orchestrator
    #[error("A loading run is already in progress")]
    AlreadyRunning,

    /// Invalid user input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP client construction errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),

    /// Anyhow errors (for more context)
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

impl ContributorsError {
    /// Whether this error represents a user-initiated abort rather than a failure
    pub fn is_canceled(&self) -> bool {
        matches!(self, ContributorsError::Canceled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_fetch_message_names_repo() {
        let err = ContributorsError::PartialFetch {
            repo: "kotlinx.coroutines".to_string(),
            source: SourceError::NotFound("repos/kotlin/kotlinx.coroutines".to_string()),
        };
        let msg = err.to_string();
        assert!(msg.contains("kotlinx.coroutines"));
        assert!(msg.contains("Not found"));
    }

    #[test]
    fn test_canceled_is_not_a_failure() {
        assert!(ContributorsError::Canceled.is_canceled());
        assert!(!ContributorsError::AlreadyRunning.is_canceled());
        assert!(!ContributorsError::Transport(SourceError::RateLimited).is_canceled());
    }
}
