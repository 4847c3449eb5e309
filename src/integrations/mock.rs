//! In-memory remote source with simulated latency
//!
//! Used by the test suites and for offline demos. Delays go through
//! `tokio::time::sleep`, so tests running with a paused clock observe exact
//! virtual timings.

use super::source::{RemoteSource, SourceError};
use crate::model::{Repo, User};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug, Clone)]
struct MockRepo {
    repo: Repo,
    delay: Duration,
    outcome: Result<Vec<User>, String>,
}

/// Scripted [`RemoteSource`] returning fixed repositories and contributors
#[derive(Debug, Default)]
pub struct MockSource {
    repos_delay: Duration,
    repos_failure: Option<String>,
    repos: Vec<MockRepo>,
    contributor_calls: AtomicUsize,
    contributor_completions: AtomicUsize,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Three repositories with overlapping contributors and uneven latency
    ///
    /// Repositories answer after 1000, 1200 and 800 ms respectively; the
    /// repository list itself takes 1000 ms.
    pub fn sample() -> Self {
        Self::new()
            .with_repos_delay(Duration::from_millis(1000))
            .with_repo(
                Repo::new(1, "repo-1"),
                Duration::from_millis(1000),
                vec![User::new("user-1", 10), User::new("user-2", 20)],
            )
            .with_repo(
                Repo::new(2, "repo-2"),
                Duration::from_millis(1200),
                vec![User::new("user-2", 30), User::new("user-1", 40)],
            )
            .with_repo(
                Repo::new(3, "repo-3"),
                Duration::from_millis(800),
                vec![User::new("user-2", 50), User::new("user-3", 60)],
            )
    }

    pub fn with_repos_delay(mut self, delay: Duration) -> Self {
        self.repos_delay = delay;
        self
    }

    /// Make the repository list fetch fail with a network error
    pub fn failing_repos(mut self, message: impl Into<String>) -> Self {
        self.repos_failure = Some(message.into());
        self
    }

    /// Add a repository answering with `users` after `delay`
    pub fn with_repo(mut self, repo: Repo, delay: Duration, users: Vec<User>) -> Self {
        self.repos.push(MockRepo {
            repo,
            delay,
            outcome: Ok(users),
        });
        self
    }

    /// Add a repository whose contributors fetch fails after `delay`
    pub fn with_failing_repo(
        mut self,
        repo: Repo,
        delay: Duration,
        message: impl Into<String>,
    ) -> Self {
        self.repos.push(MockRepo {
            repo,
            delay,
            outcome: Err(message.into()),
        });
        self
    }

    /// Number of contributors fetches started
    pub fn contributor_calls(&self) -> usize {
        self.contributor_calls.load(Ordering::SeqCst)
    }

    /// Number of contributors fetches that ran to the end of their delay
    pub fn contributor_completions(&self) -> usize {
        self.contributor_completions.load(Ordering::SeqCst)
    }

    /// Expected login -> total contributions across every successful repository
    pub fn expected_totals(&self) -> HashMap<String, u64> {
        let mut totals = HashMap::new();
        for users in self.repos.iter().filter_map(|r| r.outcome.as_ref().ok()) {
            for user in users {
                *totals.entry(user.login.clone()).or_insert(0) += user.contributions;
            }
        }
        totals
    }
}

#[async_trait]
impl RemoteSource for MockSource {
    async fn fetch_repos(&self, _org: &str) -> Result<Vec<Repo>, SourceError> {
        sleep(self.repos_delay).await;
        if let Some(ref message) = self.repos_failure {
            return Err(SourceError::Network(message.clone()));
        }
        Ok(self.repos.iter().map(|r| r.repo.clone()).collect())
    }

    async fn fetch_contributors(&self, _owner: &str, repo: &Repo) -> Result<Vec<User>, SourceError> {
        self.contributor_calls.fetch_add(1, Ordering::SeqCst);

        let entry = self
            .repos
            .iter()
            .find(|r| r.repo.id == repo.id)
            .ok_or_else(|| SourceError::NotFound(repo.name.clone()))?;

        sleep(entry.delay).await;
        self.contributor_completions.fetch_add(1, Ordering::SeqCst);

        entry.outcome.clone().map_err(SourceError::Network)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_sample_repos_take_virtual_time() {
        let source = MockSource::sample();
        let start = tokio::time::Instant::now();

        let repos = source.fetch_repos("kotlin").await.unwrap();
        assert_eq!(repos.len(), 3);
        assert_eq!(start.elapsed(), Duration::from_millis(1000));

        let users = source.fetch_contributors("kotlin", &repos[2]).await.unwrap();
        assert_eq!(users[1], User::new("user-3", 60));
        assert_eq!(start.elapsed(), Duration::from_millis(1800));
        assert_eq!(source.contributor_calls(), 1);
    }

    #[tokio::test]
    async fn test_failures_are_network_errors() {
        let source = MockSource::new().failing_repos("connection reset");
        assert!(matches!(
            source.fetch_repos("kotlin").await,
            Err(SourceError::Network(_))
        ));

        let source = MockSource::new().with_failing_repo(Repo::new(7, "broken"), Duration::ZERO, "boom");
        let err = source
            .fetch_contributors("kotlin", &Repo::new(7, "broken"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Network error: boom");
    }

    #[test]
    fn test_expected_totals_sum_across_repos() {
        let totals = MockSource::sample().expected_totals();
        assert_eq!(totals["user-1"], 50);
        assert_eq!(totals["user-2"], 100);
        assert_eq!(totals["user-3"], 60);
    }
}
