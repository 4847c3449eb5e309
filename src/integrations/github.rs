//! GitHub REST source
//!
//! Reads organization repositories and repository contributors from the
//! GitHub REST API v3 using basic authentication.

use super::source::{RemoteSource, SourceError};
use crate::model::{Repo, RequestData, User};
use crate::Result;
use async_trait::async_trait;
use reqwest::{header, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

/// Public GitHub REST endpoint
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Page size for both endpoints; only the first page is read
const PER_PAGE: u32 = 100;

/// Per-request timeout for list fetches
const GET_TIMEOUT: Duration = Duration::from_secs(10);

/// GitHub API client implementing [`RemoteSource`]
pub struct GitHubSource {
    client: Client,
    rest_base_url: String,
    username: String,
    password: String,
}

impl GitHubSource {
    /// Create a source for the public GitHub API
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(req: &RequestData) -> Result<Self> {
        Self::with_base_url(req, DEFAULT_API_URL)
    }

    /// Create a source against a specific GitHub or GitHub Enterprise URL
    pub fn with_base_url(req: &RequestData, url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .default_headers({
                let mut headers = header::HeaderMap::new();
                headers.insert(
                    header::USER_AGENT,
                    header::HeaderValue::from_static("contributors/0.1"),
                );
                headers.insert(
                    header::ACCEPT,
                    header::HeaderValue::from_static("application/vnd.github.v3+json"),
                );
                headers
            })
            .build()?;

        Ok(Self {
            client,
            rest_base_url: rest_base_url(url),
            username: req.username.clone(),
            password: req.password.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.rest_base_url
    }

    fn repos_url(&self, org: &str) -> String {
        format!(
            "{}/orgs/{}/repos?per_page={}",
            self.rest_base_url, org, PER_PAGE
        )
    }

    fn contributors_url(&self, owner: &str, repo: &str) -> String {
        format!(
            "{}/repos/{}/{}/contributors?per_page={}",
            self.rest_base_url, owner, repo, PER_PAGE
        )
    }

    /// GET a JSON list
    async fn get_list<T: DeserializeOwned>(
        &self,
        url: &str,
    ) -> std::result::Result<Vec<T>, SourceError> {
        let response = self
            .client
            .get(url)
            .basic_auth(&self.username, Some(&self.password))
            .timeout(GET_TIMEOUT)
            .send()
            .await?;

        decode_list(url, response).await
    }
}

/// Map a configured URL to the REST base URL
fn rest_base_url(url: &str) -> String {
    let base_url = url.trim_end_matches('/');
    if base_url.contains("api.github.com") {
        base_url.to_string()
    } else if base_url.contains("github.com") {
        DEFAULT_API_URL.to_string()
    } else if base_url.ends_with("/api/v3") {
        base_url.to_string()
    } else {
        format!("{}/api/v3", base_url)
    }
}

async fn decode_list<T: DeserializeOwned>(
    url: &str,
    response: Response,
) -> std::result::Result<Vec<T>, SourceError> {
    match response.status() {
        StatusCode::OK => Ok(response.json().await?),
        // Empty repositories answer the contributors endpoint with 204
        StatusCode::NO_CONTENT => Ok(Vec::new()),
        StatusCode::UNAUTHORIZED => Err(SourceError::Auth(
            "GitHub rejected the username/token".to_string(),
        )),
        StatusCode::FORBIDDEN => Err(SourceError::RateLimited),
        StatusCode::NOT_FOUND => Err(SourceError::NotFound(url.to_string())),
        status => {
            let body = response.text().await.unwrap_or_default();
            Err(SourceError::Api {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[async_trait]
impl RemoteSource for GitHubSource {
    async fn fetch_repos(&self, org: &str) -> std::result::Result<Vec<Repo>, SourceError> {
        debug!(org = %org, "Fetching repositories");
        let repos: Vec<Repo> = self.get_list(&self.repos_url(org)).await?;
        info!(org = %org, count = repos.len(), "Loaded repositories");
        Ok(repos)
    }

    async fn fetch_contributors(
        &self,
        owner: &str,
        repo: &Repo,
    ) -> std::result::Result<Vec<User>, SourceError> {
        debug!(owner = %owner, repo = %repo.name, "Fetching contributors");
        let users: Vec<User> = self
            .get_list(&self.contributors_url(owner, &repo.name))
            .await?;
        info!(repo = %repo.name, count = users.len(), "Loaded contributors");
        Ok(users)
    }
}
