//! Core data types: repositories, contributors and the per-run request

use crate::{ContributorsError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A repository of an organization, the unit of one contributors fetch
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Repo {
    pub id: u64,
    pub name: String,
}

impl Repo {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A contributor of a repository with their contribution count
///
/// The login is the aggregation key: counts for the same login coming from
/// different repositories are summed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub login: String,
    pub contributions: u64,
}

impl User {
    pub fn new(login: impl Into<String>, contributions: u64) -> Self {
        Self {
            login: login.into(),
            contributions,
        }
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.login, self.contributions)
    }
}

/// Input of one loading run
///
/// Immutable once a run starts. The password is opaque (usually a personal
/// access token) and never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct RequestData {
    pub username: String,
    pub password: String,
    pub org: String,
}

impl RequestData {
    /// Create a request, rejecting empty fields
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        org: impl Into<String>,
    ) -> Result<Self> {
        let req = Self {
            username: username.into(),
            password: password.into(),
            org: org.into(),
        };
        req.validate()?;
        Ok(req)
    }

    /// Check every field for non-emptiness
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("org", &self.org),
            ("username", &self.username),
            ("password", &self.password),
        ]
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| *field)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ContributorsError::Validation(format!(
                "Missing required field(s): {}",
                missing.join(", ")
            )))
        }
    }
}

impl fmt::Debug for RequestData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestData")
            .field("username", &self.username)
            .field("password", &"***")
            .field("org", &self.org)
            .finish()
    }
}
