//! Stored loading parameters
//!
//! Loads and saves ~/.config/contributors/params.yaml, the parameters of the
//! last loading run (credentials, organization, strategy) plus fetch tuning.

use crate::integrations::DEFAULT_API_URL;
use crate::model::RequestData;
use crate::strategy::{StrategyKind, DEFAULT_MAX_IN_FLIGHT};
use crate::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Fetch tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// GitHub (or GitHub Enterprise) URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Maximum pending fetches for the progress strategy
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,

    /// Snapshots buffered between a run and its consumer
    #[serde(default = "default_snapshot_buffer")]
    pub snapshot_buffer: usize,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_max_in_flight() -> usize {
    DEFAULT_MAX_IN_FLIGHT
}

fn default_snapshot_buffer() -> usize {
    16
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            max_in_flight: default_max_in_flight(),
            snapshot_buffer: default_snapshot_buffer(),
        }
    }
}

/// Parameters of a loading run, as remembered between sessions
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadingParams {
    #[serde(default)]
    pub username: String,

    /// Password or personal access token
    #[serde(default)]
    pub password: String,

    #[serde(default = "default_org")]
    pub org: String,

    #[serde(default)]
    pub strategy: StrategyKind,

    #[serde(default)]
    pub fetch: FetchConfig,
}

fn default_org() -> String {
    "kotlin".to_string()
}

impl Default for LoadingParams {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            org: default_org(),
            strategy: StrategyKind::default(),
            fetch: FetchConfig::default(),
        }
    }
}

impl std::fmt::Debug for LoadingParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadingParams")
            .field("username", &self.username)
            .field("password", &"***")
            .field("org", &self.org)
            .field("strategy", &self.strategy)
            .field("fetch", &self.fetch)
            .finish()
    }
}

impl LoadingParams {
    /// Load parameters from the default path, falling back to defaults when
    /// nothing has been stored yet
    pub fn load_default() -> Result<Self> {
        Self::load_or_default(Self::default_path())
    }

    /// Load parameters from `path`, or defaults when the file does not exist
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No stored parameters, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Load parameters from a specific path
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(crate::ContributorsError::Config(format!(
                "Parameters file not found: {}",
                path.display()
            )));
        }

        tracing::info!(path = %path.display(), "Loading stored parameters");

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read parameters from {}", path.display()))?;
        let params: Self = serde_yaml::from_str(&content)?;

        tracing::debug!(
            org = %params.org,
            strategy = %params.strategy,
            "Parameters loaded successfully"
        );

        Ok(params)
    }

    /// Save parameters to a specific path
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        tracing::info!(path = %path.display(), "Saving parameters");

        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;

        Ok(())
    }

    /// Remember these parameters, or forget stored ones when no credentials are set
    pub fn store(&self, path: impl AsRef<Path>) -> Result<()> {
        if self.username.is_empty() && self.password.is_empty() {
            Self::remove(path)
        } else {
            self.save(path)
        }
    }

    /// Delete stored parameters; a missing file is not an error
    pub fn remove(path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if path.exists() {
            tracing::info!(path = %path.display(), "Removing stored parameters");
            fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Get the default parameters path (~/.config/contributors/params.yaml)
    pub fn default_path() -> PathBuf {
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(".config");
        path.push("contributors");
        path.push("params.yaml");
        path
    }

    /// Build the request of a run from these parameters
    pub fn request(&self) -> Result<RequestData> {
        RequestData::new(&self.username, &self.password, &self.org)
    }
}
