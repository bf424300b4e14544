//! Client configuration.
//!
//! Project, location and endpoint are passed explicitly to every sample
//! through [`ClientConfig`] instead of living in process-wide state.
//!
//! Configuration precedence (highest first):
//! 1. Environment variables (`AIP_PROJECT`, `AIP_LOCATION`, `AIP_API_ENDPOINT`)
//! 2. Local config file (`./.aiprc`)
//! 3. Global config file (`~/.aip/config.toml`)
//! 4. Defaults

use crate::paths;
use aip_jobs::PollPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_LOCATION: &str = "us-central1";

pub const ENV_PROJECT: &str = "AIP_PROJECT";
pub const ENV_LOCATION: &str = "AIP_LOCATION";
pub const ENV_API_ENDPOINT: &str = "AIP_API_ENDPOINT";

const DEFAULT_JOB_POLL_SECS: u64 = 5;
const DEFAULT_TEARDOWN_POLL_SECS: u64 = 10;
const DEFAULT_TEARDOWN_ATTEMPTS: u32 = 40;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Failed to read configuration file: {0}")]
    ReadError(String),

    #[error("Failed to parse configuration file: {0}")]
    ParseError(String),

    #[error("Missing configuration value: {0}")]
    Missing(&'static str),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Polling intervals for job waits and teardown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollSettings {
    /// Seconds between status checks while waiting for a job.
    #[serde(default)]
    pub interval_secs: Option<u64>,

    /// Seconds between status checks during teardown.
    #[serde(default)]
    pub teardown_interval_secs: Option<u64>,

    /// Status checks before teardown gives up.
    #[serde(default)]
    pub teardown_max_attempts: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Human,
    Json,
}

/// Client configuration shared by all samples.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub project: Option<String>,

    #[serde(default)]
    pub location: Option<String>,

    /// Regional API endpoint override.
    #[serde(default)]
    pub api_endpoint: Option<String>,

    #[serde(default)]
    pub staging_bucket: Option<String>,

    #[serde(default)]
    pub log_level: Option<String>,

    #[serde(default)]
    pub log_format: Option<LogFormat>,

    #[serde(default)]
    pub poll: PollSettings,
}

impl ClientConfig {
    #[must_use]
    pub fn new(project: impl Into<String>) -> Self {
        Self { project: Some(project.into()), ..Self::default() }
    }

    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Load configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a TOML file.
    pub fn save_to_file(&self, path: &Path) -> ConfigResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(format!("Failed to serialize: {}", e)))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConfigError::ReadError(format!("Failed to create directory: {}", e)))?;
        }

        std::fs::write(path, content).map_err(|e| ConfigError::ReadError(format!("Failed to write file: {}", e)))
    }

    /// Get default global configuration file path.
    #[must_use]
    pub fn default_global_path() -> PathBuf {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".aip").join("config.toml")
    }

    /// Get default local configuration file path.
    #[must_use]
    pub fn default_local_path() -> PathBuf {
        PathBuf::from(".aiprc")
    }

    /// Discover and load configuration files, then apply environment overrides.
    pub fn discover_and_load() -> Self {
        let mut config = Self::default();

        if let Ok(global_config) = Self::load_from_file(&Self::default_global_path()) {
            config.merge(&global_config);
        }
        if let Ok(local_config) = Self::load_from_file(&Self::default_local_path()) {
            config.merge(&local_config);
        }

        config.apply_env_overrides();
        config
    }

    /// Merge another configuration into this one.
    ///
    /// Values from `other` override values in `self` if they are Some.
    pub fn merge(&mut self, other: &Self) {
        fn take<T: Clone>(dst: &mut Option<T>, src: &Option<T>) {
            if let Some(value) = src {
                *dst = Some(value.clone());
            }
        }

        take(&mut self.project, &other.project);
        take(&mut self.location, &other.location);
        take(&mut self.api_endpoint, &other.api_endpoint);
        take(&mut self.staging_bucket, &other.staging_bucket);
        take(&mut self.poll.interval_secs, &other.poll.interval_secs);
        take(&mut self.poll.teardown_interval_secs, &other.poll.teardown_interval_secs);
        take(&mut self.poll.teardown_max_attempts, &other.poll.teardown_max_attempts);
        take(&mut self.log_level, &other.log_level);
        take(&mut self.log_format, &other.log_format);
    }

    /// Override values from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Override values through `lookup`, which maps a variable name to its value.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(project) = non_empty(ENV_PROJECT) {
            self.project = Some(project);
        }
        if let Some(location) = non_empty(ENV_LOCATION) {
            self.location = Some(location);
        }
        if let Some(endpoint) = non_empty(ENV_API_ENDPOINT) {
            self.api_endpoint = Some(endpoint);
        }
    }

    pub fn project(&self) -> ConfigResult<&str> {
        self.project.as_deref().filter(|p| !p.trim().is_empty()).ok_or(ConfigError::Missing("project"))
    }

    #[must_use]
    pub fn location(&self) -> &str {
        self.location.as_deref().unwrap_or(DEFAULT_LOCATION)
    }

    /// API endpoint; defaults to the regional endpoint of the configured location.
    #[must_use]
    pub fn api_endpoint(&self) -> String {
        self.api_endpoint.clone().unwrap_or_else(|| format!("{}-aiplatform.googleapis.com", self.location()))
    }

    /// `projects/{project}/locations/{location}`, the parent of every created resource.
    pub fn location_path(&self) -> ConfigResult<String> {
        Ok(paths::location_path(self.project()?, self.location()))
    }

    pub fn training_pipeline_path(&self, training_pipeline_id: &str) -> ConfigResult<String> {
        Ok(paths::training_pipeline_path(self.project()?, self.location(), training_pipeline_id))
    }

    pub fn data_labeling_job_path(&self, data_labeling_job_id: &str) -> ConfigResult<String> {
        Ok(paths::data_labeling_job_path(self.project()?, self.location(), data_labeling_job_id))
    }

    pub fn dataset_path(&self, dataset_id: &str) -> ConfigResult<String> {
        Ok(paths::dataset_path(self.project()?, self.location(), dataset_id))
    }

    /// Policy used while waiting for a submitted job. Never bounded.
    #[must_use]
    pub fn job_poll_policy(&self) -> PollPolicy {
        PollPolicy::every(Duration::from_secs(self.poll.interval_secs.unwrap_or(DEFAULT_JOB_POLL_SECS)))
    }

    /// Bounded policy used by teardown helpers.
    #[must_use]
    pub fn teardown_poll_policy(&self) -> PollPolicy {
        PollPolicy::every(Duration::from_secs(self.poll.teardown_interval_secs.unwrap_or(DEFAULT_TEARDOWN_POLL_SECS)))
            .with_max_attempts(self.poll.teardown_max_attempts.unwrap_or(DEFAULT_TEARDOWN_ATTEMPTS))
    }
}
