use crate::config::ConfigError;
use aip_jobs::{JobError, JobState};
use thiserror::Error;

pub type SampleResult<T> = std::result::Result<T, SampleError>;

#[derive(Debug, Error)]
pub enum SampleError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("timed out after {attempts} status checks waiting for {resource_name} to reach {target}")]
    TimedOut { resource_name: String, target: JobState, attempts: u32 },

    #[error("failed to initialise logging: {0}")]
    Logging(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Job(#[from] JobError),

    /// Errors raised by the service collaborators (cancel, delete, status).
    #[error(transparent)]
    Service(#[from] anyhow::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
