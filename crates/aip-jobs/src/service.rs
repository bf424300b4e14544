use crate::artifact::Artifact;
use crate::state::JobState;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Snapshot of a remote job as reported by the status interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus {
    pub state: JobState,
    #[serde(default)]
    pub artifact: Option<Artifact>,
    /// Error message attached by the service to a failed job.
    #[serde(default)]
    pub error: Option<String>,
}

impl JobStatus {
    #[must_use]
    pub fn new(state: JobState) -> Self {
        Self { state, artifact: None, error: None }
    }

    #[must_use]
    pub fn succeeded(artifact: Artifact) -> Self {
        Self { state: JobState::Succeeded, artifact: Some(artifact), error: None }
    }

    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self { state: JobState::Failed, artifact: None, error: Some(message.into()) }
    }
}

/// Submission and status interfaces of the remote service.
///
/// Errors are returned as `anyhow::Error` and are surfaced to callers
/// unchanged.
#[async_trait]
pub trait JobService: Send + Sync {
    /// Request description accepted by `create`. Opaque to the lifecycle wrapper.
    type Request: Send + Sync;

    /// Creates the remote job and returns its resource name.
    async fn create(&self, request: &Self::Request) -> anyhow::Result<String>;

    /// Fetches the current status of a job.
    async fn get_status(&self, resource_name: &str) -> anyhow::Result<JobStatus>;
}

/// Cancel and delete interfaces, used by callers for cleanup.
#[async_trait]
pub trait JobControl: Send + Sync {
    async fn cancel(&self, resource_name: &str) -> anyhow::Result<()>;

    async fn delete(&self, resource_name: &str) -> anyhow::Result<()>;
}
