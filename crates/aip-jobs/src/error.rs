use crate::state::JobState;
use thiserror::Error;

pub type JobResult<T> = std::result::Result<T, JobError>;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("job has already been submitted")]
    AlreadySubmitted,

    #[error("job has not been submitted; call run() first")]
    NotSubmitted,

    #[error("job {resource_name} is not finished (state: {state})")]
    NotReady { resource_name: String, state: JobState },

    #[error("job {resource_name} finished in state {state}{}", format_message(.message))]
    RemoteJobFailed { resource_name: String, state: JobState, message: Option<String> },

    #[error("job {0} succeeded but the service returned no artifact")]
    MissingArtifact(String),

    /// Errors raised by the service collaborator, passed through untouched.
    #[error(transparent)]
    Service(#[from] anyhow::Error),
}

impl JobError {
    /// True for the terminal remote failure kind (FAILED or CANCELLED).
    #[must_use]
    pub fn is_remote_failure(&self) -> bool {
        matches!(self, Self::RemoteJobFailed { .. })
    }
}

fn format_message(message: &Option<String>) -> String {
    message.as_ref().map(|m| format!(": {m}")).unwrap_or_default()
}
