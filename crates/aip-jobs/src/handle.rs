//! Single-use lifecycle wrapper around a remote create-and-poll job.
//!
//! A [`JobHandle`] submits one request through a [`JobService`], then polls the
//! status interface until the job reaches a terminal state. Two execution
//! modes are offered:
//!
//! - [`ExecutionMode::Synchronous`]: `run` only returns once the job is
//!   terminal, yielding the artifact or [`JobError::RemoteJobFailed`].
//! - [`ExecutionMode::Deferred`]: `run` returns an [`ArtifactFuture`] right
//!   after submission; [`ArtifactFuture::wait`] polls on demand.
//!
//! The terminal outcome is memoized, so repeated waits (from the handle or any
//! clone of its future) never poll again once a terminal state was observed.

use crate::artifact::Artifact;
use crate::error::{JobError, JobResult};
use crate::poll::{poll_until_terminal, PollPolicy};
use crate::progress::{NoopProgressSink, ProgressEvent, ProgressSink};
use crate::service::{JobService, JobStatus};
use crate::state::JobState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// How `run` waits for the remote job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Block until the job is terminal.
    #[default]
    Synchronous,
    /// Return after submission; wait later through the future.
    Deferred,
}

/// Polling and reporting options for a handle.
#[derive(Clone)]
pub struct JobOptions {
    pub poll: PollPolicy,
    pub progress: Arc<dyn ProgressSink>,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self { poll: PollPolicy::default(), progress: Arc::new(NoopProgressSink) }
    }
}

impl fmt::Debug for JobOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobOptions").field("poll", &self.poll).finish_non_exhaustive()
    }
}

impl JobOptions {
    #[must_use]
    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Submission {
    Idle,
    InFlight,
    Done,
}

#[derive(Debug)]
struct JobRecord {
    submission: Submission,
    resource_name: Option<String>,
    state: JobState,
    artifact: Option<Artifact>,
    error: Option<String>,
    submitted_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    fn new() -> Self {
        Self {
            submission: Submission::Idle,
            resource_name: None,
            state: JobState::Unsubmitted,
            artifact: None,
            error: None,
            submitted_at: None,
            finished_at: None,
        }
    }
}

#[derive(Debug, Clone)]
struct TerminalOutcome {
    state: JobState,
    artifact: Option<Artifact>,
    error: Option<String>,
}

impl TerminalOutcome {
    fn to_result(&self, resource_name: &str) -> JobResult<Artifact> {
        if self.state.is_failure() {
            return Err(JobError::RemoteJobFailed {
                resource_name: resource_name.to_string(),
                state: self.state,
                message: self.error.clone(),
            });
        }
        self.artifact.clone().ok_or_else(|| JobError::MissingArtifact(resource_name.to_string()))
    }
}

struct Shared<S: JobService> {
    service: Arc<S>,
    options: JobOptions,
    record: Mutex<JobRecord>,
    outcome: OnceCell<TerminalOutcome>,
}

impl<S: JobService> Shared<S> {
    fn record(&self) -> MutexGuard<'_, JobRecord> {
        self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn submitted_name(&self) -> JobResult<String> {
        let record = self.record();
        match (&record.submission, &record.resource_name) {
            (Submission::Done, Some(name)) => Ok(name.clone()),
            _ => Err(JobError::NotSubmitted),
        }
    }

    /// Applies a polled status to the record, honouring the state machine.
    fn apply_status(&self, resource_name: &str, status: &JobStatus) {
        if status.state == JobState::Succeeded && status.artifact.is_none() {
            warn!(resource_name = %resource_name, "Ignoring SUCCEEDED status without an artifact");
            return;
        }

        let from = {
            let mut record = self.record();
            let from = record.state;
            if from == status.state {
                return;
            }
            if !from.can_transition_to(status.state) {
                debug!(
                    resource_name = %resource_name,
                    from = %from,
                    to = %status.state,
                    "Ignoring out-of-order job state"
                );
                return;
            }

            record.state = status.state;
            if status.state.is_terminal() {
                record.artifact = if status.state == JobState::Succeeded { status.artifact.clone() } else { None };
                record.error = status.error.clone();
                record.finished_at = Some(Utc::now());
            }
            from
        };

        debug!(resource_name = %resource_name, from = %from, to = %status.state, "Job state transition");
        self.options.progress.on_event(ProgressEvent::StateChanged {
            resource_name: resource_name.to_string(),
            from,
            to: status.state,
        });
    }

    async fn poll_to_terminal(&self, resource_name: &str) -> JobResult<TerminalOutcome> {
        let status = poll_until_terminal(self.service.as_ref(), resource_name, self.options.poll.interval, |s| {
            self.apply_status(resource_name, s);
        })
        .await?;

        if status.state == JobState::Succeeded && status.artifact.is_none() {
            return Err(JobError::MissingArtifact(resource_name.to_string()));
        }

        if status.state.is_failure() {
            warn!(
                resource_name = %resource_name,
                state = %status.state,
                error = status.error.as_deref().unwrap_or(""),
                "Job finished without success"
            );
        } else {
            info!(resource_name = %resource_name, "Job succeeded");
        }
        self.options
            .progress
            .on_event(ProgressEvent::Finished { resource_name: resource_name.to_string(), state: status.state });

        Ok(TerminalOutcome { state: status.state, artifact: status.artifact, error: status.error })
    }

    async fn wait(&self) -> JobResult<Artifact> {
        let resource_name = self.submitted_name()?;
        let outcome = self.outcome.get_or_try_init(|| self.poll_to_terminal(&resource_name)).await?;
        outcome.to_result(&resource_name)
    }
}

/// Returns the handle to `Idle` unless disarmed, so a failed or abandoned
/// create call leaves it retryable.
struct SubmissionClaim<'a, S: JobService> {
    shared: &'a Shared<S>,
    armed: bool,
}

impl<S: JobService> SubmissionClaim<'_, S> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<S: JobService> Drop for SubmissionClaim<'_, S> {
    fn drop(&mut self) {
        if self.armed {
            self.shared.record().submission = Submission::Idle;
        }
    }
}

/// Single-use handle for one remote job.
pub struct JobHandle<S: JobService> {
    shared: Arc<Shared<S>>,
}

impl<S: JobService> fmt::Debug for JobHandle<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let record = self.shared.record();
        f.debug_struct("JobHandle")
            .field("resource_name", &record.resource_name)
            .field("state", &record.state)
            .finish_non_exhaustive()
    }
}

impl<S: JobService> JobHandle<S> {
    #[must_use]
    pub fn new(service: Arc<S>) -> Self {
        Self::with_options(service, JobOptions::default())
    }

    #[must_use]
    pub fn with_options(service: Arc<S>, options: JobOptions) -> Self {
        Self {
            shared: Arc::new(Shared {
                service,
                options,
                record: Mutex::new(JobRecord::new()),
                outcome: OnceCell::new(),
            }),
        }
    }

    /// Submits `request` and, in synchronous mode, waits for the terminal state.
    ///
    /// Fails with [`JobError::AlreadySubmitted`] if this handle was already
    /// submitted or a submission is in flight. A failed create call, or one
    /// dropped before it answered, leaves the handle unsubmitted so `run` can
    /// be retried.
    pub async fn run(&self, request: &S::Request, mode: ExecutionMode) -> JobResult<RunOutput<S>> {
        debug!(mode = ?mode, "Running job");
        let future = self.submit(request).await?;
        match mode {
            ExecutionMode::Synchronous => future.wait().await.map(RunOutput::Completed),
            ExecutionMode::Deferred => Ok(RunOutput::Deferred(future)),
        }
    }

    /// Deferred-mode submission: creates the job and returns its future
    /// without polling.
    pub async fn submit(&self, request: &S::Request) -> JobResult<ArtifactFuture<S>> {
        {
            let mut record = self.shared.record();
            if record.submission != Submission::Idle {
                return Err(JobError::AlreadySubmitted);
            }
            record.submission = Submission::InFlight;
        }

        let claim = SubmissionClaim { shared: &self.shared, armed: true };
        let resource_name = match self.shared.service.create(request).await {
            Ok(name) => name,
            Err(err) => {
                warn!(error = %err, "Job submission failed");
                return Err(JobError::Service(err));
            }
        };
        claim.disarm();

        {
            let mut record = self.shared.record();
            record.submission = Submission::Done;
            record.resource_name = Some(resource_name.clone());
            record.state = JobState::Pending;
            record.submitted_at = Some(Utc::now());
        }
        info!(resource_name = %resource_name, "Job submitted");
        self.shared.options.progress.on_event(ProgressEvent::Submitted { resource_name: resource_name.clone() });

        Ok(ArtifactFuture { shared: Arc::clone(&self.shared), resource_name })
    }

    /// Waits for the submitted job to finish. Memoized like [`ArtifactFuture::wait`].
    pub async fn wait(&self) -> JobResult<Artifact> {
        self.shared.wait().await
    }

    /// Returns the artifact of a succeeded job.
    pub fn result(&self) -> JobResult<Artifact> {
        let record = self.shared.record();
        let resource_name = match (&record.submission, &record.resource_name) {
            (Submission::Done, Some(name)) => name.clone(),
            _ => return Err(JobError::NotSubmitted),
        };

        match record.state {
            JobState::Succeeded => record.artifact.clone().ok_or(JobError::MissingArtifact(resource_name)),
            JobState::Failed | JobState::Cancelled => Err(JobError::RemoteJobFailed {
                resource_name,
                state: record.state,
                message: record.error.clone(),
            }),
            state => Err(JobError::NotReady { resource_name, state }),
        }
    }

    pub fn state(&self) -> JobResult<JobState> {
        self.shared.submitted_name()?;
        Ok(self.shared.record().state)
    }

    /// True once the job is known to have ended in FAILED or CANCELLED.
    pub fn has_failed(&self) -> JobResult<bool> {
        Ok(self.state()?.is_failure())
    }

    #[must_use]
    pub fn resource_name(&self) -> Option<String> {
        self.shared.record().resource_name.clone()
    }

    #[must_use]
    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.shared.record().submitted_at
    }

    #[must_use]
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.shared.record().finished_at
    }

    /// Error message reported by the service for a failed job.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        self.shared.record().error.clone()
    }
}

/// Deferred result of a submitted job.
pub struct ArtifactFuture<S: JobService> {
    shared: Arc<Shared<S>>,
    resource_name: String,
}

impl<S: JobService> Clone for ArtifactFuture<S> {
    fn clone(&self) -> Self {
        Self { shared: Arc::clone(&self.shared), resource_name: self.resource_name.clone() }
    }
}

impl<S: JobService> fmt::Debug for ArtifactFuture<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactFuture")
            .field("resource_name", &self.resource_name)
            .field("done", &self.is_done())
            .finish()
    }
}

impl<S: JobService> ArtifactFuture<S> {
    #[must_use]
    pub fn resource_name(&self) -> &str {
        &self.resource_name
    }

    /// Last state observed for the job.
    #[must_use]
    pub fn state(&self) -> JobState {
        self.shared.record().state
    }

    /// True once a terminal outcome has been observed.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.shared.outcome.initialized()
    }

    /// Polls until the job is terminal, then returns the memoized outcome.
    ///
    /// Service errors raised while polling are returned unchanged and are not
    /// memoized; a later call polls again.
    pub async fn wait(&self) -> JobResult<Artifact> {
        self.shared.wait().await
    }
}

/// What `run` hands back, depending on the execution mode.
pub enum RunOutput<S: JobService> {
    Completed(Artifact),
    Deferred(ArtifactFuture<S>),
}

impl<S: JobService> fmt::Debug for RunOutput<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed(artifact) => f.debug_tuple("Completed").field(artifact).finish(),
            Self::Deferred(future) => f.debug_tuple("Deferred").field(future).finish(),
        }
    }
}

impl<S: JobService> RunOutput<S> {
    #[must_use]
    pub fn artifact(&self) -> Option<&Artifact> {
        match self {
            Self::Completed(artifact) => Some(artifact),
            Self::Deferred(_) => None,
        }
    }

    #[must_use]
    pub fn into_future(self) -> Option<ArtifactFuture<S>> {
        match self {
            Self::Completed(_) => None,
            Self::Deferred(future) => Some(future),
        }
    }

    /// Resolves to the artifact in either mode.
    pub async fn wait(self) -> JobResult<Artifact> {
        match self {
            Self::Completed(artifact) => Ok(artifact),
            Self::Deferred(future) => future.wait().await,
        }
    }
}
