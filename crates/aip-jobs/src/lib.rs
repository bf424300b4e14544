//! AIP Jobs
//!
//! Lifecycle wrapper for long-running jobs on a managed ML platform:
//! - Submitting a create request through a service collaborator (`JobService`)
//! - Polling job status until a terminal state (`poll`)
//! - Synchronous and deferred execution with memoized waits (`JobHandle`)
//! - Cancel/delete interfaces for caller-side cleanup (`JobControl`)

pub mod artifact;
pub mod error;
pub mod handle;
pub mod mock;
pub mod poll;
pub mod progress;
pub mod service;
pub mod state;

pub use artifact::{Artifact, ArtifactKind};
pub use error::{JobError, JobResult};
pub use handle::{ArtifactFuture, ExecutionMode, JobHandle, JobOptions, RunOutput};
pub use mock::ScriptedJobService;
pub use poll::{poll_until, poll_until_terminal, PollPolicy, DEFAULT_POLL_INTERVAL};
pub use progress::{NoopProgressSink, ProgressEvent, ProgressSink, RecordingProgressSink};
pub use service::{JobControl, JobService, JobStatus};
pub use state::{JobState, UnknownJobState};
