//! Scripted in-memory service for tests and dry runs.

use crate::service::{JobControl, JobService, JobStatus};
use crate::state::JobState;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Debug)]
struct Script<R> {
    create_failures: usize,
    slow_creates: usize,
    create_delay: Duration,
    status_failures: usize,
    ignore_cancel: bool,
    statuses: VecDeque<JobStatus>,
    last: Option<JobStatus>,
    requests: Vec<R>,
    status_calls: usize,
    cancelled: Vec<String>,
    deleted: Vec<String>,
}

/// Service collaborator that replays a fixed sequence of statuses.
///
/// Each `get_status` call consumes the next scripted status; once the script
/// is exhausted the last status is repeated. A cancel request turns the next
/// non-terminal status into `CANCELLED`, and a deleted job reports not-found.
#[derive(Debug)]
pub struct ScriptedJobService<R = serde_json::Value> {
    resource_name: String,
    script: Mutex<Script<R>>,
}

impl<R> ScriptedJobService<R> {
    #[must_use]
    pub fn new(resource_name: impl Into<String>) -> Self {
        Self {
            resource_name: resource_name.into(),
            script: Mutex::new(Script {
                create_failures: 0,
                slow_creates: 0,
                create_delay: Duration::ZERO,
                status_failures: 0,
                ignore_cancel: false,
                statuses: VecDeque::new(),
                last: None,
                requests: Vec::new(),
                status_calls: 0,
                cancelled: Vec::new(),
                deleted: Vec::new(),
            }),
        }
    }

    /// Statuses returned by successive `get_status` calls.
    #[must_use]
    pub fn with_statuses(self, statuses: impl IntoIterator<Item = JobStatus>) -> Self {
        self.script().statuses.extend(statuses);
        self
    }

    /// Shorthand for a script of bare states.
    #[must_use]
    pub fn with_states(self, states: impl IntoIterator<Item = JobState>) -> Self {
        self.with_statuses(states.into_iter().map(JobStatus::new))
    }

    /// Makes the next `count` create calls fail.
    #[must_use]
    pub fn failing_creates(self, count: usize) -> Self {
        self.script().create_failures = count;
        self
    }

    /// The next `count` create calls sleep for `delay` before answering.
    #[must_use]
    pub fn slow_creates(self, count: usize, delay: Duration) -> Self {
        {
            let mut script = self.script();
            script.slow_creates = count;
            script.create_delay = delay;
        }
        self
    }

    /// Cancel requests are recorded but do not stop the job.
    #[must_use]
    pub fn ignoring_cancel(self) -> Self {
        self.script().ignore_cancel = true;
        self
    }

    /// Makes the next `count` status calls fail before the script is consumed.
    #[must_use]
    pub fn failing_status_calls(self, count: usize) -> Self {
        self.script().status_failures = count;
        self
    }

    #[must_use]
    pub fn resource_name(&self) -> &str {
        &self.resource_name
    }

    #[must_use]
    pub fn requests(&self) -> Vec<R>
    where
        R: Clone,
    {
        self.script().requests.clone()
    }

    /// Number of create calls the service accepted.
    #[must_use]
    pub fn create_calls(&self) -> usize {
        self.script().requests.len()
    }

    #[must_use]
    pub fn status_calls(&self) -> usize {
        self.script().status_calls
    }

    #[must_use]
    pub fn cancelled(&self) -> Vec<String> {
        self.script().cancelled.clone()
    }

    #[must_use]
    pub fn deleted(&self) -> Vec<String> {
        self.script().deleted.clone()
    }

    fn script(&self) -> MutexGuard<'_, Script<R>> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl<R> JobService for ScriptedJobService<R>
where
    R: Clone + Send + Sync,
{
    type Request = R;

    async fn create(&self, request: &R) -> anyhow::Result<String> {
        let delay = {
            let mut script = self.script();
            (script.slow_creates > 0).then(|| {
                script.slow_creates -= 1;
                script.create_delay
            })
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut script = self.script();
        if script.create_failures > 0 {
            script.create_failures -= 1;
            anyhow::bail!("create request rejected: service unavailable");
        }
        script.requests.push(request.clone());
        Ok(self.resource_name.clone())
    }

    async fn get_status(&self, resource_name: &str) -> anyhow::Result<JobStatus> {
        let mut script = self.script();
        script.status_calls += 1;

        if resource_name != self.resource_name || script.deleted.iter().any(|n| n == resource_name) {
            anyhow::bail!("resource not found: {resource_name}");
        }
        if script.status_failures > 0 {
            script.status_failures -= 1;
            anyhow::bail!("status request failed: deadline exceeded");
        }

        let cancel_requested = !script.ignore_cancel && script.cancelled.iter().any(|n| n == resource_name);
        let terminal = script.last.as_ref().is_some_and(|s| s.state.is_terminal());
        let status = if cancel_requested && !terminal {
            JobStatus::new(JobState::Cancelled)
        } else if terminal {
            script.last.clone().unwrap_or_else(|| JobStatus::new(JobState::Pending))
        } else if let Some(next) = script.statuses.pop_front() {
            next
        } else if let Some(last) = script.last.clone() {
            last
        } else {
            anyhow::bail!("no status scripted for {resource_name}");
        };

        script.last = Some(status.clone());
        Ok(status)
    }
}

#[async_trait]
impl<R> JobControl for ScriptedJobService<R>
where
    R: Send + Sync,
{
    async fn cancel(&self, resource_name: &str) -> anyhow::Result<()> {
        let mut script = self.script();
        if resource_name != self.resource_name {
            anyhow::bail!("resource not found: {resource_name}");
        }
        script.cancelled.push(resource_name.to_string());
        Ok(())
    }

    async fn delete(&self, resource_name: &str) -> anyhow::Result<()> {
        let mut script = self.script();
        if resource_name != self.resource_name || script.deleted.iter().any(|n| n == resource_name) {
            anyhow::bail!("resource not found: {resource_name}");
        }
        script.deleted.push(resource_name.to_string());
        Ok(())
    }
}
