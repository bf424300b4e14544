//! Fixed-interval status polling.

use crate::service::{JobService, JobStatus};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::trace;

/// Default pause between two status queries.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// How often, and how many times, to query the status interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollPolicy {
    pub interval: Duration,
    /// Upper bound on status queries. `None` polls until a terminal state.
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self { interval: DEFAULT_POLL_INTERVAL, max_attempts: None }
    }
}

impl PollPolicy {
    #[must_use]
    pub fn every(interval: Duration) -> Self {
        Self { interval, max_attempts: None }
    }

    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Same interval with the attempt bound removed.
    #[must_use]
    pub fn unbounded(self) -> Self {
        Self { max_attempts: None, ..self }
    }
}

/// Queries `resource_name` until `done` accepts a status or the policy runs
/// out of attempts.
///
/// Returns `Ok(None)` when the attempts are exhausted. Every observed status
/// is passed to `observe` before `done` is evaluated. Service errors abort the
/// loop and are returned as-is.
pub async fn poll_until<S, D, O>(
    service: &S,
    resource_name: &str,
    policy: PollPolicy,
    mut done: D,
    mut observe: O,
) -> anyhow::Result<Option<JobStatus>>
where
    S: JobService + ?Sized,
    D: FnMut(&JobStatus) -> bool,
    O: FnMut(&JobStatus),
{
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        let status = service.get_status(resource_name).await?;
        trace!(resource_name = %resource_name, attempt, state = %status.state, "Polled job status");
        observe(&status);

        if done(&status) {
            return Ok(Some(status));
        }
        if policy.max_attempts.is_some_and(|max| attempt >= max) {
            return Ok(None);
        }

        tokio::time::sleep(policy.interval).await;
    }
}

/// Polls without an attempt bound until the job reaches a terminal state.
pub async fn poll_until_terminal<S, O>(
    service: &S,
    resource_name: &str,
    interval: Duration,
    observe: O,
) -> anyhow::Result<JobStatus>
where
    S: JobService + ?Sized,
    O: FnMut(&JobStatus),
{
    let status = poll_until(service, resource_name, PollPolicy::every(interval), |s| s.state.is_terminal(), observe)
        .await?;
    // An unbounded policy only returns once `done` has accepted a status.
    status.ok_or_else(|| anyhow::anyhow!("polling of {resource_name} stopped before a terminal state"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_defaults_are_unbounded() {
        let policy = PollPolicy::default();
        assert_eq!(policy.interval, DEFAULT_POLL_INTERVAL);
        assert_eq!(policy.max_attempts, None);

        let bounded = PollPolicy::every(Duration::from_secs(10)).with_max_attempts(40);
        assert_eq!(bounded.max_attempts, Some(40));
        assert_eq!(bounded.unbounded().max_attempts, None);
        assert_eq!(bounded.unbounded().interval, Duration::from_secs(10));
    }
}
