//! Cleanup of remote jobs created by the samples: cancel, wait, delete.

use crate::error::{SampleError, SampleResult};
use aip_jobs::{poll_until, JobControl, JobService, JobState, PollPolicy};
use tracing::{debug, info, warn};

/// Polls `resource_name` until it reaches `target` or another terminal state.
///
/// Returns the state that stopped the wait. A job that already finished in a
/// different terminal state can never reach `target`, so that state is
/// returned instead of waiting out the attempts. Fails with
/// [`SampleError::TimedOut`] once `policy.max_attempts` checks were spent.
pub async fn wait_for_job_state<S>(
    service: &S,
    resource_name: &str,
    target: JobState,
    policy: PollPolicy,
) -> SampleResult<JobState>
where
    S: JobService + ?Sized,
{
    let mut attempts: u32 = 0;
    let status = poll_until(
        service,
        resource_name,
        policy,
        |status| status.state == target || status.state.is_terminal(),
        |status| {
            attempts += 1;
            debug!(resource_name = %resource_name, state = %status.state, attempt = attempts, "Waiting for job state");
        },
    )
    .await?;

    match status {
        Some(status) => {
            if status.state != target {
                warn!(
                    resource_name = %resource_name,
                    state = %status.state,
                    target = %target,
                    "Job ended in a different state"
                );
            }
            Ok(status.state)
        }
        None => Err(SampleError::TimedOut { resource_name: resource_name.to_string(), target, attempts }),
    }
}

/// Cancels a job, waits for it to stop, then deletes it.
///
/// The delete is attempted even when the wait fails; the wait error is
/// returned afterwards unless the delete itself fails.
pub async fn cancel_and_delete<S>(service: &S, resource_name: &str, policy: PollPolicy) -> SampleResult<JobState>
where
    S: JobService + JobControl + ?Sized,
{
    info!(resource_name = %resource_name, "Cancelling job");
    service.cancel(resource_name).await?;

    let waited = wait_for_job_state(service, resource_name, JobState::Cancelled, policy).await;
    match &waited {
        Ok(state) => info!(resource_name = %resource_name, state = %state, "Deleting job"),
        Err(err) => warn!(resource_name = %resource_name, error = %err, "Deleting job that did not stop"),
    }

    service.delete(resource_name).await?;
    waited
}

#[cfg(test)]
mod tests {
    use super::*;
    use aip_jobs::ScriptedJobService;
    use std::time::Duration;

    const NAME: &str = "projects/p/locations/us-central1/dataLabelingJobs/7";

    fn policy(max_attempts: u32) -> PollPolicy {
        PollPolicy::every(Duration::ZERO).with_max_attempts(max_attempts)
    }

    #[tokio::test]
    async fn test_wait_times_out_after_max_attempts() {
        let service: ScriptedJobService<()> = ScriptedJobService::new(NAME).with_states([JobState::Running]);

        let err = wait_for_job_state(&service, NAME, JobState::Cancelled, policy(3)).await.unwrap_err();

        assert!(matches!(err, SampleError::TimedOut { attempts: 3, .. }));
        assert_eq!(service.status_calls(), 3);
    }

    #[tokio::test]
    async fn test_wait_stops_on_other_terminal_state() {
        let service: ScriptedJobService<()> =
            ScriptedJobService::new(NAME).with_states([JobState::Running, JobState::Failed]);

        let state = wait_for_job_state(&service, NAME, JobState::Cancelled, policy(10)).await.unwrap();

        assert_eq!(state, JobState::Failed);
        assert_eq!(service.status_calls(), 2);
    }

    #[tokio::test]
    async fn test_cancel_and_delete() {
        let service: ScriptedJobService<()> = ScriptedJobService::new(NAME).with_states([JobState::Running]);

        let state = cancel_and_delete(&service, NAME, policy(40)).await.unwrap();

        assert_eq!(state, JobState::Cancelled);
        assert_eq!(service.cancelled(), vec![NAME.to_string()]);
        assert_eq!(service.deleted(), vec![NAME.to_string()]);
    }

    #[tokio::test]
    async fn test_job_is_deleted_when_cancel_wait_times_out() {
        let service: ScriptedJobService<()> =
            ScriptedJobService::new(NAME).with_states([JobState::Running]).ignoring_cancel();

        let err = cancel_and_delete(&service, NAME, policy(2)).await.unwrap_err();

        assert!(matches!(err, SampleError::TimedOut { attempts: 2, .. }));
        assert_eq!(service.deleted(), vec![NAME.to_string()]);
    }

    #[tokio::test]
    async fn test_cancel_unknown_job_propagates_service_error() {
        let service: ScriptedJobService<()> = ScriptedJobService::new(NAME);

        let err = cancel_and_delete(&service, "projects/p/locations/l/dataLabelingJobs/missing", policy(1))
            .await
            .unwrap_err();

        assert!(matches!(err, SampleError::Service(_)));
        assert!(service.deleted().is_empty());
    }
}
