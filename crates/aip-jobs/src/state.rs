//! Job state machine.
//!
//! States move forward only: `Unsubmitted -> Pending -> Running -> terminal`.
//! A terminal state (`Succeeded`, `Failed`, `Cancelled`) never changes again.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a submitted remote job or pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    /// Not yet handed to the service.
    Unsubmitted,
    /// Accepted by the service, waiting for resources.
    Pending,
    /// Executing remotely.
    Running,
    /// Finished successfully; an artifact is available.
    Succeeded,
    /// Finished with an error.
    Failed,
    /// Stopped by a cancel request.
    Cancelled,
}

impl JobState {
    /// Returns `true` for states from which no further transition occurs.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }

    /// Returns `true` for the terminal states that count as failure.
    #[must_use]
    pub fn is_failure(self) -> bool {
        matches!(self, Self::Failed | Self::Cancelled)
    }

    fn rank(self) -> u8 {
        match self {
            Self::Unsubmitted => 0,
            Self::Pending => 1,
            Self::Running => 2,
            Self::Succeeded | Self::Failed | Self::Cancelled => 3,
        }
    }

    /// Checks whether the state machine allows moving from `self` to `to`.
    ///
    /// Staying in the same state is always allowed. Terminal states accept
    /// nothing else, and a job never moves back to an earlier phase.
    #[must_use]
    pub fn can_transition_to(self, to: Self) -> bool {
        if self == to {
            return true;
        }
        if self.is_terminal() || to == Self::Unsubmitted {
            return false;
        }
        to.rank() > self.rank()
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unsubmitted => "UNSUBMITTED",
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a service state string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown job state: {0}")]
pub struct UnknownJobState(pub String);

impl FromStr for JobState {
    type Err = UnknownJobState;

    /// Parses both bare names (`RUNNING`) and the service's prefixed forms
    /// (`PIPELINE_STATE_RUNNING`, `JOB_STATE_RUNNING`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let bare = upper
            .strip_prefix("PIPELINE_STATE_")
            .or_else(|| upper.strip_prefix("JOB_STATE_"))
            .unwrap_or(&upper);

        match bare {
            "UNSUBMITTED" | "UNSPECIFIED" => Ok(Self::Unsubmitted),
            "QUEUED" | "PENDING" => Ok(Self::Pending),
            // Cancelling and paused jobs are still live on the service side.
            "RUNNING" | "CANCELLING" | "PAUSED" | "UPDATING" => Ok(Self::Running),
            "SUCCEEDED" => Ok(Self::Succeeded),
            "FAILED" | "EXPIRED" => Ok(Self::Failed),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(UnknownJobState(s.to_string())),
        }
    }
}
