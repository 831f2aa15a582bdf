//! Execution status and its transitions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a job execution.
///
/// ```text
/// STARTING -> STARTED -> COMPLETED | FAILED | STOPPED
/// STARTING -> FAILED | STOPPED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    /// Recorded, job logic not yet invoked.
    Starting,
    /// Job logic running.
    Started,
    /// Finished successfully.
    Completed,
    /// Job logic returned an error.
    Failed,
    /// Job logic asked to stop.
    Stopped,
}

impl Default for ExecutionStatus {
    fn default() -> Self {
        ExecutionStatus::Starting
    }
}

impl ExecutionStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [ExecutionStatus; 5] = [
        ExecutionStatus::Starting,
        ExecutionStatus::Started,
        ExecutionStatus::Completed,
        ExecutionStatus::Failed,
        ExecutionStatus::Stopped,
    ];

    /// Terminal statuses carry an end time and never change again.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ExecutionStatus::Completed | ExecutionStatus::Failed | ExecutionStatus::Stopped
        )
    }

    /// Whether a running launch holds this status.
    pub fn is_running(self) -> bool {
        !self.is_terminal()
    }

    /// Check whether `self -> next` is a legal move. Re-applying the
    /// current status is allowed.
    pub fn can_transition_to(self, next: ExecutionStatus) -> bool {
        use ExecutionStatus::*;
        if self == next {
            return true;
        }
        match self {
            Starting => matches!(next, Started | Failed | Stopped),
            Started => next.is_terminal(),
            Completed | Failed | Stopped => false,
        }
    }

    /// Upper-case name as stored in the ledger.
    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionStatus::Starting => "STARTING",
            ExecutionStatus::Started => "STARTED",
            ExecutionStatus::Completed => "COMPLETED",
            ExecutionStatus::Failed => "FAILED",
            ExecutionStatus::Stopped => "STOPPED",
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExecutionStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown execution status: {}", s))
    }
}
