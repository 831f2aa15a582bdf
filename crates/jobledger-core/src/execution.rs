//! Job execution records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::parameters::JobParameters;
use crate::status::ExecutionStatus;

/// Monotonic execution identifier assigned by the ledger.
pub type ExecutionId = i64;

/// One launch attempt of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobExecution {
    /// Unique, monotonically increasing id.
    pub id: ExecutionId,
    /// Name of the launched job.
    pub job_name: String,
    /// Parameters the job was launched with.
    pub parameters: JobParameters,
    /// Current status.
    pub status: ExecutionStatus,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the launch started.
    pub start_time: DateTime<Utc>,
    /// Set once the status is terminal.
    pub end_time: Option<DateTime<Utc>>,
    /// Last status change.
    pub last_updated: DateTime<Utc>,
    /// Failure or stop reason.
    pub exit_message: Option<String>,
}

impl JobExecution {
    /// A fresh `STARTING` record.
    pub fn starting(id: ExecutionId, job_name: impl Into<String>, parameters: JobParameters) -> Self {
        let now = Utc::now();
        Self {
            id,
            job_name: job_name.into(),
            parameters,
            status: ExecutionStatus::Starting,
            created_at: now,
            start_time: now,
            end_time: None,
            last_updated: now,
            exit_message: None,
        }
    }

    /// Apply a status change, enforcing the transition rules.
    pub fn transition(
        &mut self,
        status: ExecutionStatus,
        exit_message: Option<String>,
    ) -> Result<(), LedgerError> {
        if !self.status.can_transition_to(status) {
            return Err(LedgerError::InvalidTransition {
                id: self.id,
                from: self.status,
                to: status,
            });
        }

        let now = Utc::now();
        self.status = status;
        self.last_updated = now;
        if status.is_terminal() && self.end_time.is_none() {
            self.end_time = Some(now);
        }
        if exit_message.is_some() {
            self.exit_message = exit_message;
        }
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.status.is_running()
    }

    /// Wall-clock duration, once finished.
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.end_time.map(|end| end - self.start_time)
    }
}
