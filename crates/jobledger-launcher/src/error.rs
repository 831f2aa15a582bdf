//! Launcher errors.

use thiserror::Error;

use jobledger_config::ConfigError;
use jobledger_core::{ExecutionId, LedgerError};

/// Outcome reported by job logic when it does not finish normally.
#[derive(Debug, Clone, Error)]
pub enum JobError {
    /// The job failed; the launch is recorded as `FAILED`.
    #[error("{0}")]
    Failed(String),

    /// The job stopped on request; the launch is recorded as `STOPPED`.
    #[error("Stopped: {0}")]
    Stopped(String),
}

impl JobError {
    pub fn failed(message: impl Into<String>) -> Self {
        JobError::Failed(message.into())
    }

    pub fn stopped(reason: impl Into<String>) -> Self {
        JobError::Stopped(reason.into())
    }
}

/// Launcher error types.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Ledger error, surfaced unchanged.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Job logic failed. The execution is already recorded as `FAILED`.
    #[error("Job '{job}' failed in execution {execution_id}: {source}")]
    JobFailed {
        job: String,
        execution_id: ExecutionId,
        #[source]
        source: JobError,
    },

    /// An execution with the same name and parameters has not finished.
    #[error("Job '{job}' is already running as execution {execution_id}")]
    AlreadyRunning { job: String, execution_id: ExecutionId },

    /// A job with this name is already registered.
    #[error("Job already registered: {0}")]
    AlreadyRegistered(String),

    /// No job with this name is registered.
    #[error("No such job: {0}")]
    NoSuchJob(String),

    /// A launch argument could not be converted.
    #[error("Invalid job parameter '{key}': {message}")]
    InvalidParameter { key: String, message: String },

    /// Configuration rejected during assembly.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl LaunchError {
    /// The ledger error underneath, if any.
    pub fn as_ledger_error(&self) -> Option<&LedgerError> {
        match self {
            LaunchError::Ledger(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_job_failed_display_and_source() {
        let err = LaunchError::JobFailed {
            job: "import".to_string(),
            execution_id: 3,
            source: JobError::failed("disk full"),
        };
        assert_eq!(err.to_string(), "Job 'import' failed in execution 3: disk full");
        assert_eq!(err.source().unwrap().to_string(), "disk full");
    }

    #[test]
    fn test_ledger_error_is_transparent() {
        let err = LaunchError::from(LedgerError::SchemaMissing("BATCH_JOB_EXECUTION".to_string()));
        assert_eq!(err.to_string(), "Ledger table missing: BATCH_JOB_EXECUTION");
        assert!(matches!(
            err.as_ledger_error(),
            Some(LedgerError::SchemaMissing(_))
        ));
    }

    #[test]
    fn test_stopped_display() {
        assert_eq!(JobError::stopped("shutdown").to_string(), "Stopped: shutdown");
    }
}
