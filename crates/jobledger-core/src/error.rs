//! Ledger errors.

use thiserror::Error;

use crate::execution::ExecutionId;
use crate::status::ExecutionStatus;

/// Ledger error types.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A backing table does not exist (schema initialization was skipped).
    #[error("Ledger table missing: {0}")]
    SchemaMissing(String),

    /// No execution with this id.
    #[error("Job execution not found: {0}")]
    NotFound(ExecutionId),

    /// Execution id collision. Ids are monotonic, so this is an internal fault.
    #[error("Duplicate job execution id: {0}")]
    DuplicateKey(ExecutionId),

    /// An execution with the same job name and parameters has not finished.
    #[error("Execution {0} with the same job and parameters is still running")]
    AlreadyRunning(ExecutionId),

    /// A double parameter is NaN or infinite and has no stored form.
    #[error("Parameter '{0}' is not a finite number")]
    NonFiniteParameter(String),

    /// Status change not allowed from the current status.
    #[error("Invalid status transition for execution {id}: {from} -> {to}")]
    InvalidTransition {
        id: ExecutionId,
        from: ExecutionStatus,
        to: ExecutionStatus,
    },

    /// Storage layer error.
    #[error("Database error: {0}")]
    Database(String),

    /// Record encoding error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for LedgerError {
    fn from(e: serde_json::Error) -> Self {
        LedgerError::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_missing_display() {
        let err = LedgerError::SchemaMissing("BATCH_JOB_EXECUTION".to_string());
        assert!(err.to_string().contains("BATCH_JOB_EXECUTION"));
    }

    #[test]
    fn test_invalid_transition_display() {
        let err = LedgerError::InvalidTransition {
            id: 7,
            from: ExecutionStatus::Completed,
            to: ExecutionStatus::Started,
        };
        assert_eq!(
            err.to_string(),
            "Invalid status transition for execution 7: COMPLETED -> STARTED"
        );
    }
}
