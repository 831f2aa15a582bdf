//! Ledger contract and in-memory implementation.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use crate::error::LedgerError;
use crate::execution::{ExecutionId, JobExecution};
use crate::parameters::JobParameters;
use crate::status::ExecutionStatus;

#[cfg(test)]
#[path = "ledger_tests.rs"]
mod tests;

/// Persistent store of job execution records.
///
/// Every mutation of execution state goes through this trait. Implementations
/// must serialize id assignment so concurrent launches never share an id.
#[async_trait]
pub trait JobLedger: Send + Sync {
    /// Backend identifier.
    fn id(&self) -> &str;

    /// Insert a `STARTING` record and return its id.
    async fn record_start(
        &self,
        job_name: &str,
        parameters: &JobParameters,
    ) -> Result<ExecutionId, LedgerError>;

    /// Like [`JobLedger::record_start`], but fails with
    /// [`LedgerError::AlreadyRunning`] if the last execution for this
    /// (name, parameters) identity has not finished. The check and the insert
    /// happen atomically.
    async fn try_record_start(
        &self,
        job_name: &str,
        parameters: &JobParameters,
    ) -> Result<ExecutionId, LedgerError>;

    /// Move an execution to `status`.
    async fn update_status(
        &self,
        id: ExecutionId,
        status: ExecutionStatus,
    ) -> Result<JobExecution, LedgerError> {
        self.update_status_with_message(id, status, None).await
    }

    /// Move an execution to `status`, recording an exit message.
    async fn update_status_with_message(
        &self,
        id: ExecutionId,
        status: ExecutionStatus,
        exit_message: Option<String>,
    ) -> Result<JobExecution, LedgerError>;

    /// Load one execution.
    async fn get_execution(&self, id: ExecutionId) -> Result<Option<JobExecution>, LedgerError>;

    /// The execution with the highest id for `job_name`.
    async fn last_execution(&self, job_name: &str) -> Result<Option<JobExecution>, LedgerError>;

    /// The execution with the highest id for this (name, parameters) identity.
    async fn last_execution_for(
        &self,
        job_name: &str,
        parameters: &JobParameters,
    ) -> Result<Option<JobExecution>, LedgerError>;

    /// All executions of `job_name`, newest first.
    async fn executions(&self, job_name: &str) -> Result<Vec<JobExecution>, LedgerError>;

    /// At most `limit` executions, newest first, of one job or of all jobs.
    async fn recent_executions(
        &self,
        job_name: Option<&str>,
        limit: usize,
    ) -> Result<Vec<JobExecution>, LedgerError>;

    /// Distinct job names, sorted.
    async fn job_names(&self) -> Result<Vec<String>, LedgerError>;

    /// Total number of execution records.
    async fn execution_count(&self) -> Result<u64, LedgerError>;
}

struct MemoryState {
    next_id: ExecutionId,
    executions: BTreeMap<ExecutionId, JobExecution>,
}

impl MemoryState {
    fn insert_starting(
        &mut self,
        job_name: &str,
        parameters: &JobParameters,
    ) -> Result<ExecutionId, LedgerError> {
        let id = self.next_id;
        if self.executions.contains_key(&id) {
            return Err(LedgerError::DuplicateKey(id));
        }
        self.next_id += 1;
        self.executions
            .insert(id, JobExecution::starting(id, job_name, parameters.clone()));
        debug!("Recorded start of '{}' as execution {}", job_name, id);
        Ok(id)
    }

    /// Newest execution whose canonical parameter blob equals `blob`.
    fn last_for(&self, job_name: &str, blob: &str) -> Result<Option<&JobExecution>, LedgerError> {
        for execution in self.executions.values().rev() {
            if execution.job_name == job_name && execution.parameters.to_blob()? == blob {
                return Ok(Some(execution));
            }
        }
        Ok(None)
    }
}

/// In-process ledger, used when no datasource is configured.
pub struct MemoryLedger {
    state: Mutex<MemoryState>,
}

impl MemoryLedger {
    /// Create an empty ledger. Ids start at 1.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState {
                next_id: 1,
                executions: BTreeMap::new(),
            }),
        }
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobLedger for MemoryLedger {
    fn id(&self) -> &str {
        "memory"
    }

    async fn record_start(
        &self,
        job_name: &str,
        parameters: &JobParameters,
    ) -> Result<ExecutionId, LedgerError> {
        parameters.to_blob()?;
        let mut state = self.state.lock();
        state.insert_starting(job_name, parameters)
    }

    async fn try_record_start(
        &self,
        job_name: &str,
        parameters: &JobParameters,
    ) -> Result<ExecutionId, LedgerError> {
        let blob = parameters.to_blob()?;
        let mut state = self.state.lock();
        if let Some(previous) = state.last_for(job_name, &blob)? {
            if previous.is_running() {
                return Err(LedgerError::AlreadyRunning(previous.id));
            }
        }
        state.insert_starting(job_name, parameters)
    }

    async fn update_status_with_message(
        &self,
        id: ExecutionId,
        status: ExecutionStatus,
        exit_message: Option<String>,
    ) -> Result<JobExecution, LedgerError> {
        let mut state = self.state.lock();
        let execution = state
            .executions
            .get_mut(&id)
            .ok_or(LedgerError::NotFound(id))?;
        execution.transition(status, exit_message)?;
        debug!("Execution {} is now {}", id, status);
        Ok(execution.clone())
    }

    async fn get_execution(&self, id: ExecutionId) -> Result<Option<JobExecution>, LedgerError> {
        Ok(self.state.lock().executions.get(&id).cloned())
    }

    async fn last_execution(&self, job_name: &str) -> Result<Option<JobExecution>, LedgerError> {
        let state = self.state.lock();
        Ok(state
            .executions
            .values()
            .rev()
            .find(|e| e.job_name == job_name)
            .cloned())
    }

    async fn last_execution_for(
        &self,
        job_name: &str,
        parameters: &JobParameters,
    ) -> Result<Option<JobExecution>, LedgerError> {
        let blob = parameters.to_blob()?;
        let state = self.state.lock();
        Ok(state.last_for(job_name, &blob)?.cloned())
    }

    async fn executions(&self, job_name: &str) -> Result<Vec<JobExecution>, LedgerError> {
        let state = self.state.lock();
        Ok(state
            .executions
            .values()
            .rev()
            .filter(|e| e.job_name == job_name)
            .cloned()
            .collect())
    }

    async fn recent_executions(
        &self,
        job_name: Option<&str>,
        limit: usize,
    ) -> Result<Vec<JobExecution>, LedgerError> {
        let state = self.state.lock();
        Ok(state
            .executions
            .values()
            .rev()
            .filter(|e| job_name.is_none_or(|name| e.job_name == name))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn job_names(&self) -> Result<Vec<String>, LedgerError> {
        let state = self.state.lock();
        let mut names: Vec<String> = state
            .executions
            .values()
            .map(|e| e.job_name.clone())
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    async fn execution_count(&self) -> Result<u64, LedgerError> {
        Ok(self.state.lock().executions.len() as u64)
    }
}
