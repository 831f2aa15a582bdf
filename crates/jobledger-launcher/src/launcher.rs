//! Job launcher.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::FutureExt;
use tracing::{debug, error, info, warn};

use jobledger_core::{ExecutionStatus, JobExecution, JobLedger, JobParameters, LedgerError};

use crate::error::{JobError, LaunchError};
use crate::job::Job;

#[cfg(test)]
#[path = "launcher_tests.rs"]
mod tests;

/// Starts job runs and records their lifecycle in the ledger.
///
/// A launch is single-threaded; distinct launches may run concurrently on a
/// shared launcher since id assignment is serialized by the ledger.
pub struct JobLauncher {
    ledger: Arc<dyn JobLedger>,
    launched: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
}

impl JobLauncher {
    /// Create a launcher writing to `ledger`.
    pub fn new(ledger: Arc<dyn JobLedger>) -> Self {
        Self {
            ledger,
            launched: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    pub fn ledger(&self) -> &Arc<dyn JobLedger> {
        &self.ledger
    }

    /// Launches recorded by this launcher.
    pub fn launched_count(&self) -> u64 {
        self.launched.load(Ordering::SeqCst)
    }

    /// Launches that ended `COMPLETED`.
    pub fn completed_count(&self) -> u64 {
        self.completed.load(Ordering::SeqCst)
    }

    /// Launches that ended `FAILED`.
    pub fn failed_count(&self) -> u64 {
        self.failed.load(Ordering::SeqCst)
    }

    /// Run `job` once with `parameters`.
    ///
    /// Returns the final execution snapshot (`COMPLETED` or `STOPPED`). If the
    /// job logic fails or panics the execution is recorded as `FAILED` and the
    /// error is returned; there is no retry.
    pub async fn launch(
        &self,
        job: &Job,
        parameters: JobParameters,
    ) -> Result<JobExecution, LaunchError> {
        let name = job.name();

        let id = match self.ledger.try_record_start(name, &parameters).await {
            Ok(id) => id,
            Err(LedgerError::AlreadyRunning(execution_id)) => {
                return Err(LaunchError::AlreadyRunning {
                    job: name.to_string(),
                    execution_id,
                });
            }
            Err(e) => return Err(e.into()),
        };
        self.launched.fetch_add(1, Ordering::SeqCst);
        info!(
            "Job '{}' launched as execution {} with {} parameter(s)",
            name,
            id,
            parameters.len()
        );

        let execution = self.ledger.update_status(id, ExecutionStatus::Started).await?;
        debug!("Execution {} started ({} step(s))", id, job.definition().steps().len());

        let outcome = AssertUnwindSafe(job.execute(&execution))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(JobError::failed(panic_message(panic.as_ref()))));

        match outcome {
            Ok(()) => {
                let done = self
                    .ledger
                    .update_status(id, ExecutionStatus::Completed)
                    .await?;
                self.completed.fetch_add(1, Ordering::SeqCst);
                info!("Job '{}' execution {} completed", name, id);
                Ok(done)
            }
            Err(JobError::Stopped(reason)) => {
                let stopped = self
                    .ledger
                    .update_status_with_message(id, ExecutionStatus::Stopped, Some(reason))
                    .await?;
                warn!("Job '{}' execution {} stopped", name, id);
                Ok(stopped)
            }
            Err(e) => {
                self.failed.fetch_add(1, Ordering::SeqCst);
                error!("Job '{}' execution {} failed: {}", name, id, e);
                self.ledger
                    .update_status_with_message(id, ExecutionStatus::Failed, Some(e.to_string()))
                    .await?;
                Err(LaunchError::JobFailed {
                    job: name.to_string(),
                    execution_id: id,
                    source: e,
                })
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown cause".to_string());
    format!("job logic panicked: {}", detail)
}
