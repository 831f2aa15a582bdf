//! Jobs: a definition plus the logic that runs it.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use jobledger_core::{JobDefinition, JobExecution};

use crate::error::JobError;

/// Execution logic of a job. Opaque to the launcher.
#[async_trait]
pub trait JobLogic: Send + Sync {
    /// Run the job for `execution` (status `STARTED`).
    async fn execute(&self, execution: &JobExecution) -> Result<(), JobError>;
}

/// Logic that finishes immediately.
struct CompleteImmediately;

#[async_trait]
impl JobLogic for CompleteImmediately {
    async fn execute(&self, _execution: &JobExecution) -> Result<(), JobError> {
        Ok(())
    }
}

/// Adapter for closure-based logic.
struct FnLogic<F>(F);

#[async_trait]
impl<F, Fut> JobLogic for FnLogic<F>
where
    F: Fn(JobExecution) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), JobError>> + Send + 'static,
{
    async fn execute(&self, execution: &JobExecution) -> Result<(), JobError> {
        (self.0)(execution.clone()).await
    }
}

/// A runnable job.
#[derive(Clone)]
pub struct Job {
    definition: JobDefinition,
    logic: Arc<dyn JobLogic>,
}

impl Job {
    /// Pair a definition with its logic.
    pub fn new(definition: JobDefinition, logic: impl JobLogic + 'static) -> Self {
        Self {
            definition,
            logic: Arc::new(logic),
        }
    }

    /// A job whose logic is an async closure.
    pub fn from_fn<F, Fut>(definition: JobDefinition, f: F) -> Self
    where
        F: Fn(JobExecution) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), JobError>> + Send + 'static,
    {
        Self::new(definition, FnLogic(f))
    }

    /// A job that completes as soon as it starts.
    pub fn noop(definition: JobDefinition) -> Self {
        Self::new(definition, CompleteImmediately)
    }

    pub fn name(&self) -> &str {
        self.definition.name()
    }

    pub fn definition(&self) -> &JobDefinition {
        &self.definition
    }

    pub(crate) async fn execute(&self, execution: &JobExecution) -> Result<(), JobError> {
        self.logic.execute(execution).await
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("definition", &self.definition)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobledger_core::JobParameters;

    fn execution() -> JobExecution {
        JobExecution::starting(1, "job", JobParameters::new())
    }

    #[tokio::test]
    async fn test_noop_job() {
        let job = Job::noop(JobDefinition::new("job"));
        assert_eq!(job.name(), "job");
        assert!(job.definition().steps().is_empty());
        assert!(job.execute(&execution()).await.is_ok());
    }

    #[tokio::test]
    async fn test_from_fn_sees_execution() {
        let job = Job::from_fn(JobDefinition::new("job"), |execution| async move {
            if execution.job_name == "job" {
                Ok(())
            } else {
                Err(JobError::failed("wrong execution"))
            }
        });
        assert!(job.execute(&execution()).await.is_ok());
    }

    #[tokio::test]
    async fn test_custom_logic_error() {
        struct Broken;

        #[async_trait]
        impl JobLogic for Broken {
            async fn execute(&self, _execution: &JobExecution) -> Result<(), JobError> {
                Err(JobError::failed("broken"))
            }
        }

        let job = Job::new(JobDefinition::new("broken"), Broken);
        let err = job.execute(&execution()).await.unwrap_err();
        assert_eq!(err.to_string(), "broken");
    }

    #[test]
    fn test_debug_shows_definition() {
        let job = Job::noop(JobDefinition::new("job").with_step("only"));
        let debug = format!("{:?}", job);
        assert!(debug.contains("job"));
        assert!(debug.contains("only"));
    }
}
