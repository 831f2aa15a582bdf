//! Launches registered jobs from command-line style arguments.

use std::sync::Arc;

use tracing::info;

use jobledger_core::JobExecution;

use crate::converter::JobParametersConverter;
use crate::error::LaunchError;
use crate::job::Job;
use crate::launcher::JobLauncher;
use crate::registry::JobRegistry;

/// Runs registered jobs once each with parameters taken from arguments.
pub struct JobRunner {
    launcher: Arc<JobLauncher>,
    registry: Arc<JobRegistry>,
    job_names: Vec<String>,
}

impl JobRunner {
    pub fn new(launcher: Arc<JobLauncher>, registry: Arc<JobRegistry>) -> Self {
        Self {
            launcher,
            registry,
            job_names: Vec::new(),
        }
    }

    /// Restrict the run to these jobs, in this order. Empty means all.
    pub fn with_job_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.job_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Launch the selected jobs sequentially.
    ///
    /// Stops at the first failure, which is returned after it has been
    /// recorded in the ledger.
    pub async fn run<I, S>(&self, args: I) -> Result<Vec<JobExecution>, LaunchError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let parameters = JobParametersConverter::from_args(args)?;
        let jobs = self.selected_jobs()?;

        info!("Running {} job(s)", jobs.len());

        let mut executions = Vec::with_capacity(jobs.len());
        for job in &jobs {
            let execution = self.launcher.launch(job, parameters.clone()).await?;
            executions.push(execution);
        }
        Ok(executions)
    }

    fn selected_jobs(&self) -> Result<Vec<Job>, LaunchError> {
        if self.job_names.is_empty() {
            return Ok(self.registry.jobs());
        }
        self.job_names
            .iter()
            .map(|name| {
                self.registry
                    .get(name)
                    .ok_or_else(|| LaunchError::NoSuchJob(name.clone()))
            })
            .collect()
    }
}
