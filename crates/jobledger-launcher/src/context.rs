//! Batch context assembly.

use std::sync::Arc;

use tracing::{info, warn};

use jobledger_config::{BatchConfig, ConfigValidator, DatasourceKind};
use jobledger_core::{JobExecution, JobLedger, MemoryLedger};
use jobledger_store::{Database, LedgerTables, SqliteLedger};

use crate::error::LaunchError;
use crate::job::Job;
use crate::launcher::JobLauncher;
use crate::registry::JobRegistry;
use crate::runner::JobRunner;

/// Everything needed to launch jobs, wired from one [`BatchConfig`].
///
/// Holds the datasource (if SQLite-backed), the ledger, a launcher writing
/// to that ledger and the registry of known jobs.
pub struct BatchContext {
    config: BatchConfig,
    database: Option<Database>,
    ledger: Arc<dyn JobLedger>,
    launcher: Arc<JobLauncher>,
    registry: Arc<JobRegistry>,
}

impl BatchContext {
    /// Build a context from `config` and register `jobs`.
    ///
    /// Ledger tables are created only when `initializer.enabled` is set. With
    /// it disabled the context still assembles, but ledger queries fail with
    /// `SchemaMissing` until the tables exist.
    pub async fn assemble(config: BatchConfig, jobs: Vec<Job>) -> Result<Self, LaunchError> {
        let warnings = ConfigValidator::validate(&config).into_result()?;
        for w in &warnings {
            warn!("Config warning at {}: {}", w.path, w.message);
        }

        let tables = LedgerTables::new(config.ledger.table_prefix.clone());

        let (database, ledger): (Option<Database>, Arc<dyn JobLedger>) =
            match config.datasource.kind {
                DatasourceKind::Memory => {
                    info!("Using in-memory ledger");
                    let ledger: Arc<dyn JobLedger> = Arc::new(MemoryLedger::new());
                    (None, ledger)
                }
                DatasourceKind::Sqlite => {
                    let db = match &config.datasource.path {
                        Some(path) => Database::open(path).await?,
                        None => Database::in_memory(config.datasource.name.clone()).await?,
                    };
                    if config.initializer.enabled {
                        db.initialize_schema(&tables).await?;
                    } else {
                        info!(
                            "Schema initialization disabled for '{}'; {} must already exist",
                            db.name(),
                            tables.execution_table()
                        );
                    }
                    let ledger: Arc<dyn JobLedger> =
                        Arc::new(SqliteLedger::new(db.clone(), tables));
                    (Some(db), ledger)
                }
            };

        let launcher = Arc::new(JobLauncher::new(ledger.clone()));
        let registry = Arc::new(JobRegistry::new());
        for job in jobs {
            registry.register(job)?;
        }

        info!(
            "Batch context ready: {} job(s), ledger '{}'",
            registry.len(),
            ledger.id()
        );

        Ok(Self {
            config,
            database,
            ledger,
            launcher,
            registry,
        })
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// The SQLite datasource, absent for the in-memory ledger.
    pub fn database(&self) -> Option<&Database> {
        self.database.as_ref()
    }

    pub fn ledger(&self) -> &Arc<dyn JobLedger> {
        &self.ledger
    }

    pub fn launcher(&self) -> &Arc<JobLauncher> {
        &self.launcher
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    /// A runner over the registered jobs, filtered by `job.names`.
    pub fn runner(&self) -> JobRunner {
        JobRunner::new(self.launcher.clone(), self.registry.clone())
            .with_job_names(self.config.job.names.iter().cloned())
    }

    /// Startup hook: run registered jobs with `args` if `job.enabled`.
    pub async fn start<I, S>(&self, args: I) -> Result<Vec<JobExecution>, LaunchError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if !self.config.job.enabled {
            info!("Job runner disabled; nothing launched at startup");
            return Ok(Vec::new());
        }
        self.runner().run(args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobledger_core::{JobDefinition, LedgerError};

    #[tokio::test]
    async fn test_default_context_has_database() {
        let context = BatchContext::assemble(BatchConfig::default(), vec![])
            .await
            .unwrap();
        assert_eq!(context.database().unwrap().name(), "batchdb");
        assert!(context.registry().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let mut config = BatchConfig::default();
        config.ledger.table_prefix = "bad prefix;".to_string();

        let result = BatchContext::assemble(config, vec![]).await;
        assert!(matches!(result, Err(LaunchError::Config(_))));
    }

    #[tokio::test]
    async fn test_duplicate_job_rejected() {
        let jobs = vec![
            Job::noop(JobDefinition::new("job")),
            Job::noop(JobDefinition::new("job")),
        ];
        let result = BatchContext::assemble(BatchConfig::default(), jobs).await;
        assert!(matches!(result, Err(LaunchError::AlreadyRegistered(_))));
    }

    #[tokio::test]
    async fn test_memory_datasource() {
        let mut config = BatchConfig::default();
        config.datasource.kind = DatasourceKind::Memory;

        let context = BatchContext::assemble(config, vec![Job::noop(JobDefinition::new("job"))])
            .await
            .unwrap();
        assert!(context.database().is_none());
        assert_eq!(context.ledger().id(), "memory");

        context.start(Vec::<String>::new()).await.unwrap();
        assert_eq!(context.ledger().execution_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_initializer_disabled() {
        let mut config = BatchConfig::default();
        config.datasource.name = "batchtest".to_string();
        config.initializer.enabled = false;

        let context = BatchContext::assemble(config, vec![]).await.unwrap();
        let err = context.ledger().execution_count().await.unwrap_err();
        assert!(matches!(err, LedgerError::SchemaMissing(_)));
    }
}
