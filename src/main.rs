//! jobledger - job execution ledger
//!
//! Inspection CLI over a SQLite-backed ledger.

mod cli;

use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::{debug, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use jobledger_config::{BatchConfig, ConfigLoader, ConfigValidator, DatasourceKind};
use jobledger_core::JobLedger;
use jobledger_store::{Database, LedgerTables, SqliteLedger};

use cli::{Cli, Commands};

fn jobledger_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".jobledger")
}

fn init_tracing() -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = jobledger_dir().join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("jobledger")
        .filename_suffix("log")
        .max_log_files(14)
        .build(&log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Flushes the file writer on exit.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_ansi(true)
                .with_writer(std::io::stderr),
        )
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

fn load_config(cli: &Cli) -> Result<BatchConfig, Box<dyn std::error::Error>> {
    let config = if cli.config.exists() {
        info!("Loading configuration from {}", cli.config.display());
        ConfigLoader::load(&cli.config)?
    } else {
        debug!(
            "No configuration at {}, using defaults",
            cli.config.display()
        );
        BatchConfig::default()
    };

    Ok(finish_config(config, cli.db.as_deref())?)
}

/// Apply the `--db` override, then validate the result.
fn finish_config(
    mut config: BatchConfig,
    db: Option<&Path>,
) -> Result<BatchConfig, jobledger_config::ConfigError> {
    if let Some(db) = db {
        config.datasource.kind = DatasourceKind::Sqlite;
        config.datasource.path = Some(db.to_path_buf());
    }

    for warning in ConfigValidator::validate(&config).into_result()? {
        warn!("{}: {}", warning.path, warning.message);
    }

    Ok(config)
}

async fn open_database(config: &BatchConfig) -> Result<Database, Box<dyn std::error::Error>> {
    if config.datasource.kind == DatasourceKind::Memory {
        return Err("the memory datasource keeps nothing to inspect; use --db".into());
    }
    let db = match &config.datasource.path {
        Some(path) => Database::open(path).await?,
        None => Database::in_memory(config.datasource.name.clone()).await?,
    };
    Ok(db)
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing()?;

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let tables = LedgerTables::new(config.ledger.table_prefix.clone());
    let db = open_database(&config).await?;

    match cli.command {
        Commands::Schema => {
            db.initialize_schema(&tables).await?;
            println!("{} ready in {}", tables.execution_table(), db.name());
        }
        Commands::Last { job } => {
            let ledger = SqliteLedger::new(db, tables);
            match ledger.last_execution(&job).await? {
                Some(execution) => print_json(&execution)?,
                None => println!("null"),
            }
        }
        Commands::List { job, limit } => {
            let ledger = SqliteLedger::new(db, tables);
            let executions = ledger.recent_executions(job.as_deref(), limit).await?;
            print_json(&executions)?;
        }
        Commands::Jobs => {
            let ledger = SqliteLedger::new(db, tables);
            print_json(&ledger.job_names().await?)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_config_rejects_bad_prefix() {
        let mut config = BatchConfig::default();
        config.ledger.table_prefix = "X(a);DROP TABLE BATCH_JOB_EXECUTION;--".to_string();

        let err = finish_config(config, None).unwrap_err();
        assert!(matches!(
            err,
            jobledger_config::ConfigError::InvalidValue { ref field, .. } if field == "ledger.table_prefix"
        ));
    }

    #[test]
    fn test_finish_config_applies_db_override() {
        let config = finish_config(BatchConfig::default(), Some(Path::new("ledger.db"))).unwrap();
        assert_eq!(config.datasource.kind, DatasourceKind::Sqlite);
        assert_eq!(config.datasource.path.as_deref(), Some(Path::new("ledger.db")));
    }
}
