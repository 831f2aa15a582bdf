//! SQLite job ledger implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Row, TransactionBehavior, params, params_from_iter};
use tracing::debug;

use jobledger_core::{
    ExecutionId, ExecutionStatus, JobExecution, JobLedger, JobParameters, LedgerError,
};

use crate::database::{Database, require_table, sql_error};
use crate::schema::LedgerTables;

#[cfg(test)]
#[path = "ledger_tests.rs"]
mod tests;

const COLUMNS: &str = "JOB_EXECUTION_ID, JOB_NAME, JOB_PARAMETERS, STATUS, CREATE_TIME, \
                       START_TIME, END_TIME, LAST_UPDATED, EXIT_MESSAGE";

/// Ledger backed by the `{prefix}JOB_EXECUTION` table.
///
/// Queries against a database whose schema was never initialized fail with
/// [`LedgerError::SchemaMissing`].
pub struct SqliteLedger {
    db: Database,
    tables: LedgerTables,
}

impl SqliteLedger {
    /// Wrap an existing database. Does not touch the schema.
    pub fn new(db: Database, tables: LedgerTables) -> Self {
        Self { db, tables }
    }

    /// Fresh in-memory database with the default tables created.
    pub async fn in_memory() -> Result<Self, LedgerError> {
        let db = Database::in_memory("ledger").await?;
        let tables = LedgerTables::default();
        db.initialize_schema(&tables).await?;
        Ok(Self::new(db, tables))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn tables(&self) -> &LedgerTables {
        &self.tables
    }

    async fn query_many(
        &self,
        job_name: Option<String>,
        limit: Option<usize>,
    ) -> Result<Vec<JobExecution>, LedgerError> {
        let table = self.tables.execution_table();
        self.db
            .with_conn(move |conn| {
                require_table(conn, &table)?;
                let mut sql = format!("SELECT {} FROM {}", COLUMNS, table);
                if job_name.is_some() {
                    sql.push_str(" WHERE JOB_NAME = ?1");
                }
                sql.push_str(" ORDER BY JOB_EXECUTION_ID DESC");
                if let Some(limit) = limit {
                    sql.push_str(&format!(" LIMIT {}", limit));
                }
                let mut stmt = conn.prepare(&sql).map_err(sql_error)?;
                let raws = stmt
                    .query_map(params_from_iter(job_name.iter()), RawExecution::from_row)
                    .map_err(sql_error)?
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(sql_error)?;
                raws.into_iter().map(RawExecution::into_execution).collect()
            })
            .await
    }

    /// Insert a `STARTING` row. With `exclusive`, first fail if the newest row
    /// for the same name and parameter blob is still running; both steps share
    /// one IMMEDIATE transaction.
    async fn insert_start(
        &self,
        job_name: &str,
        parameters: &JobParameters,
        exclusive: bool,
    ) -> Result<ExecutionId, LedgerError> {
        let table = self.tables.execution_table();
        let job_name = job_name.to_string();
        let blob = parameters.to_blob()?;

        let id = self
            .db
            .with_conn(move |conn| {
                require_table(conn, &table)?;
                let tx = conn
                    .transaction_with_behavior(TransactionBehavior::Immediate)
                    .map_err(sql_error)?;

                if exclusive {
                    let previous: Option<(ExecutionId, String)> = tx
                        .query_row(
                            &format!(
                                "SELECT JOB_EXECUTION_ID, STATUS FROM {} \
                                 WHERE JOB_NAME = ?1 AND JOB_PARAMETERS = ?2 \
                                 ORDER BY JOB_EXECUTION_ID DESC LIMIT 1",
                                table
                            ),
                            params![job_name, blob],
                            |row| Ok((row.get(0)?, row.get(1)?)),
                        )
                        .optional()
                        .map_err(sql_error)?;
                    if let Some((previous_id, status)) = previous {
                        let status: ExecutionStatus =
                            status.parse().map_err(LedgerError::Serialization)?;
                        if status.is_running() {
                            return Err(LedgerError::AlreadyRunning(previous_id));
                        }
                    }
                }

                let id: ExecutionId = tx
                    .query_row(
                        &format!("SELECT COALESCE(MAX(JOB_EXECUTION_ID), 0) + 1 FROM {}", table),
                        [],
                        |row| row.get(0),
                    )
                    .map_err(sql_error)?;

                let now = Utc::now().to_rfc3339();
                let inserted = tx.execute(
                    &format!(
                        "INSERT INTO {} (JOB_EXECUTION_ID, JOB_NAME, JOB_PARAMETERS, STATUS, \
                         CREATE_TIME, START_TIME, LAST_UPDATED) VALUES (?1, ?2, ?3, ?4, ?5, ?5, ?5)",
                        table
                    ),
                    params![id, job_name, blob, ExecutionStatus::Starting.as_str(), now],
                );
                match inserted {
                    Ok(_) => {}
                    Err(rusqlite::Error::SqliteFailure(err, _))
                        if err.code == rusqlite::ErrorCode::ConstraintViolation =>
                    {
                        return Err(LedgerError::DuplicateKey(id));
                    }
                    Err(e) => return Err(sql_error(e)),
                }

                tx.commit().map_err(sql_error)?;
                Ok(id)
            })
            .await?;

        debug!("Recorded execution {} in '{}'", id, self.db.name());
        Ok(id)
    }
}

#[async_trait]
impl JobLedger for SqliteLedger {
    fn id(&self) -> &str {
        "sqlite"
    }

    async fn record_start(
        &self,
        job_name: &str,
        parameters: &JobParameters,
    ) -> Result<ExecutionId, LedgerError> {
        self.insert_start(job_name, parameters, false).await
    }

    async fn try_record_start(
        &self,
        job_name: &str,
        parameters: &JobParameters,
    ) -> Result<ExecutionId, LedgerError> {
        self.insert_start(job_name, parameters, true).await
    }

    async fn update_status_with_message(
        &self,
        id: ExecutionId,
        status: ExecutionStatus,
        exit_message: Option<String>,
    ) -> Result<JobExecution, LedgerError> {
        let table = self.tables.execution_table();
        let execution = self
            .db
            .with_conn(move |conn| {
                require_table(conn, &table)?;
                let tx = conn
                    .transaction_with_behavior(TransactionBehavior::Immediate)
                    .map_err(sql_error)?;

                let raw = tx
                    .query_row(
                        &format!("SELECT {} FROM {} WHERE JOB_EXECUTION_ID = ?1", COLUMNS, table),
                        [id],
                        RawExecution::from_row,
                    )
                    .optional()
                    .map_err(sql_error)?
                    .ok_or(LedgerError::NotFound(id))?;

                let mut execution = raw.into_execution()?;
                execution.transition(status, exit_message)?;

                tx.execute(
                    &format!(
                        "UPDATE {} SET STATUS = ?1, END_TIME = ?2, LAST_UPDATED = ?3, \
                         EXIT_MESSAGE = ?4 WHERE JOB_EXECUTION_ID = ?5",
                        table
                    ),
                    params![
                        execution.status.as_str(),
                        execution.end_time.map(|t| t.to_rfc3339()),
                        execution.last_updated.to_rfc3339(),
                        execution.exit_message,
                        id
                    ],
                )
                .map_err(sql_error)?;

                tx.commit().map_err(sql_error)?;
                Ok(execution)
            })
            .await?;

        debug!("Execution {} is now {}", id, status);
        Ok(execution)
    }

    async fn get_execution(&self, id: ExecutionId) -> Result<Option<JobExecution>, LedgerError> {
        let table = self.tables.execution_table();
        self.db
            .with_conn(move |conn| {
                require_table(conn, &table)?;
                let raw = conn
                    .query_row(
                        &format!("SELECT {} FROM {} WHERE JOB_EXECUTION_ID = ?1", COLUMNS, table),
                        [id],
                        RawExecution::from_row,
                    )
                    .optional()
                    .map_err(sql_error)?;
                raw.map(RawExecution::into_execution).transpose()
            })
            .await
    }

    async fn last_execution(&self, job_name: &str) -> Result<Option<JobExecution>, LedgerError> {
        let mut found = self
            .query_many(Some(job_name.to_string()), Some(1))
            .await?;
        Ok(found.pop())
    }

    async fn last_execution_for(
        &self,
        job_name: &str,
        parameters: &JobParameters,
    ) -> Result<Option<JobExecution>, LedgerError> {
        let table = self.tables.execution_table();
        let job_name = job_name.to_string();
        let blob = parameters.to_blob()?;
        self.db
            .with_conn(move |conn| {
                require_table(conn, &table)?;
                let raw = conn
                    .query_row(
                        &format!(
                            "SELECT {} FROM {} WHERE JOB_NAME = ?1 AND JOB_PARAMETERS = ?2 \
                             ORDER BY JOB_EXECUTION_ID DESC LIMIT 1",
                            COLUMNS, table
                        ),
                        params![job_name, blob],
                        RawExecution::from_row,
                    )
                    .optional()
                    .map_err(sql_error)?;
                raw.map(RawExecution::into_execution).transpose()
            })
            .await
    }

    async fn executions(&self, job_name: &str) -> Result<Vec<JobExecution>, LedgerError> {
        self.query_many(Some(job_name.to_string()), None).await
    }

    async fn recent_executions(
        &self,
        job_name: Option<&str>,
        limit: usize,
    ) -> Result<Vec<JobExecution>, LedgerError> {
        self.query_many(job_name.map(str::to_string), Some(limit))
            .await
    }

    async fn job_names(&self) -> Result<Vec<String>, LedgerError> {
        let table = self.tables.execution_table();
        self.db
            .with_conn(move |conn| {
                require_table(conn, &table)?;
                let mut stmt = conn
                    .prepare(&format!(
                        "SELECT DISTINCT JOB_NAME FROM {} ORDER BY JOB_NAME",
                        table
                    ))
                    .map_err(sql_error)?;
                let names = stmt
                    .query_map([], |row| row.get(0))
                    .map_err(sql_error)?
                    .collect::<Result<Vec<String>, _>>()
                    .map_err(sql_error)?;
                Ok(names)
            })
            .await
    }

    async fn execution_count(&self) -> Result<u64, LedgerError> {
        self.db.row_count(&self.tables.execution_table()).await
    }
}

/// Column values as stored, before parsing.
struct RawExecution {
    id: ExecutionId,
    job_name: String,
    parameters: String,
    status: String,
    created_at: String,
    start_time: String,
    end_time: Option<String>,
    last_updated: String,
    exit_message: Option<String>,
}

impl RawExecution {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            job_name: row.get(1)?,
            parameters: row.get(2)?,
            status: row.get(3)?,
            created_at: row.get(4)?,
            start_time: row.get(5)?,
            end_time: row.get(6)?,
            last_updated: row.get(7)?,
            exit_message: row.get(8)?,
        })
    }

    fn into_execution(self) -> Result<JobExecution, LedgerError> {
        Ok(JobExecution {
            id: self.id,
            job_name: self.job_name,
            parameters: JobParameters::from_blob(&self.parameters)?,
            status: self
                .status
                .parse()
                .map_err(LedgerError::Serialization)?,
            created_at: parse_time(&self.created_at)?,
            start_time: parse_time(&self.start_time)?,
            end_time: self.end_time.as_deref().map(parse_time).transpose()?,
            last_updated: parse_time(&self.last_updated)?,
            exit_message: self.exit_message,
        })
    }
}

fn parse_time(s: &str) -> Result<DateTime<Utc>, LedgerError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| LedgerError::Serialization(format!("bad timestamp '{}': {}", s, e)))
}
