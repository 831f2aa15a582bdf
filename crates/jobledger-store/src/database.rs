//! Shared SQLite storage handle.

use std::path::Path;

use tokio_rusqlite::Connection;
use tracing::{debug, info};

use jobledger_core::{LedgerError, is_identifier};

use crate::schema::{LedgerTables, init_schema, table_exists};

/// Async handle to one SQLite database.
///
/// Cloning shares the underlying connection; every call runs on the
/// connection's worker thread, one at a time.
#[derive(Clone)]
pub struct Database {
    conn: Connection,
    name: String,
}

impl Database {
    /// Open a private in-memory database.
    pub async fn in_memory(name: impl Into<String>) -> Result<Self, LedgerError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        let name = name.into();
        debug!("Opened in-memory database '{}'", name);
        Ok(Self { conn, name })
    }

    /// Open (or create) a file-backed database.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref().to_path_buf();
        let name = path.display().to_string();
        let conn = Connection::open(path)
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        debug!("Opened database file '{}'", name);
        Ok(Self { conn, name })
    }

    /// Logical name (or file path) of this database.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Create the ledger tables.
    pub async fn initialize_schema(&self, tables: &LedgerTables) -> Result<(), LedgerError> {
        let tables_clone = tables.clone();
        self.with_conn(move |conn| init_schema(conn, &tables_clone).map_err(sql_error))
            .await?;
        info!(
            "Initialized ledger schema ({}) in '{}'",
            tables.execution_table(),
            self.name
        );
        Ok(())
    }

    /// Whether `table` exists.
    pub async fn table_exists(&self, table: &str) -> Result<bool, LedgerError> {
        let table = table.to_string();
        self.with_conn(move |conn| table_exists(conn, &table).map_err(sql_error))
            .await
    }

    /// Number of rows in `table`. Fails with `SchemaMissing` if it does not exist.
    pub async fn row_count(&self, table: &str) -> Result<u64, LedgerError> {
        if !is_identifier(table) {
            return Err(LedgerError::Database(format!(
                "invalid table name: {}",
                table
            )));
        }
        let table = table.to_string();
        self.with_conn(move |conn| {
            require_table(conn, &table)?;
            let count: i64 = conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                    row.get(0)
                })
                .map_err(sql_error)?;
            Ok(count as u64)
        })
        .await
    }

    /// Run `f` on the connection thread.
    pub(crate) async fn with_conn<T, F>(&self, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut rusqlite::Connection) -> Result<T, LedgerError> + Send + 'static,
        T: Send + 'static,
    {
        self.conn
            .call(move |conn| Ok(f(conn)))
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?
    }
}

pub(crate) fn sql_error(e: rusqlite::Error) -> LedgerError {
    LedgerError::Database(e.to_string())
}

/// Fail with `SchemaMissing` unless `table` exists.
pub(crate) fn require_table(conn: &rusqlite::Connection, table: &str) -> Result<(), LedgerError> {
    if table_exists(conn, table).map_err(sql_error)? {
        Ok(())
    } else {
        Err(LedgerError::SchemaMissing(table.to_string()))
    }
}
