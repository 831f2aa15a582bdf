//! Database schema management.

use rusqlite::{Connection, OptionalExtension};

/// Ledger table names, derived from a configurable prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerTables {
    prefix: String,
}

impl LedgerTables {
    /// Prefix must be a plain SQL identifier; it is interpolated into DDL.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The execution table, e.g. `BATCH_JOB_EXECUTION`.
    pub fn execution_table(&self) -> String {
        format!("{}JOB_EXECUTION", self.prefix)
    }

    fn ddl(&self) -> String {
        let table = self.execution_table();
        format!(
            r#"
-- One row per launch attempt
CREATE TABLE IF NOT EXISTS {table} (
    JOB_EXECUTION_ID INTEGER PRIMARY KEY AUTOINCREMENT,
    JOB_NAME TEXT NOT NULL,
    JOB_PARAMETERS TEXT NOT NULL DEFAULT '{{}}',
    STATUS TEXT NOT NULL,
    CREATE_TIME TEXT NOT NULL,
    START_TIME TEXT NOT NULL,
    END_TIME TEXT,
    LAST_UPDATED TEXT NOT NULL,
    EXIT_MESSAGE TEXT
);

CREATE INDEX IF NOT EXISTS {prefix}JOB_EXEC_NAME_IDX ON {table}(JOB_NAME, JOB_EXECUTION_ID);
"#,
            table = table,
            prefix = self.prefix,
        )
    }
}

impl Default for LedgerTables {
    fn default() -> Self {
        Self::new("BATCH_")
    }
}

/// Create the ledger tables if they do not exist.
pub fn init_schema(conn: &Connection, tables: &LedgerTables) -> rusqlite::Result<()> {
    conn.execute_batch(&tables.ddl())
}

/// Whether `table` exists in the main database.
pub fn table_exists(conn: &Connection, table: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [table],
        |_| Ok(()),
    )
    .optional()
    .map(|found| found.is_some())
}
