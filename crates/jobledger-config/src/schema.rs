//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchConfig {
    #[serde(default)]
    pub datasource: DatasourceConfig,

    #[serde(default)]
    pub initializer: InitializerConfig,

    #[serde(default)]
    pub job: JobConfig,

    #[serde(default)]
    pub ledger: LedgerConfig,
}

/// Which backend holds execution records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasourceKind {
    /// SQLite tables, on disk or in memory.
    #[default]
    Sqlite,
    /// Plain in-process map, no tables at all.
    Memory,
}

/// Datasource configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasourceConfig {
    #[serde(default)]
    pub kind: DatasourceKind,

    /// Logical name, used in log output only.
    #[serde(default = "default_datasource_name")]
    pub name: String,

    /// Database file. `None` opens an in-memory SQLite database.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Default for DatasourceConfig {
    fn default() -> Self {
        Self {
            kind: DatasourceKind::default(),
            name: default_datasource_name(),
            path: None,
        }
    }
}

fn default_datasource_name() -> String {
    "batchdb".to_string()
}

/// Schema initializer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializerConfig {
    /// Create the ledger tables on startup.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for InitializerConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
        }
    }
}

/// Startup job runner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Run registered jobs when the context starts.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Restrict the startup run to these job names (empty = all jobs).
    #[serde(default)]
    pub names: Vec<String>,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            names: Vec::new(),
        }
    }
}

/// Ledger table configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Prefix for every ledger table name.
    #[serde(default = "default_table_prefix")]
    pub table_prefix: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            table_prefix: default_table_prefix(),
        }
    }
}

fn default_table_prefix() -> String {
    "BATCH_".to_string()
}

fn default_true() -> bool {
    true
}
