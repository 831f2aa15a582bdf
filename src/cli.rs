//! CLI definitions for jobledger.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// jobledger CLI.
#[derive(Parser)]
#[command(name = "jobledger")]
#[command(about = "Inspect a job execution ledger")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml", global = true)]
    pub config: PathBuf,

    /// Database file, overrides `datasource.path`
    #[arg(long, env = "JOBLEDGER_DB", global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Create the ledger tables if they do not exist
    Schema,

    /// Show the most recent execution of a job
    Last {
        /// Job name
        job: String,
    },

    /// List executions, newest first
    List {
        /// Only executions of this job
        #[arg(long)]
        job: Option<String>,

        /// Maximum number of executions to print
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// List job names with at least one execution
    Jobs,
}
