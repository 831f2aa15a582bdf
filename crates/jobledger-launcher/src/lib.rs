//! # jobledger Launcher
//!
//! Runs jobs and records their lifecycle in a [`JobLedger`].
//!
//! ## Components
//!
//! - [`Job`] / [`JobLogic`] - a job definition paired with its execution callback
//! - [`JobLauncher`] - records start, invokes the callback, records the outcome
//! - [`JobRegistry`] - jobs known to a context, by name
//! - [`JobRunner`] - launches registered jobs with parameters taken from arguments
//! - [`BatchContext`] - assembles storage, ledger, launcher and registry from a [`BatchConfig`]
//!
//! [`JobLedger`]: jobledger_core::JobLedger
//! [`BatchConfig`]: jobledger_config::BatchConfig

pub mod context;
pub mod converter;
pub mod error;
pub mod job;
pub mod launcher;
pub mod registry;
pub mod runner;

pub use context::BatchContext;
pub use converter::JobParametersConverter;
pub use error::{JobError, LaunchError};
pub use job::{Job, JobLogic};
pub use launcher::JobLauncher;
pub use registry::JobRegistry;
pub use runner::JobRunner;
