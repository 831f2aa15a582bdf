//! # jobledger Core
//!
//! Job execution bookkeeping.
//!
//! ## Components
//!
//! - [`JobDefinition`] - immutable job descriptor (name + ordered step names)
//! - [`JobParameters`] - typed, identity-bearing launch inputs
//! - [`JobExecution`] - one record per launch attempt
//! - [`JobLedger`] - the narrow interface every execution write goes through
//! - [`MemoryLedger`] - in-process ledger used when no datasource is configured

pub mod error;
pub mod execution;
pub mod job;
pub mod ledger;
pub mod naming;
pub mod parameters;
pub mod status;

pub use error::LedgerError;
pub use execution::{ExecutionId, JobExecution};
pub use job::JobDefinition;
pub use ledger::{JobLedger, MemoryLedger};
pub use naming::is_identifier;
pub use parameters::{JobParameter, JobParameters};
pub use status::ExecutionStatus;
