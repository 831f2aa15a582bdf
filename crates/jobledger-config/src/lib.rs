//! # jobledger Config
//!
//! Configuration for assembling a batch context: datasource selection,
//! schema initialization toggle, startup job runner and ledger table naming.

mod error;
mod loader;
mod schema;
mod validator;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
pub use validator::{ConfigValidator, ValidationError, ValidationResult, ValidationWarning};
