//! SQLite storage for the job execution ledger.
//!
//! [`Database`] is the shared storage handle; [`SqliteLedger`] is the only
//! writer of the execution table. Table creation is explicit
//! ([`Database::initialize_schema`]) so callers can turn it off.

mod database;
mod ledger;
mod schema;

pub use database::Database;
pub use ledger::SqliteLedger;
pub use schema::LedgerTables;
