//! Database schema.
//!
//! Migrations live in `migrations/` and are embedded at compile time.

use sqlx::migrate::Migrator;

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!();

/// Table names created by the migrations.
pub mod table {
    /// Customer records.
    pub const CUSTOMERS: &str = "customers";

    /// Append-only stamp ledger.
    pub const TRANSACTIONS: &str = "transactions";

    /// Program rules (key/value).
    pub const CONFIG: &str = "config";
}

/// Returns all table names for schema checks.
#[must_use]
pub fn all_tables() -> Vec<&'static str> {
    vec![table::CUSTOMERS, table::TRANSACTIONS, table::CONFIG]
}
