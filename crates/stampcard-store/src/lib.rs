//! SQLite storage layer for stampcard.
//!
//! This crate is the single data-access module of the loyalty ledger. Every
//! operation acquires a pooled connection, runs, and releases it; ledger
//! mutations run inside one database transaction each.
//!
//! # Tables
//!
//! - `customers`: stamp balance and lifetime spend, unique nullable `phone`
//! - `transactions`: append-only `purchase`/`redeem`/`adjust` entries
//! - `config`: `stamps_needed` and `reais_per_stamp`
//!
//! # Example
//!
//! ```no_run
//! use stampcard_core::{CustomerInput, LoyaltyConfig};
//! use stampcard_store::{SqliteStore, Store};
//!
//! # async fn run() -> stampcard_store::Result<()> {
//! let store = SqliteStore::connect("sqlite://data/stampcard.db", 4).await?;
//! store.seed_config(&LoyaltyConfig::default()).await?;
//!
//! let (customer, _) = store
//!     .upsert_customer(&CustomerInput::new("Ana", Some("91999999999"), None))
//!     .await?;
//! let outcome = store.record_purchase(customer.id, 27_500).await?;
//! println!("earned {} stamps", outcome.stamps_earned);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
mod rows;
pub mod schema;
pub mod sqlite;

pub use error::{Result, StoreError};
pub use sqlite::SqliteStore;

use async_trait::async_trait;

use stampcard_core::{
    AdjustOutcome, BalanceDiscrepancy, Customer, CustomerId, CustomerInput, LedgerStats,
    LoyaltyConfig, PurchaseOutcome, RedeemOutcome, StampTransaction, UpsertOutcome,
};

/// Maximum results of a name search.
pub const SEARCH_LIMIT: u32 = 50;

/// Default size of a customer listing.
pub const DEFAULT_LIST_LIMIT: u32 = 200;

/// The storage trait defining all ledger operations.
///
/// This trait abstracts the storage layer so the HTTP service does not depend
/// on a particular database.
#[async_trait]
pub trait Store: Send + Sync {
    // =========================================================================
    // Config Operations
    // =========================================================================

    /// Read the program rules, falling back to defaults for missing or
    /// unusable rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn get_config(&self) -> Result<LoyaltyConfig>;

    /// Replace both program rules in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` if either value is not positive.
    async fn set_config(&self, config: &LoyaltyConfig) -> Result<()>;

    /// Insert the given rules only where no row exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn seed_config(&self, defaults: &LoyaltyConfig) -> Result<()>;

    // =========================================================================
    // Customer Operations
    // =========================================================================

    /// Register a customer, or update the one already holding the phone.
    ///
    /// Updates change the name (when non-empty) and e-mail (when given) and
    /// never touch stamps or lifetime spend.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` if a new customer would have no name.
    async fn upsert_customer(&self, input: &CustomerInput) -> Result<(Customer, UpsertOutcome)>;

    /// Get a customer by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn get_customer(&self, customer_id: CustomerId) -> Result<Option<Customer>>;

    /// Find the customer with exactly this phone.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn find_customer_by_phone(&self, phone: &str) -> Result<Option<Customer>>;

    /// Customers whose name contains `query`, alphabetically, at most
    /// [`SEARCH_LIMIT`]. A blank query matches nobody.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn search_customers_by_name(&self, query: &str) -> Result<Vec<Customer>>;

    /// Most recently registered customers first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_customers(&self, limit: u32) -> Result<Vec<Customer>>;

    /// Delete a customer and, by cascade, their transactions.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the customer doesn't exist.
    async fn delete_customer(&self, customer_id: CustomerId) -> Result<()>;

    // =========================================================================
    // Transaction Operations
    // =========================================================================

    /// List a customer's transactions, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_transactions(
        &self,
        customer_id: CustomerId,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<StampTransaction>>;

    // =========================================================================
    // Compound Operations
    // =========================================================================

    /// Credit the stamps earned by a purchase and log it atomically.
    ///
    /// The rate is read under the same write lock as the balance change.
    ///
    /// # Errors
    ///
    /// - `StoreError::Validation` if the amount is negative.
    /// - `StoreError::NotFound` if the customer doesn't exist.
    async fn record_purchase(
        &self,
        customer_id: CustomerId,
        amount_cents: i64,
    ) -> Result<PurchaseOutcome>;

    /// Spend `stamps_needed` stamps on a reward and log it atomically.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the customer doesn't exist.
    /// - `StoreError::InsufficientStamps` if the balance is below the
    ///   threshold. Nothing is written.
    async fn redeem(&self, customer_id: CustomerId) -> Result<RedeemOutcome>;

    /// Apply a manual stamp correction and log it atomically.
    ///
    /// # Errors
    ///
    /// - `StoreError::Validation` if `delta` is zero or larger in magnitude
    ///   than [`stampcard_core::rules::MAX_ADJUSTMENT`].
    /// - `StoreError::NotFound` if the customer doesn't exist.
    /// - `StoreError::InsufficientStamps` if the balance would go negative.
    async fn adjust_stamps(
        &self,
        customer_id: CustomerId,
        delta: i64,
        note: Option<&str>,
    ) -> Result<AdjustOutcome>;

    // =========================================================================
    // Reporting
    // =========================================================================

    /// Program-wide totals. Zeros on an empty ledger.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn stats(&self) -> Result<LedgerStats>;

    /// Customers whose balance differs from the sum of their transactions.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn audit_balances(&self) -> Result<Vec<BalanceDiscrepancy>>;
}
