//! SQLite storage implementation.
//!
//! This module provides the `SqliteStore` implementation of the `Store` trait.
//!
//! Every mutation opens its transaction with an `UPDATE ... RETURNING`, so
//! SQLite's write lock is held before the program rules are read or any
//! decision is taken. No other writer can change a balance or the rules until
//! the transaction ends.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePool, SqlitePoolOptions,
    SqliteSynchronous,
};

use stampcard_core::{
    rules, AdjustOutcome, BalanceDiscrepancy, Customer, CustomerId, CustomerInput, LedgerStats,
    LoyaltyConfig, NewTransaction, PurchaseOutcome, RedeemOutcome, StampTransaction,
    TransactionId, UpsertOutcome,
};

use crate::error::{Result, StoreError};
use crate::rows::{self, CustomerRow, TransactionRow};
use crate::schema::MIGRATOR;
use crate::{Store, SEARCH_LIMIT};

/// How long a writer waits for SQLite's write lock before failing.
const BUSY_TIMEOUT_SECS: u64 = 5;

const CUSTOMER_COLUMNS: &str =
    "id, name, phone, email, stamps, total_purchases_cents, created_at";

/// SQLite-backed storage implementation.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open or create the database at `url` and run pending migrations.
    ///
    /// `url` takes the `sqlite://path/to/file.db` form. The parent directory
    /// is created if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(BUSY_TIMEOUT_SECS));

        if let Some(parent) = options.get_filename().parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;

        tracing::debug!(url = %url, max_connections, "SqliteStore connected");
        Self::from_pool(pool).await
    }

    /// Open a private in-memory database (for tests and demos).
    ///
    /// The pool holds a single connection that never expires, since every
    /// in-memory connection is its own database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created or migrated.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    /// Wrap an existing pool, running pending migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if a migration fails.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        MIGRATOR.run(&pool).await?;
        Ok(Self { pool })
    }

    /// The underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the connection pool gracefully.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::debug!("SQLite pool closed");
    }
}

async fn update_by_phone(
    conn: &mut SqliteConnection,
    input: &CustomerInput,
    phone: &str,
) -> Result<Option<Customer>> {
    let sql = format!(
        "UPDATE customers
         SET name = COALESCE(NULLIF(?, ''), name), email = COALESCE(?, email)
         WHERE phone = ?
         RETURNING {CUSTOMER_COLUMNS}"
    );
    let row: Option<CustomerRow> = sqlx::query_as(&sql)
        .bind(&input.name)
        .bind(input.email.as_deref())
        .bind(phone)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(row.map(Customer::from))
}

async fn insert_customer(conn: &mut SqliteConnection, input: &CustomerInput) -> Result<Customer> {
    let sql = format!(
        "INSERT INTO customers (name, phone, email, created_at)
         VALUES (?, ?, ?, ?)
         RETURNING {CUSTOMER_COLUMNS}"
    );
    let row: CustomerRow = sqlx::query_as(&sql)
        .bind(&input.name)
        .bind(input.phone.as_deref())
        .bind(input.email.as_deref())
        .bind(chrono::Utc::now())
        .fetch_one(&mut *conn)
        .await?;

    Ok(row.into())
}

async fn insert_transaction(
    conn: &mut SqliteConnection,
    transaction: &NewTransaction,
) -> Result<TransactionId> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO transactions (customer_id, amount_cents, stamps_added, type, note, ts)
         VALUES (?, ?, ?, ?, ?, ?)
         RETURNING id",
    )
    .bind(transaction.customer_id.get())
    .bind(transaction.amount_cents)
    .bind(transaction.stamps_added)
    .bind(transaction.transaction_type.as_str())
    .bind(transaction.note.as_deref())
    .bind(transaction.ts)
    .fetch_one(&mut *conn)
    .await?;

    Ok(TransactionId::new(id))
}

/// Program rules, read on the given connection.
async fn read_config(conn: &mut SqliteConnection) -> Result<LoyaltyConfig> {
    let entries: Vec<(String, String)> = sqlx::query_as("SELECT key, value FROM config")
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows::config_from_entries(entries))
}

/// Current balance, read inside the caller's transaction.
async fn current_stamps(
    conn: &mut SqliteConnection,
    customer_id: CustomerId,
) -> Result<Option<i64>> {
    let stamps = sqlx::query_scalar("SELECT stamps FROM customers WHERE id = ?")
        .bind(customer_id.get())
        .fetch_optional(&mut *conn)
        .await?;
    Ok(stamps)
}

#[async_trait]
impl Store for SqliteStore {
    // =========================================================================
    // Config Operations
    // =========================================================================

    async fn get_config(&self) -> Result<LoyaltyConfig> {
        let mut conn = self.pool.acquire().await?;
        read_config(&mut conn).await
    }

    async fn set_config(&self, config: &LoyaltyConfig) -> Result<()> {
        let config = LoyaltyConfig::new(config.stamps_needed, config.cents_per_stamp)?;

        let mut tx = self.pool.begin().await?;
        for (key, value) in config.to_entries() {
            sqlx::query(
                "INSERT INTO config (key, value) VALUES (?, ?)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            )
            .bind(key)
            .bind(value)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(())
    }

    async fn seed_config(&self, defaults: &LoyaltyConfig) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for (key, value) in defaults.to_entries() {
            sqlx::query("INSERT INTO config (key, value) VALUES (?, ?) ON CONFLICT(key) DO NOTHING")
                .bind(key)
                .bind(value)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        Ok(())
    }

    // =========================================================================
    // Customer Operations
    // =========================================================================

    async fn upsert_customer(&self, input: &CustomerInput) -> Result<(Customer, UpsertOutcome)> {
        let mut tx = self.pool.begin().await?;

        // The lookup is the UPDATE itself: it takes the write lock even when no
        // row matches, so no other session can register the phone before the
        // insert below.
        if let Some(phone) = input.phone.as_deref() {
            if let Some(customer) = update_by_phone(&mut tx, input, phone).await? {
                tx.commit().await?;
                return Ok((customer, UpsertOutcome::Updated));
            }
        }

        if !input.has_name() {
            return Err(StoreError::Validation("name is required".into()));
        }

        let customer = insert_customer(&mut tx, input).await?;
        tx.commit().await?;

        Ok((customer, UpsertOutcome::Created))
    }

    async fn get_customer(&self, customer_id: CustomerId) -> Result<Option<Customer>> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?");
        let row: Option<CustomerRow> = sqlx::query_as(&sql)
            .bind(customer_id.get())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Customer::from))
    }

    async fn find_customer_by_phone(&self, phone: &str) -> Result<Option<Customer>> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE phone = ?");
        let row: Option<CustomerRow> = sqlx::query_as(&sql)
            .bind(phone.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Customer::from))
    }

    async fn search_customers_by_name(&self, query: &str) -> Result<Vec<Customer>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers
             WHERE name LIKE ? ESCAPE '\\'
             ORDER BY name COLLATE NOCASE, id
             LIMIT ?"
        );
        let pattern = format!("%{}%", rows::escape_like(query));
        let rows: Vec<CustomerRow> = sqlx::query_as(&sql)
            .bind(pattern)
            .bind(SEARCH_LIMIT)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Customer::from).collect())
    }

    async fn list_customers(&self, limit: u32) -> Result<Vec<Customer>> {
        let sql = format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers
             ORDER BY created_at DESC, id DESC
             LIMIT ?"
        );
        let rows: Vec<CustomerRow> = sqlx::query_as(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Customer::from).collect())
    }

    async fn delete_customer(&self, customer_id: CustomerId) -> Result<()> {
        let result = sqlx::query("DELETE FROM customers WHERE id = ?")
            .bind(customer_id.get())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::customer_not_found(customer_id));
        }
        Ok(())
    }

    // =========================================================================
    // Transaction Operations
    // =========================================================================

    async fn list_transactions(
        &self,
        customer_id: CustomerId,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<StampTransaction>> {
        let rows: Vec<TransactionRow> = sqlx::query_as(
            "SELECT id, customer_id, amount_cents, stamps_added, type, note, ts
             FROM transactions
             WHERE customer_id = ?
             ORDER BY ts DESC, id DESC
             LIMIT ? OFFSET ?",
        )
        .bind(customer_id.get())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(StampTransaction::try_from).collect()
    }

    // =========================================================================
    // Compound Operations
    // =========================================================================

    async fn record_purchase(
        &self,
        customer_id: CustomerId,
        amount_cents: i64,
    ) -> Result<PurchaseOutcome> {
        if amount_cents < 0 {
            return Err(StoreError::Validation("amount must not be negative".into()));
        }

        let mut tx = self.pool.begin().await?;

        let before: Option<i64> = sqlx::query_scalar(
            "UPDATE customers
             SET total_purchases_cents = total_purchases_cents + ?
             WHERE id = ?
             RETURNING stamps",
        )
        .bind(amount_cents)
        .bind(customer_id.get())
        .fetch_optional(&mut *tx)
        .await?;

        if before.is_none() {
            return Err(StoreError::customer_not_found(customer_id));
        }

        let config = read_config(&mut tx).await?;
        let stamps_earned = rules::stamps_for_amount(amount_cents, config.cents_per_stamp);

        let balance: i64 = sqlx::query_scalar(
            "UPDATE customers SET stamps = stamps + ? WHERE id = ? RETURNING stamps",
        )
        .bind(stamps_earned)
        .bind(customer_id.get())
        .fetch_one(&mut *tx)
        .await?;

        let transaction = NewTransaction::purchase(customer_id, amount_cents, stamps_earned);
        let transaction_id = insert_transaction(&mut tx, &transaction).await?;

        tx.commit().await?;

        Ok(PurchaseOutcome::new(
            transaction_id,
            stamps_earned,
            balance,
            &config,
        ))
    }

    async fn redeem(&self, customer_id: CustomerId) -> Result<RedeemOutcome> {
        let mut tx = self.pool.begin().await?;

        // No-op write: locks the ledger and reports the current balance.
        let current: Option<i64> = sqlx::query_scalar(
            "UPDATE customers SET stamps = stamps WHERE id = ? RETURNING stamps",
        )
        .bind(customer_id.get())
        .fetch_optional(&mut *tx)
        .await?;

        let current = current.ok_or_else(|| StoreError::customer_not_found(customer_id))?;

        let required = read_config(&mut tx).await?.stamps_needed;
        if current < required {
            return Err(StoreError::InsufficientStamps {
                balance: current,
                required,
            });
        }

        let balance: i64 = sqlx::query_scalar(
            "UPDATE customers SET stamps = stamps - ? WHERE id = ? RETURNING stamps",
        )
        .bind(required)
        .bind(customer_id.get())
        .fetch_one(&mut *tx)
        .await?;

        let transaction = NewTransaction::redeem(customer_id, required);
        let transaction_id = insert_transaction(&mut tx, &transaction).await?;

        tx.commit().await?;

        Ok(RedeemOutcome {
            transaction_id,
            stamps_spent: required,
            balance,
        })
    }

    async fn adjust_stamps(
        &self,
        customer_id: CustomerId,
        delta: i64,
        note: Option<&str>,
    ) -> Result<AdjustOutcome> {
        if delta == 0 {
            return Err(StoreError::Validation("adjustment must not be zero".into()));
        }
        if delta.unsigned_abs() > rules::MAX_ADJUSTMENT.unsigned_abs() {
            return Err(StoreError::Validation(format!(
                "adjustment must not exceed {} stamps",
                rules::MAX_ADJUSTMENT
            )));
        }

        let mut tx = self.pool.begin().await?;

        let balance: Option<i64> = sqlx::query_scalar(
            "UPDATE customers
             SET stamps = stamps + ?
             WHERE id = ? AND stamps + ? >= 0
             RETURNING stamps",
        )
        .bind(delta)
        .bind(customer_id.get())
        .bind(delta)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(balance) = balance else {
            return Err(match current_stamps(&mut tx, customer_id).await? {
                None => StoreError::customer_not_found(customer_id),
                Some(balance) => StoreError::InsufficientStamps {
                    balance,
                    required: -delta,
                },
            });
        };

        let note = note.map(str::trim).filter(|n| !n.is_empty()).map(String::from);
        let transaction = NewTransaction::adjust(customer_id, delta, note);
        let transaction_id = insert_transaction(&mut tx, &transaction).await?;

        tx.commit().await?;

        Ok(AdjustOutcome {
            transaction_id,
            stamps_added: delta,
            balance,
        })
    }

    // =========================================================================
    // Reporting
    // =========================================================================

    async fn stats(&self) -> Result<LedgerStats> {
        let (total_customers, total_stamps, total_revenue_cents, rewards_redeemed, purchases): (
            i64,
            i64,
            i64,
            i64,
            i64,
        ) = sqlx::query_as(
            "SELECT
                (SELECT COUNT(*) FROM customers),
                (SELECT COALESCE(SUM(stamps), 0) FROM customers),
                (SELECT COALESCE(SUM(total_purchases_cents), 0) FROM customers),
                (SELECT COUNT(*) FROM transactions WHERE type = 'redeem'),
                (SELECT COUNT(*) FROM transactions WHERE type = 'purchase')",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(LedgerStats {
            total_customers,
            total_stamps,
            total_revenue_cents,
            rewards_redeemed,
            purchases,
        })
    }

    async fn audit_balances(&self) -> Result<Vec<BalanceDiscrepancy>> {
        let rows: Vec<(i64, i64, i64)> = sqlx::query_as(
            "SELECT c.id, c.stamps, COALESCE(SUM(t.stamps_added), 0) AS ledger_stamps
             FROM customers c
             LEFT JOIN transactions t ON t.customer_id = c.id
             GROUP BY c.id, c.stamps
             HAVING c.stamps <> COALESCE(SUM(t.stamps_added), 0)
             ORDER BY c.id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, stamps, ledger_stamps)| BalanceDiscrepancy {
                customer_id: CustomerId::new(id),
                stamps,
                ledger_stamps,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::all_tables;
    use stampcard_core::TransactionType;

    async fn create_test_store() -> SqliteStore {
        let store = SqliteStore::in_memory().await.unwrap();
        store.seed_config(&LoyaltyConfig::default()).await.unwrap();
        store
    }

    async fn register(store: &SqliteStore, name: &str, phone: &str) -> Customer {
        let input = CustomerInput::new(name, Some(phone), None);
        store.upsert_customer(&input).await.unwrap().0
    }

    async fn assert_ledger_consistent(store: &SqliteStore) {
        assert_eq!(store.audit_balances().await.unwrap(), Vec::new());
    }

    /// File-backed store with several connections, for concurrency tests.
    async fn create_file_store(dir: &tempfile::TempDir) -> SqliteStore {
        let url = format!("sqlite://{}", dir.path().join("ledger.db").display());
        let store = SqliteStore::connect(&url, 4).await.unwrap();
        store.seed_config(&LoyaltyConfig::default()).await.unwrap();
        store
    }

    /// Holds the write lock with an uncommitted rules change, commits it after
    /// `op` has started, and returns what `op` produced.
    async fn run_during_config_change<T, F>(
        store: &SqliteStore,
        key: &str,
        value: &str,
        op: F,
    ) -> T
    where
        T: Send + 'static,
        F: std::future::Future<Output = T> + Send + 'static,
    {
        let mut blocker = store.pool().begin().await.unwrap();
        sqlx::query("UPDATE config SET value = ? WHERE key = ?")
            .bind(value)
            .bind(key)
            .execute(&mut *blocker)
            .await
            .unwrap();

        let handle = tokio::spawn(op);
        tokio::time::sleep(Duration::from_millis(100)).await;
        blocker.commit().await.unwrap();

        handle.await.unwrap()
    }

    #[tokio::test]
    async fn migrations_create_all_tables() {
        let store = create_test_store().await;
        let names: Vec<String> =
            sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table'")
                .fetch_all(store.pool())
                .await
                .unwrap();

        for table in all_tables() {
            assert!(names.iter().any(|n| n == table), "missing table {table}");
        }
    }

    // =========================================================================
    // Config
    // =========================================================================

    #[tokio::test]
    async fn config_seeded_with_defaults() {
        let store = create_test_store().await;
        assert_eq!(store.get_config().await.unwrap(), LoyaltyConfig::default());
    }

    #[tokio::test]
    async fn seeding_does_not_overwrite() {
        let store = create_test_store().await;
        let custom = LoyaltyConfig::new(12, 5000).unwrap();
        store.set_config(&custom).await.unwrap();

        store.seed_config(&LoyaltyConfig::default()).await.unwrap();
        assert_eq!(store.get_config().await.unwrap(), custom);
    }

    #[tokio::test]
    async fn missing_rows_read_as_defaults() {
        let store = SqliteStore::in_memory().await.unwrap();
        assert_eq!(store.get_config().await.unwrap(), LoyaltyConfig::default());
    }

    #[tokio::test]
    async fn set_config_rejects_non_positive_and_keeps_old_values() {
        let store = create_test_store().await;
        let invalid = LoyaltyConfig {
            stamps_needed: 0,
            cents_per_stamp: 5000,
        };

        let result = store.set_config(&invalid).await;
        assert!(matches!(result, Err(StoreError::Validation(_))));
        assert_eq!(store.get_config().await.unwrap(), LoyaltyConfig::default());
    }

    // =========================================================================
    // Customers
    // =========================================================================

    #[tokio::test]
    async fn upsert_creates_new_customer() {
        let store = create_test_store().await;
        let input = CustomerInput::new("Ana", Some("91999999999"), Some("ana@cafe.com"));

        let (customer, outcome) = store.upsert_customer(&input).await.unwrap();
        assert_eq!(outcome, UpsertOutcome::Created);
        assert_eq!(customer.name, "Ana");
        assert_eq!(customer.stamps, 0);
        assert_eq!(customer.total_purchases_cents, 0);
        assert_eq!(customer.email.as_deref(), Some("ana@cafe.com"));
    }

    #[tokio::test]
    async fn upsert_same_phone_updates_in_place() {
        let store = create_test_store().await;
        let first = register(&store, "Ana", "91999999999").await;
        store.record_purchase(first.id, 3000).await.unwrap();

        let input = CustomerInput::new("Ana Maria", Some("91999999999"), None);
        let (updated, outcome) = store.upsert_customer(&input).await.unwrap();

        assert_eq!(outcome, UpsertOutcome::Updated);
        assert_eq!(updated.id, first.id);
        assert_eq!(updated.name, "Ana Maria");
        assert_eq!(updated.stamps, 3);
        assert_eq!(updated.total_purchases_cents, 3000);
        assert_eq!(store.stats().await.unwrap().total_customers, 1);
    }

    #[tokio::test]
    async fn upsert_keeps_name_and_email_when_not_given() {
        let store = create_test_store().await;
        let input = CustomerInput::new("Ana", Some("91999999999"), Some("ana@cafe.com"));
        store.upsert_customer(&input).await.unwrap();

        let input = CustomerInput::new("", Some("91999999999"), None);
        let (customer, outcome) = store.upsert_customer(&input).await.unwrap();
        assert_eq!(outcome, UpsertOutcome::Updated);
        assert_eq!(customer.name, "Ana");
        assert_eq!(customer.email.as_deref(), Some("ana@cafe.com"));
    }

    #[tokio::test]
    async fn customers_without_phone_are_always_new() {
        let store = create_test_store().await;
        let input = CustomerInput::new("Walk-in", None, None);

        let (a, _) = store.upsert_customer(&input).await.unwrap();
        let (b, _) = store.upsert_customer(&input).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.stats().await.unwrap().total_customers, 2);
    }

    #[tokio::test]
    async fn new_customer_requires_name() {
        let store = create_test_store().await;
        let input = CustomerInput::new("  ", Some("91999999999"), None);

        let result = store.upsert_customer(&input).await;
        assert!(matches!(result, Err(StoreError::Validation(_))));
        assert_eq!(store.stats().await.unwrap().total_customers, 0);
    }

    #[tokio::test]
    async fn concurrent_upserts_of_one_phone_create_one_customer() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = create_file_store(&dir).await;
        let first = CustomerInput::new("Ana", Some("91999999999"), None);
        let second = CustomerInput::new("Ana Maria", Some("91999999999"), None);

        let (a, b) = tokio::join!(store.upsert_customer(&first), store.upsert_customer(&second));
        let (a, a_outcome) = a.unwrap();
        let (b, b_outcome) = b.unwrap();

        assert_eq!(a.id, b.id);
        let mut outcomes = vec![a_outcome, b_outcome];
        outcomes.sort_by_key(|o| *o == UpsertOutcome::Updated);
        assert_eq!(outcomes, vec![UpsertOutcome::Created, UpsertOutcome::Updated]);
        assert_eq!(store.stats().await.unwrap().total_customers, 1);
        store.close().await;
    }

    #[tokio::test]
    async fn find_by_phone_is_exact() {
        let store = create_test_store().await;
        let ana = register(&store, "Ana", "91999999999").await;

        let found = store.find_customer_by_phone("91999999999").await.unwrap();
        assert_eq!(found.map(|c| c.id), Some(ana.id));
        assert!(store
            .find_customer_by_phone("9199999999")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn name_search_is_alphabetical_and_literal() {
        let store = create_test_store().await;
        register(&store, "Mariana", "1").await;
        register(&store, "Ana", "2").await;
        register(&store, "Bruno", "3").await;
        register(&store, "100% Ana", "4").await;

        let names: Vec<String> = store
            .search_customers_by_name("ana")
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["100% Ana", "Ana", "Mariana"]);

        let literal = store.search_customers_by_name("0% A").await.unwrap();
        assert_eq!(literal.len(), 1);
        assert!(store.search_customers_by_name("%").await.unwrap().len() == 1);
    }

    #[tokio::test]
    async fn name_search_is_capped() {
        let store = create_test_store().await;
        for i in 0..60 {
            register(&store, &format!("Cliente {i:02}"), &format!("phone-{i}")).await;
        }
        let found = store.search_customers_by_name("Cliente").await.unwrap();
        assert_eq!(found.len(), SEARCH_LIMIT as usize);
    }

    #[tokio::test]
    async fn blank_name_search_finds_nothing() {
        let store = create_test_store().await;
        register(&store, "Ana", "1").await;
        register(&store, "Bruno", "2").await;

        assert!(store.search_customers_by_name("").await.unwrap().is_empty());
        assert!(store.search_customers_by_name("   ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_is_newest_first_and_limited() {
        let store = create_test_store().await;
        let first = register(&store, "First", "1").await;
        let second = register(&store, "Second", "2").await;
        let third = register(&store, "Third", "3").await;

        let listed: Vec<CustomerId> = store
            .list_customers(2)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(listed, vec![third.id, second.id]);
        assert!(!listed.contains(&first.id));
    }

    #[tokio::test]
    async fn delete_cascades_transactions() {
        let store = create_test_store().await;
        let ana = register(&store, "Ana", "91999999999").await;
        store.record_purchase(ana.id, 5000).await.unwrap();

        store.delete_customer(ana.id).await.unwrap();
        assert!(store.get_customer(ana.id).await.unwrap().is_none());
        assert!(store
            .list_transactions(ana.id, 10, 0)
            .await
            .unwrap()
            .is_empty());
        assert!(matches!(
            store.delete_customer(ana.id).await,
            Err(StoreError::NotFound { .. })
        ));
    }

    // =========================================================================
    // Purchases
    // =========================================================================

    #[tokio::test]
    async fn purchase_earns_floored_stamps() {
        let store = create_test_store().await;
        store
            .set_config(&LoyaltyConfig::new(10, 5000).unwrap())
            .await
            .unwrap();
        let ana = register(&store, "Ana", "91999999999").await;

        let outcome = store.record_purchase(ana.id, 27_500).await.unwrap();
        assert_eq!(outcome.stamps_earned, 5);
        assert_eq!(outcome.balance, 5);
        assert_eq!(outcome.stamps_needed, 10);
        assert!(!outcome.became_eligible);

        let customer = store.get_customer(ana.id).await.unwrap().unwrap();
        assert_eq!(customer.stamps, 5);
        assert_eq!(customer.total_purchases_cents, 27_500);

        let transactions = store.list_transactions(ana.id, 10, 0).await.unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].id, outcome.transaction_id);
        assert_eq!(transactions[0].transaction_type, TransactionType::Purchase);
        assert_eq!(transactions[0].amount_cents, 27_500);
        assert_eq!(transactions[0].stamps_added, 5);
    }

    #[tokio::test]
    async fn purchase_signals_threshold_crossing_once() {
        let store = create_test_store().await;
        let ana = register(&store, "Ana", "91999999999").await;

        let outcome = store.record_purchase(ana.id, 8000).await.unwrap();
        assert_eq!(outcome.balance, 8);
        assert!(!outcome.became_eligible);

        let outcome = store.record_purchase(ana.id, 3000).await.unwrap();
        assert_eq!(outcome.balance, 11);
        assert!(outcome.became_eligible);

        let outcome = store.record_purchase(ana.id, 2000).await.unwrap();
        assert_eq!(outcome.balance, 13);
        assert!(!outcome.became_eligible);
    }

    #[tokio::test]
    async fn zero_purchase_is_logged_without_stamps() {
        let store = create_test_store().await;
        let ana = register(&store, "Ana", "91999999999").await;
        store.adjust_stamps(ana.id, 9, None).await.unwrap();

        let outcome = store.record_purchase(ana.id, 0).await.unwrap();
        assert_eq!(outcome.stamps_earned, 0);
        assert_eq!(outcome.balance, 9);
        assert!(!outcome.became_eligible);
        assert_eq!(store.stats().await.unwrap().purchases, 1);
    }

    #[tokio::test]
    async fn non_positive_stored_rate_earns_nothing() {
        let store = create_test_store().await;
        sqlx::query("UPDATE config SET value = '0' WHERE key = 'reais_per_stamp'")
            .execute(store.pool())
            .await
            .unwrap();
        let ana = register(&store, "Ana", "91999999999").await;

        let outcome = store.record_purchase(ana.id, 50_000).await.unwrap();
        assert_eq!(outcome.stamps_earned, 0);
        let customer = store.get_customer(ana.id).await.unwrap().unwrap();
        assert_eq!(customer.total_purchases_cents, 50_000);
    }

    #[tokio::test]
    async fn purchase_for_unknown_customer_writes_nothing() {
        let store = create_test_store().await;
        let result = store.record_purchase(CustomerId::new(999), 5000).await;

        assert!(matches!(result, Err(StoreError::NotFound { .. })));
        assert_eq!(store.stats().await.unwrap(), LedgerStats::default());
    }

    #[tokio::test]
    async fn negative_purchase_is_rejected() {
        let store = create_test_store().await;
        let ana = register(&store, "Ana", "91999999999").await;

        let result = store.record_purchase(ana.id, -100).await;
        assert!(matches!(result, Err(StoreError::Validation(_))));
        assert!(store
            .list_transactions(ana.id, 10, 0)
            .await
            .unwrap()
            .is_empty());
    }

    // =========================================================================
    // Redemptions
    // =========================================================================

    #[tokio::test]
    async fn redeem_spends_threshold() {
        let store = create_test_store().await;
        let ana = register(&store, "Ana", "91999999999").await;
        store.record_purchase(ana.id, 13_000).await.unwrap();

        let outcome = store.redeem(ana.id).await.unwrap();
        assert_eq!(outcome.stamps_spent, 10);
        assert_eq!(outcome.balance, 3);

        let transactions = store.list_transactions(ana.id, 10, 0).await.unwrap();
        assert_eq!(transactions[0].id, outcome.transaction_id);
        assert_eq!(transactions[0].transaction_type, TransactionType::Redeem);
        assert_eq!(transactions[0].stamps_added, -10);
        assert_eq!(transactions[0].amount_cents, 0);
        assert_eq!(
            transactions[0].note.as_deref(),
            Some(stampcard_core::REDEEM_NOTE)
        );
        assert_ledger_consistent(&store).await;
    }

    #[tokio::test]
    async fn redeem_below_threshold_changes_nothing() {
        let store = create_test_store().await;
        let ana = register(&store, "Ana", "91999999999").await;
        store.record_purchase(ana.id, 9000).await.unwrap();

        let result = store.redeem(ana.id).await;
        assert!(matches!(
            result,
            Err(StoreError::InsufficientStamps {
                balance: 9,
                required: 10
            })
        ));

        let customer = store.get_customer(ana.id).await.unwrap().unwrap();
        assert_eq!(customer.stamps, 9);
        assert_eq!(store.stats().await.unwrap().rewards_redeemed, 0);
    }

    #[tokio::test]
    async fn redeem_unknown_customer() {
        let store = create_test_store().await;
        assert!(matches!(
            store.redeem(CustomerId::new(42)).await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn concurrent_redemptions_cannot_overdraw() {
        let dir = tempfile::TempDir::new().unwrap();
        let url = format!("sqlite://{}", dir.path().join("ledger.db").display());
        let store = SqliteStore::connect(&url, 4).await.unwrap();
        store.seed_config(&LoyaltyConfig::default()).await.unwrap();
        let ana = register(&store, "Ana", "91999999999").await;
        store.record_purchase(ana.id, 10_000).await.unwrap();

        let (a, b) = tokio::join!(store.redeem(ana.id), store.redeem(ana.id));
        let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
        assert_eq!(successes, 1);

        let customer = store.get_customer(ana.id).await.unwrap().unwrap();
        assert_eq!(customer.stamps, 0);
        assert_ledger_consistent(&store).await;
        store.close().await;
    }

    #[tokio::test]
    async fn redeem_uses_threshold_committed_while_waiting() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = create_file_store(&dir).await;
        let ana = register(&store, "Ana", "91999999999").await;
        store.adjust_stamps(ana.id, 12, None).await.unwrap();

        let redeemer = store.clone();
        let outcome = run_during_config_change(&store, "stamps_needed", "5", async move {
            redeemer.redeem(ana.id).await
        })
        .await
        .unwrap();

        assert_eq!(outcome.stamps_spent, 5);
        assert_eq!(outcome.balance, 7);
        assert_ledger_consistent(&store).await;
        store.close().await;
    }

    #[tokio::test]
    async fn purchase_uses_rate_committed_while_waiting() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = create_file_store(&dir).await;
        let ana = register(&store, "Ana", "91999999999").await;

        let buyer = store.clone();
        let outcome = run_during_config_change(&store, "reais_per_stamp", "5.00", async move {
            buyer.record_purchase(ana.id, 2_000).await
        })
        .await
        .unwrap();

        assert_eq!(outcome.stamps_earned, 4);
        assert_eq!(outcome.balance, 4);
        assert_ledger_consistent(&store).await;
        store.close().await;
    }

    // =========================================================================
    // Adjustments
    // =========================================================================

    #[tokio::test]
    async fn adjust_applies_signed_delta() {
        let store = create_test_store().await;
        let ana = register(&store, "Ana", "91999999999").await;

        let outcome = store
            .adjust_stamps(ana.id, 4, Some("paper card migration"))
            .await
            .unwrap();
        assert_eq!(outcome.balance, 4);

        let outcome = store.adjust_stamps(ana.id, -1, None).await.unwrap();
        assert_eq!(outcome.balance, 3);

        let transactions = store.list_transactions(ana.id, 10, 0).await.unwrap();
        assert_eq!(transactions.len(), 2);
        assert_eq!(transactions[1].transaction_type, TransactionType::Adjust);
        assert_eq!(transactions[1].note.as_deref(), Some("paper card migration"));
        assert_ledger_consistent(&store).await;
    }

    #[tokio::test]
    async fn adjust_cannot_go_negative_or_be_zero() {
        let store = create_test_store().await;
        let ana = register(&store, "Ana", "91999999999").await;
        store.adjust_stamps(ana.id, 2, None).await.unwrap();

        assert!(matches!(
            store.adjust_stamps(ana.id, -3, None).await,
            Err(StoreError::InsufficientStamps {
                balance: 2,
                required: 3
            })
        ));
        assert!(matches!(
            store.adjust_stamps(ana.id, 0, None).await,
            Err(StoreError::Validation(_))
        ));
        assert_eq!(store.get_customer(ana.id).await.unwrap().unwrap().stamps, 2);
    }

    #[tokio::test]
    async fn adjust_rejects_out_of_range_deltas() {
        let store = create_test_store().await;
        let ana = register(&store, "Ana", "91999999999").await;
        store.adjust_stamps(ana.id, 2, None).await.unwrap();

        for delta in [i64::MIN, i64::MAX, rules::MAX_ADJUSTMENT + 1, -rules::MAX_ADJUSTMENT - 1] {
            assert!(
                matches!(
                    store.adjust_stamps(ana.id, delta, None).await,
                    Err(StoreError::Validation(_))
                ),
                "delta {delta} accepted"
            );
        }
        assert!(matches!(
            store.adjust_stamps(ana.id, -rules::MAX_ADJUSTMENT, None).await,
            Err(StoreError::InsufficientStamps { balance: 2, required }) if required == rules::MAX_ADJUSTMENT
        ));
        assert_eq!(store.get_customer(ana.id).await.unwrap().unwrap().stamps, 2);
        assert_eq!(store.list_transactions(ana.id, 10, 0).await.unwrap().len(), 1);
    }

    // =========================================================================
    // Reporting
    // =========================================================================

    #[tokio::test]
    async fn stats_on_empty_ledger_are_zero() {
        let store = create_test_store().await;
        assert_eq!(store.stats().await.unwrap(), LedgerStats::default());
    }

    #[tokio::test]
    async fn stats_aggregate_both_tables() {
        let store = create_test_store().await;
        let ana = register(&store, "Ana", "1").await;
        let bruno = register(&store, "Bruno", "2").await;
        store.record_purchase(ana.id, 12_000).await.unwrap();
        store.record_purchase(bruno.id, 4_550).await.unwrap();
        store.redeem(ana.id).await.unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_customers, 2);
        assert_eq!(stats.total_stamps, 2 + 4);
        assert_eq!(stats.total_revenue_cents, 16_550);
        assert_eq!(stats.purchases, 2);
        assert_eq!(stats.rewards_redeemed, 1);
    }

    #[tokio::test]
    async fn balances_match_ledger_after_mixed_operations() {
        let store = create_test_store().await;
        let ana = register(&store, "Ana", "1").await;
        let bruno = register(&store, "Bruno", "2").await;

        for amount in [4_500, 12_300, 999, 0, 30_000] {
            store.record_purchase(ana.id, amount).await.unwrap();
            store.record_purchase(bruno.id, amount / 2).await.unwrap();
        }
        while store.redeem(ana.id).await.is_ok() {}
        let _ = store.redeem(bruno.id).await;
        store.adjust_stamps(bruno.id, 1, None).await.unwrap();

        assert_ledger_consistent(&store).await;
        let history = store.list_transactions(ana.id, 100, 0).await.unwrap();
        let replayed: i64 = history.iter().map(|t| t.stamps_added).sum();
        let customer = store.get_customer(ana.id).await.unwrap().unwrap();
        assert_eq!(replayed, customer.stamps);
    }

    #[tokio::test]
    async fn audit_reports_tampered_balances() {
        let store = create_test_store().await;
        let ana = register(&store, "Ana", "1").await;
        store.record_purchase(ana.id, 5000).await.unwrap();

        sqlx::query("UPDATE customers SET stamps = 40 WHERE id = ?")
            .bind(ana.id.get())
            .execute(store.pool())
            .await
            .unwrap();

        let discrepancies = store.audit_balances().await.unwrap();
        assert_eq!(
            discrepancies,
            vec![BalanceDiscrepancy {
                customer_id: ana.id,
                stamps: 40,
                ledger_stamps: 5,
            }]
        );
    }

    #[tokio::test]
    async fn transactions_paginate_newest_first() {
        let store = create_test_store().await;
        let ana = register(&store, "Ana", "1").await;
        let first = store.record_purchase(ana.id, 1000).await.unwrap();
        let second = store.record_purchase(ana.id, 2000).await.unwrap();

        let page1 = store.list_transactions(ana.id, 1, 0).await.unwrap();
        let page2 = store.list_transactions(ana.id, 1, 1).await.unwrap();
        assert_eq!(page1[0].id, second.transaction_id);
        assert_eq!(page2[0].id, first.transaction_id);
    }
}
