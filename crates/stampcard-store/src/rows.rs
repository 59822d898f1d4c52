//! Row decoding for the SQLite tables.
//!
//! Rows are read into flat structs first and converted to core types, so the
//! column layout stays private to this crate.

use chrono::{DateTime, Utc};

use stampcard_core::config::parse_stamps_needed;
use stampcard_core::{
    money, Customer, CustomerId, LoyaltyConfig, StampTransaction, TransactionId,
    TransactionType, REAIS_PER_STAMP_KEY, STAMPS_NEEDED_KEY,
};

use crate::error::StoreError;

/// A row of `customers`.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct CustomerRow {
    id: i64,
    name: String,
    phone: Option<String>,
    email: Option<String>,
    stamps: i64,
    total_purchases_cents: i64,
    created_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Self {
            id: CustomerId::new(row.id),
            name: row.name,
            phone: row.phone,
            email: row.email,
            stamps: row.stamps,
            total_purchases_cents: row.total_purchases_cents,
            created_at: row.created_at,
        }
    }
}

/// A row of `transactions`.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct TransactionRow {
    id: i64,
    customer_id: i64,
    amount_cents: i64,
    stamps_added: i64,
    #[sqlx(rename = "type")]
    transaction_type: String,
    note: Option<String>,
    ts: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for StampTransaction {
    type Error = StoreError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        let transaction_type: TransactionType = row
            .transaction_type
            .parse()
            .map_err(|e: stampcard_core::UnknownTransactionType| {
                StoreError::Serialization(e.to_string())
            })?;

        Ok(Self {
            id: TransactionId::new(row.id),
            customer_id: CustomerId::new(row.customer_id),
            amount_cents: row.amount_cents,
            stamps_added: row.stamps_added,
            transaction_type,
            note: row.note,
            ts: row.ts,
        })
    }
}

/// Build the program rules from `config` rows.
///
/// Missing keys fall back to defaults. Unparsable values, and a non-positive
/// `stamps_needed`, are logged and replaced by defaults. A non-positive rate
/// is kept: it earns zero stamps rather than failing purchases.
pub(crate) fn config_from_entries(entries: Vec<(String, String)>) -> LoyaltyConfig {
    let mut config = LoyaltyConfig::default();

    for (key, value) in entries {
        match key.as_str() {
            STAMPS_NEEDED_KEY => match parse_stamps_needed(&value) {
                Some(needed) if needed > 0 => config.stamps_needed = needed,
                _ => tracing::warn!(
                    key = %key,
                    value = %value,
                    default = config.stamps_needed,
                    "Unusable config value, using default"
                ),
            },
            REAIS_PER_STAMP_KEY => match money::parse_reais(&value) {
                Some(cents) => config.cents_per_stamp = cents,
                None => tracing::warn!(
                    key = %key,
                    value = %value,
                    default = config.cents_per_stamp,
                    "Unusable config value, using default"
                ),
            },
            _ => {}
        }
    }

    config
}

/// Escape `LIKE` wildcards so the query matches literally (`ESCAPE '\'`).
pub(crate) fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for ch in query.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
