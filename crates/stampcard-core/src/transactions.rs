//! Stamp transaction types for stampcard.
//!
//! Every change to a customer's stamp balance writes exactly one transaction.
//! Transactions are append-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{CustomerId, TransactionId};

/// Note attached to every redemption.
pub const REDEEM_NOTE: &str = "Reward redeemed";

/// A persisted ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StampTransaction {
    /// Database-assigned identifier, increasing with insertion order.
    pub id: TransactionId,

    /// The customer whose balance was affected.
    pub customer_id: CustomerId,

    /// Purchase amount in cents. Zero for non-purchase events.
    pub amount_cents: i64,

    /// Signed stamp delta. Negative for redemptions.
    pub stamps_added: i64,

    /// Type of transaction.
    pub transaction_type: TransactionType,

    /// Free-text note.
    pub note: Option<String>,

    /// When the transaction was written.
    pub ts: DateTime<Utc>,
}

/// A ledger entry about to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    /// The customer whose balance is affected.
    pub customer_id: CustomerId,

    /// Purchase amount in cents.
    pub amount_cents: i64,

    /// Signed stamp delta.
    pub stamps_added: i64,

    /// Type of transaction.
    pub transaction_type: TransactionType,

    /// Free-text note.
    pub note: Option<String>,

    /// Timestamp to record.
    pub ts: DateTime<Utc>,
}

impl NewTransaction {
    /// A purchase earning `stamps` for `amount_cents`.
    #[must_use]
    pub fn purchase(customer_id: CustomerId, amount_cents: i64, stamps: i64) -> Self {
        Self {
            customer_id,
            amount_cents,
            stamps_added: stamps,
            transaction_type: TransactionType::Purchase,
            note: None,
            ts: Utc::now(),
        }
    }

    /// A reward redemption spending `stamps_needed` stamps.
    #[must_use]
    pub fn redeem(customer_id: CustomerId, stamps_needed: i64) -> Self {
        Self {
            customer_id,
            amount_cents: 0,
            stamps_added: -stamps_needed.abs(),
            transaction_type: TransactionType::Redeem,
            note: Some(REDEEM_NOTE.to_string()),
            ts: Utc::now(),
        }
    }

    /// A manual balance correction.
    #[must_use]
    pub fn adjust(customer_id: CustomerId, delta: i64, note: Option<String>) -> Self {
        Self {
            customer_id,
            amount_cents: 0,
            stamps_added: delta,
            transaction_type: TransactionType::Adjust,
            note,
            ts: Utc::now(),
        }
    }
}

/// Type of stamp transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Stamps earned by a purchase.
    Purchase,

    /// Stamps spent on a reward.
    Redeem,

    /// Manual correction by staff.
    Adjust,
}

impl TransactionType {
    /// The value stored in the `type` column.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::Redeem => "redeem",
            Self::Adjust => "adjust",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = UnknownTransactionType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "purchase" => Ok(Self::Purchase),
            "redeem" => Ok(Self::Redeem),
            "adjust" => Ok(Self::Adjust),
            other => Err(UnknownTransactionType(other.to_string())),
        }
    }
}

/// A `type` column value outside the known set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown transaction type: {0}")]
pub struct UnknownTransactionType(pub String);
