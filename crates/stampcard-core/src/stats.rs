//! Aggregate ledger figures.

use serde::{Deserialize, Serialize};

use crate::CustomerId;

/// Program-wide totals. An empty ledger reports all zeros.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStats {
    /// Registered customers.
    pub total_customers: i64,

    /// Sum of all stamp balances.
    pub total_stamps: i64,

    /// Sum of all lifetime spend, in cents.
    pub total_revenue_cents: i64,

    /// Count of `redeem` transactions.
    pub rewards_redeemed: i64,

    /// Count of `purchase` transactions.
    pub purchases: i64,
}

/// A customer whose balance disagrees with their transaction history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceDiscrepancy {
    /// The customer.
    pub customer_id: CustomerId,

    /// The stored balance.
    pub stamps: i64,

    /// Sum of `stamps_added` over the customer's transactions.
    pub ledger_stamps: i64,
}
