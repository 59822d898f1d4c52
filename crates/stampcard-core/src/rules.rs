//! Stamp accrual and redemption rules.
//!
//! Everything here is pure arithmetic over the [`LoyaltyConfig`] and a stamp
//! balance. The store applies these functions inside its atomic ledger
//! operations.
//!
//! # Example
//!
//! ```
//! use stampcard_core::rules;
//!
//! // R$ 50,00 per stamp, purchase of R$ 275,00
//! assert_eq!(rules::stamps_for_amount(27_500, 5_000), 5);
//!
//! // 8 stamps + 3 crosses a threshold of 10
//! assert!(rules::became_eligible(8, 11, 10));
//! ```

use serde::{Deserialize, Serialize};

use crate::{LoyaltyConfig, TransactionId};

/// Largest stamp count a single manual adjustment may add or remove.
pub const MAX_ADJUSTMENT: i64 = 1_000_000;

/// Stamps earned by a purchase: `floor(amount / rate)`.
///
/// A non-positive rate or amount earns nothing instead of failing.
#[must_use]
pub const fn stamps_for_amount(amount_cents: i64, cents_per_stamp: i64) -> i64 {
    if cents_per_stamp <= 0 || amount_cents <= 0 {
        return 0;
    }
    amount_cents / cents_per_stamp
}

/// Whether a balance meets the reward threshold.
#[must_use]
pub const fn is_eligible(balance: i64, stamps_needed: i64) -> bool {
    balance >= stamps_needed
}

/// Whether moving from `before` to `after` crossed the reward threshold.
///
/// A customer who was already eligible does not become eligible again.
#[must_use]
pub const fn became_eligible(before: i64, after: i64, stamps_needed: i64) -> bool {
    before < stamps_needed && after >= stamps_needed
}

/// Stamps still missing before the next reward, zero once eligible.
#[must_use]
pub fn stamps_until_reward(balance: i64, stamps_needed: i64) -> i64 {
    (stamps_needed - balance).max(0)
}

/// How many rewards the balance could pay for.
#[must_use]
pub fn rewards_available(balance: i64, stamps_needed: i64) -> i64 {
    if stamps_needed <= 0 {
        return 0;
    }
    balance.max(0) / stamps_needed
}

/// Filled and empty slots of a stamp card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardProgress {
    /// Stamped slots, capped at the card size.
    pub filled: i64,

    /// Remaining blank slots.
    pub empty: i64,
}

/// Lay a balance out on a card with `stamps_needed` slots.
#[must_use]
pub fn card_progress(balance: i64, stamps_needed: i64) -> CardProgress {
    let size = stamps_needed.max(0);
    let filled = balance.clamp(0, size);
    CardProgress {
        filled,
        empty: size - filled,
    }
}

/// Result of recording a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOutcome {
    /// The `purchase` transaction that was written.
    pub transaction_id: TransactionId,

    /// Stamps earned by this purchase.
    pub stamps_earned: i64,

    /// Balance after the purchase.
    pub balance: i64,

    /// Threshold in force when the purchase was recorded.
    pub stamps_needed: i64,

    /// True when this purchase moved the customer from not eligible to
    /// eligible.
    pub became_eligible: bool,
}

impl PurchaseOutcome {
    /// Derive the outcome from the post-update balance.
    #[must_use]
    pub fn new(
        transaction_id: TransactionId,
        stamps_earned: i64,
        balance_after: i64,
        config: &LoyaltyConfig,
    ) -> Self {
        let before = balance_after - stamps_earned;
        Self {
            transaction_id,
            stamps_earned,
            balance: balance_after,
            stamps_needed: config.stamps_needed,
            became_eligible: became_eligible(before, balance_after, config.stamps_needed),
        }
    }
}

/// Result of redeeming a reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedeemOutcome {
    /// The `redeem` transaction that was written.
    pub transaction_id: TransactionId,

    /// Stamps spent on the reward.
    pub stamps_spent: i64,

    /// Balance after the redemption.
    pub balance: i64,
}

/// Result of a manual stamp adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustOutcome {
    /// The `adjust` transaction that was written.
    pub transaction_id: TransactionId,

    /// Signed delta that was applied.
    pub stamps_added: i64,

    /// Balance after the adjustment.
    pub balance: i64,
}
