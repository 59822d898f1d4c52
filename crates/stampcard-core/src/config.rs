//! Loyalty program rules configuration.
//!
//! The program has exactly two tunables, persisted as text rows of the
//! `config` table under [`STAMPS_NEEDED_KEY`] and [`REAIS_PER_STAMP_KEY`].

use serde::{Deserialize, Serialize};

use crate::error::{LoyaltyError, Result};
use crate::money;

/// Config key holding the number of stamps a reward costs.
pub const STAMPS_NEEDED_KEY: &str = "stamps_needed";

/// Config key holding how many reais earn one stamp (decimal text).
pub const REAIS_PER_STAMP_KEY: &str = "reais_per_stamp";

/// Default number of stamps per reward.
pub const DEFAULT_STAMPS_NEEDED: i64 = 10;

/// Default spend per stamp, in cents (R$ 10,00).
pub const DEFAULT_CENTS_PER_STAMP: i64 = 1000;

/// The loyalty program rules read by every purchase and redemption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoyaltyConfig {
    /// Stamps required to redeem one reward.
    pub stamps_needed: i64,

    /// Purchase amount, in cents, that earns one stamp.
    pub cents_per_stamp: i64,
}

impl Default for LoyaltyConfig {
    fn default() -> Self {
        Self {
            stamps_needed: DEFAULT_STAMPS_NEEDED,
            cents_per_stamp: DEFAULT_CENTS_PER_STAMP,
        }
    }
}

impl LoyaltyConfig {
    /// Build a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns `LoyaltyError::Validation` if either value is not positive.
    pub fn new(stamps_needed: i64, cents_per_stamp: i64) -> Result<Self> {
        if stamps_needed <= 0 {
            return Err(LoyaltyError::validation(
                "stamps_needed must be a positive integer",
            ));
        }
        if cents_per_stamp <= 0 {
            return Err(LoyaltyError::validation(
                "reais_per_stamp must be a positive amount",
            ));
        }
        Ok(Self {
            stamps_needed,
            cents_per_stamp,
        })
    }

    /// Build a validated configuration from a decimal reais rate.
    ///
    /// # Errors
    ///
    /// Returns `LoyaltyError::Validation` if either value is not positive or
    /// the rate is not a finite number.
    pub fn from_reais(stamps_needed: i64, reais_per_stamp: f64) -> Result<Self> {
        let cents_per_stamp = money::reais_to_cents(reais_per_stamp)?;
        Self::new(stamps_needed, cents_per_stamp)
    }

    /// The spend per stamp in decimal reais.
    #[must_use]
    pub fn reais_per_stamp(&self) -> f64 {
        money::cents_to_reais(self.cents_per_stamp)
    }

    /// The text rows persisted for this configuration.
    #[must_use]
    pub fn to_entries(&self) -> [(&'static str, String); 2] {
        [
            (STAMPS_NEEDED_KEY, self.stamps_needed.to_string()),
            (
                REAIS_PER_STAMP_KEY,
                money::format_decimal(self.cents_per_stamp),
            ),
        ]
    }
}

/// Parse a persisted `stamps_needed` value.
///
/// Accepts integer text and, for rows written by older tooling, a decimal
/// such as `"10.0"` whose fraction is zero.
#[must_use]
pub fn parse_stamps_needed(text: &str) -> Option<i64> {
    let text = text.trim();
    if let Ok(value) = text.parse::<i64>() {
        return Some(value);
    }
    let cents = money::parse_reais(text)?;
    (cents % 100 == 0).then_some(cents / 100)
}
