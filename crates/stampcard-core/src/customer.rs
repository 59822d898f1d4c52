//! Customer types for stampcard.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::rules::{self, CardProgress};
use crate::{CustomerId, LoyaltyConfig};

/// A loyalty program member.
///
/// The stamp balance always equals the sum of `stamps_added` over the
/// customer's transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Database-assigned identifier.
    pub id: CustomerId,

    /// Display name.
    pub name: String,

    /// Phone number, unique when present. Used to look customers up at the
    /// counter.
    pub phone: Option<String>,

    /// Optional e-mail address.
    pub email: Option<String>,

    /// Current stamp balance.
    pub stamps: i64,

    /// Lifetime spend in cents.
    pub total_purchases_cents: i64,

    /// When the customer was registered.
    pub created_at: DateTime<Utc>,
}

impl Customer {
    /// Whether the customer can redeem a reward right now.
    #[must_use]
    pub fn is_eligible(&self, config: &LoyaltyConfig) -> bool {
        rules::is_eligible(self.stamps, config.stamps_needed)
    }

    /// Stamps still missing before the next reward.
    #[must_use]
    pub fn stamps_until_reward(&self, config: &LoyaltyConfig) -> i64 {
        rules::stamps_until_reward(self.stamps, config.stamps_needed)
    }

    /// Stamp card slots for display.
    #[must_use]
    pub fn card(&self, config: &LoyaltyConfig) -> CardProgress {
        rules::card_progress(self.stamps, config.stamps_needed)
    }
}

/// Registration data for an upsert by phone.
///
/// Construction trims every field and turns empty optional fields into
/// `None`, so an absent phone never collides with another absent phone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInput {
    /// Name, possibly empty when only updating an existing customer.
    pub name: String,

    /// Phone number (natural key).
    pub phone: Option<String>,

    /// E-mail address.
    pub email: Option<String>,
}

impl CustomerInput {
    /// Normalize raw registration fields.
    #[must_use]
    pub fn new(name: &str, phone: Option<&str>, email: Option<&str>) -> Self {
        Self {
            name: name.trim().to_string(),
            phone: non_empty(phone),
            email: non_empty(email),
        }
    }

    /// Whether a name was supplied. Required when a new customer is created.
    #[must_use]
    pub fn has_name(&self) -> bool {
        !self.name.is_empty()
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

/// What an upsert did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    /// A new customer was registered.
    Created,

    /// An existing customer with the same phone was updated in place.
    Updated,
}
