//! Error types for stampcard.

use crate::ids::{CustomerId, IdError};

/// Result type for stampcard operations.
pub type Result<T> = std::result::Result<T, LoyaltyError>;

/// Errors that can occur in loyalty ledger operations.
///
/// Every variant is an expected, user-facing outcome. Storage failures are
/// reported by the store crate's own error type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoyaltyError {
    /// Input failed validation (empty name, negative amount, ...).
    #[error("validation error: {0}")]
    Validation(String),

    /// Customer not found.
    #[error("customer not found: {customer_id}")]
    CustomerNotFound {
        /// The customer ID that was not found.
        customer_id: CustomerId,
    },

    /// Not enough stamps for the operation.
    #[error("insufficient stamps: balance={balance}, required={required}")]
    InsufficientStamps {
        /// Current stamp balance.
        balance: i64,
        /// Stamps the operation needs.
        required: i64,
    },

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),
}

impl LoyaltyError {
    /// Shorthand for a [`LoyaltyError::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
