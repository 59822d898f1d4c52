//! Error types for stampcard storage.

use stampcard_core::{CustomerId, LoyaltyError};

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
///
/// A `Database`, `Migration` or `Io` error aborts the operation that raised
/// it; the open database transaction is rolled back when dropped.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Filesystem error while preparing the database location.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored value could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record.
        entity: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// Not enough stamps for the operation.
    #[error("insufficient stamps: balance={balance}, required={required}")]
    InsufficientStamps {
        /// Current stamp balance.
        balance: i64,
        /// Stamps the operation needs.
        required: i64,
    },

    /// Input rejected before anything was written.
    #[error("validation error: {0}")]
    Validation(String),
}

impl StoreError {
    /// A missing customer.
    #[must_use]
    pub fn customer_not_found(customer_id: CustomerId) -> Self {
        Self::NotFound {
            entity: "customer",
            id: customer_id.to_string(),
        }
    }
}

impl From<LoyaltyError> for StoreError {
    fn from(err: LoyaltyError) -> Self {
        match err {
            LoyaltyError::Validation(msg) => Self::Validation(msg),
            LoyaltyError::InvalidId(e) => Self::Validation(e.to_string()),
            LoyaltyError::CustomerNotFound { customer_id } => {
                Self::customer_not_found(customer_id)
            }
            LoyaltyError::InsufficientStamps { balance, required } => {
                Self::InsufficientStamps { balance, required }
            }
        }
    }
}
