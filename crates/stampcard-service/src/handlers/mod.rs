//! API handlers.

pub mod admin;
pub mod customers;
pub mod health;
pub mod ledger;
pub mod messaging;

use stampcard_core::CustomerId;

use crate::error::ApiError;

/// Parse a customer ID from a path segment.
pub(crate) fn parse_customer_id(raw: &str) -> Result<CustomerId, ApiError> {
    raw.parse()
        .map_err(|e| ApiError::BadRequest(format!("invalid customer id '{raw}': {e}")))
}
