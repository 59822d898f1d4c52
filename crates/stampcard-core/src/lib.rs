//! Core types and rules for stampcard.
//!
//! This crate provides the foundational types of the café loyalty ledger:
//!
//! - **Identifiers**: `CustomerId`, `TransactionId`
//! - **Customers**: `Customer`, `CustomerInput`, `UpsertOutcome`
//! - **Ledger**: `StampTransaction`, `NewTransaction`, `TransactionType`
//! - **Program rules**: `LoyaltyConfig` and the pure functions in [`rules`]
//! - **Reporting**: `LedgerStats`, `BalanceDiscrepancy`
//!
//! # Stamps
//!
//! A purchase earns `floor(amount / cents_per_stamp)` stamps. A reward costs
//! `stamps_needed` stamps. Amounts are `i64` cents throughout, so
//! R$ 275,00 at R$ 50,00 per stamp is `27_500 / 5_000 = 5` stamps.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod customer;
pub mod error;
pub mod ids;
pub mod messaging;
pub mod money;
pub mod rules;
pub mod stats;
pub mod transactions;

pub use config::{
    LoyaltyConfig, DEFAULT_CENTS_PER_STAMP, DEFAULT_STAMPS_NEEDED, REAIS_PER_STAMP_KEY,
    STAMPS_NEEDED_KEY,
};
pub use customer::{Customer, CustomerInput, UpsertOutcome};
pub use error::{LoyaltyError, Result};
pub use ids::{CustomerId, IdError, TransactionId};
pub use rules::{AdjustOutcome, CardProgress, PurchaseOutcome, RedeemOutcome};
pub use stats::{BalanceDiscrepancy, LedgerStats};
pub use transactions::{
    NewTransaction, StampTransaction, TransactionType, UnknownTransactionType, REDEEM_NOTE,
};
