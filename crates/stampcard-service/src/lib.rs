//! Stampcard HTTP API Service.
//!
//! This crate exposes the café loyalty ledger over JSON:
//!
//! - Customer registration, lookup and removal
//! - Purchases, reward redemptions and manual stamp corrections
//! - Program rules, aggregate stats and a balance audit
//! - Prefilled WhatsApp links for messaging customers
//!
//! Amounts cross the API as decimal reais and are stored as integer cents.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Axum handlers must be async

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
