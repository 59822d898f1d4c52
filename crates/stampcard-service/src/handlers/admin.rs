//! Program rules and reporting handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use stampcard_core::{money, BalanceDiscrepancy, LoyaltyConfig};
use stampcard_store::Store;

use crate::error::ApiError;
use crate::state::AppState;

/// Program rules response.
#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    /// Stamps a reward costs.
    pub stamps_needed: i64,
    /// Spend per stamp in reais.
    pub reais_per_stamp: f64,
    /// Spend per stamp formatted as reais.
    pub reais_per_stamp_formatted: String,
}

impl From<&LoyaltyConfig> for ConfigResponse {
    fn from(config: &LoyaltyConfig) -> Self {
        Self {
            stamps_needed: config.stamps_needed,
            reais_per_stamp: config.reais_per_stamp(),
            reais_per_stamp_formatted: money::format_brl(config.cents_per_stamp),
        }
    }
}

/// Get the program rules.
pub async fn get_config(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ConfigResponse>, ApiError> {
    let config = state.store.get_config().await?;
    Ok(Json(ConfigResponse::from(&config)))
}

/// Update program rules request.
#[derive(Debug, Deserialize)]
pub struct UpdateConfigRequest {
    /// Stamps a reward costs.
    pub stamps_needed: i64,
    /// Spend per stamp in reais.
    pub reais_per_stamp: f64,
}

/// Replace both program rules.
pub async fn update_config(
    State(state): State<Arc<AppState>>,
    Json(body): Json<UpdateConfigRequest>,
) -> Result<Json<ConfigResponse>, ApiError> {
    let config = LoyaltyConfig::from_reais(body.stamps_needed, body.reais_per_stamp)?;
    state.store.set_config(&config).await?;

    tracing::info!(
        stamps_needed = config.stamps_needed,
        cents_per_stamp = config.cents_per_stamp,
        "Loyalty config updated"
    );

    Ok(Json(ConfigResponse::from(&config)))
}

/// Aggregate stats response.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    /// Registered customers.
    pub total_customers: i64,
    /// Sum of all stamp balances.
    pub total_stamps: i64,
    /// Lifetime spend across customers, in cents.
    pub total_revenue_cents: i64,
    /// Lifetime spend formatted as reais.
    pub total_revenue_formatted: String,
    /// Rewards redeemed.
    pub rewards_redeemed: i64,
    /// Purchases recorded.
    pub purchases: i64,
}

/// Program-wide totals.
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatsResponse>, ApiError> {
    let stats = state.store.stats().await?;

    Ok(Json(StatsResponse {
        total_customers: stats.total_customers,
        total_stamps: stats.total_stamps,
        total_revenue_cents: stats.total_revenue_cents,
        total_revenue_formatted: money::format_brl(stats.total_revenue_cents),
        rewards_redeemed: stats.rewards_redeemed,
        purchases: stats.purchases,
    }))
}

/// Balance audit response.
#[derive(Debug, Serialize)]
pub struct AuditResponse {
    /// True when every balance matches its transaction history.
    pub consistent: bool,
    /// Customers whose balance does not match.
    pub discrepancies: Vec<BalanceDiscrepancy>,
}

/// Check every balance against the transaction log.
pub async fn audit_balances(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AuditResponse>, ApiError> {
    let discrepancies = state.store.audit_balances().await?;

    if !discrepancies.is_empty() {
        tracing::warn!(
            count = discrepancies.len(),
            "Stamp balances disagree with the transaction log"
        );
    }

    Ok(Json(AuditResponse {
        consistent: discrepancies.is_empty(),
        discrepancies,
    }))
}
