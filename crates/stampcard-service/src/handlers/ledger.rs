//! Purchase, redemption and correction handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use stampcard_core::{money, StampTransaction};
use stampcard_store::Store;

use super::parse_customer_id;
use crate::error::ApiError;
use crate::state::AppState;

/// Record purchase request.
#[derive(Debug, Deserialize)]
pub struct RecordPurchaseRequest {
    /// Purchase amount in reais. Fractions of a cent are dropped.
    pub amount: f64,
}

/// Record purchase response.
#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    /// The `purchase` transaction written.
    pub transaction_id: i64,
    /// Purchase amount in cents.
    pub amount_cents: i64,
    /// Purchase amount formatted as reais.
    pub amount_formatted: String,
    /// Stamps earned by this purchase.
    pub stamps_earned: i64,
    /// Balance after the purchase.
    pub stamps: i64,
    /// Stamps a reward costs.
    pub stamps_needed: i64,
    /// True when this purchase made the customer eligible for a reward.
    pub became_eligible: bool,
}

/// Record a purchase and credit the stamps it earns.
pub async fn record_purchase(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<RecordPurchaseRequest>,
) -> Result<Json<PurchaseResponse>, ApiError> {
    let customer_id = parse_customer_id(&id)?;
    let amount_cents = money::reais_to_cents_floor(body.amount)?;

    let outcome = state
        .store
        .record_purchase(customer_id, amount_cents)
        .await?;

    tracing::info!(
        customer_id = %customer_id,
        amount_cents,
        stamps_earned = outcome.stamps_earned,
        stamps = outcome.balance,
        became_eligible = outcome.became_eligible,
        "Purchase recorded"
    );

    Ok(Json(PurchaseResponse {
        transaction_id: outcome.transaction_id.get(),
        amount_cents,
        amount_formatted: money::format_brl(amount_cents),
        stamps_earned: outcome.stamps_earned,
        stamps: outcome.balance,
        stamps_needed: outcome.stamps_needed,
        became_eligible: outcome.became_eligible,
    }))
}

/// Redeem response.
#[derive(Debug, Serialize)]
pub struct RedeemResponse {
    /// The `redeem` transaction written.
    pub transaction_id: i64,
    /// Stamps spent on the reward.
    pub stamps_spent: i64,
    /// Balance after the redemption.
    pub stamps: i64,
}

/// Redeem one reward.
pub async fn redeem(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<RedeemResponse>, ApiError> {
    let customer_id = parse_customer_id(&id)?;
    let outcome = state.store.redeem(customer_id).await?;

    tracing::info!(
        customer_id = %customer_id,
        stamps_spent = outcome.stamps_spent,
        stamps = outcome.balance,
        "Reward redeemed"
    );

    Ok(Json(RedeemResponse {
        transaction_id: outcome.transaction_id.get(),
        stamps_spent: outcome.stamps_spent,
        stamps: outcome.balance,
    }))
}

/// Manual stamp correction request.
#[derive(Debug, Deserialize)]
pub struct AdjustStampsRequest {
    /// Stamps to add (negative to remove).
    pub delta: i64,
    /// Reason for the correction.
    pub note: Option<String>,
}

/// Manual stamp correction response.
#[derive(Debug, Serialize)]
pub struct AdjustResponse {
    /// The `adjust` transaction written.
    pub transaction_id: i64,
    /// Stamps added (negative when removed).
    pub stamps_added: i64,
    /// Balance after the correction.
    pub stamps: i64,
}

/// Apply a manual stamp correction.
pub async fn adjust_stamps(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<AdjustStampsRequest>,
) -> Result<Json<AdjustResponse>, ApiError> {
    let customer_id = parse_customer_id(&id)?;
    let outcome = state
        .store
        .adjust_stamps(customer_id, body.delta, body.note.as_deref())
        .await?;

    tracing::info!(
        customer_id = %customer_id,
        delta = body.delta,
        note = ?body.note,
        stamps = outcome.balance,
        "Stamps adjusted"
    );

    Ok(Json(AdjustResponse {
        transaction_id: outcome.transaction_id.get(),
        stamps_added: outcome.stamps_added,
        stamps: outcome.balance,
    }))
}

/// Transaction list query parameters.
#[derive(Debug, Deserialize)]
pub struct ListTransactionsQuery {
    /// Maximum number of transactions to return (default: 50).
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: u32,
}

fn default_limit() -> u32 {
    50
}

/// Transaction response.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    /// Transaction ID.
    pub id: i64,
    /// Purchase amount in cents (0 for non-purchases).
    pub amount_cents: i64,
    /// Purchase amount formatted as reais.
    pub amount_formatted: String,
    /// Signed stamp change.
    pub stamps_added: i64,
    /// Transaction type.
    pub transaction_type: String,
    /// Free-text note.
    pub note: Option<String>,
    /// Timestamp.
    pub created_at: String,
}

impl From<&StampTransaction> for TransactionResponse {
    fn from(tx: &StampTransaction) -> Self {
        Self {
            id: tx.id.get(),
            amount_cents: tx.amount_cents,
            amount_formatted: money::format_brl(tx.amount_cents),
            stamps_added: tx.stamps_added,
            transaction_type: tx.transaction_type.to_string(),
            note: tx.note.clone(),
            created_at: tx.ts.to_rfc3339(),
        }
    }
}

/// List transactions response.
#[derive(Debug, Serialize)]
pub struct ListTransactionsResponse {
    /// Transactions (newest first).
    pub transactions: Vec<TransactionResponse>,
    /// Whether there are more transactions.
    pub has_more: bool,
}

/// List a customer's transaction history.
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<Json<ListTransactionsResponse>, ApiError> {
    let customer_id = parse_customer_id(&id)?;

    // Verify customer exists
    state
        .store
        .get_customer(customer_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Customer not found".into()))?;

    // Fetch one more than requested to determine has_more
    let limit = query.limit.min(100);
    let transactions = state
        .store
        .list_transactions(customer_id, limit + 1, query.offset)
        .await?;

    let has_more = transactions.len() > limit as usize;
    let transactions: Vec<_> = transactions
        .iter()
        .take(limit as usize)
        .map(TransactionResponse::from)
        .collect();

    Ok(Json(ListTransactionsResponse {
        transactions,
        has_more,
    }))
}
