//! Customer registration and lookup handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use stampcard_core::{money, CardProgress, Customer, CustomerInput, LoyaltyConfig, UpsertOutcome};
use stampcard_store::{Store, DEFAULT_LIST_LIMIT};

use super::parse_customer_id;
use crate::error::ApiError;
use crate::state::AppState;

/// Upper bound on `limit` for customer listings.
const MAX_LIST_LIMIT: u32 = 1000;

/// Customer response.
#[derive(Debug, Serialize)]
pub struct CustomerResponse {
    /// Customer ID.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Phone number.
    pub phone: Option<String>,
    /// E-mail address.
    pub email: Option<String>,
    /// Current stamp balance.
    pub stamps: i64,
    /// Lifetime spend in cents.
    pub total_purchases_cents: i64,
    /// Lifetime spend formatted as reais.
    pub total_purchases_formatted: String,
    /// Stamps a reward costs.
    pub stamps_needed: i64,
    /// Stamps missing for the next reward.
    pub stamps_until_reward: i64,
    /// Whether a reward can be redeemed now.
    pub eligible: bool,
    /// Stamp card slots.
    pub card: CardProgress,
    /// Registration timestamp.
    pub created_at: String,
}

impl CustomerResponse {
    /// Render a customer under the current program rules.
    #[must_use]
    pub fn new(customer: &Customer, config: &LoyaltyConfig) -> Self {
        Self {
            id: customer.id.get(),
            name: customer.name.clone(),
            phone: customer.phone.clone(),
            email: customer.email.clone(),
            stamps: customer.stamps,
            total_purchases_cents: customer.total_purchases_cents,
            total_purchases_formatted: money::format_brl(customer.total_purchases_cents),
            stamps_needed: config.stamps_needed,
            stamps_until_reward: customer.stamps_until_reward(config),
            eligible: customer.is_eligible(config),
            card: customer.card(config),
            created_at: customer.created_at.to_rfc3339(),
        }
    }
}

/// Customer list response.
#[derive(Debug, Serialize)]
pub struct CustomerListResponse {
    /// Matching customers.
    pub customers: Vec<CustomerResponse>,
}

impl CustomerListResponse {
    fn new(customers: &[Customer], config: &LoyaltyConfig) -> Self {
        Self {
            customers: customers
                .iter()
                .map(|c| CustomerResponse::new(c, config))
                .collect(),
        }
    }
}

/// Register customer request.
#[derive(Debug, Deserialize)]
pub struct UpsertCustomerRequest {
    /// Name. May be omitted when updating by phone.
    #[serde(default)]
    pub name: String,
    /// Phone number, the natural key.
    pub phone: Option<String>,
    /// E-mail address.
    pub email: Option<String>,
}

/// Upsert response.
#[derive(Debug, Serialize)]
pub struct UpsertCustomerResponse {
    /// The stored customer.
    pub customer: CustomerResponse,
    /// Whether the customer was created or updated.
    pub outcome: UpsertOutcome,
}

/// Register a customer, or update the one holding the same phone.
///
/// Returns `201 Created` for new customers and `200 OK` for updates.
pub async fn upsert_customer(
    State(state): State<Arc<AppState>>,
    Json(body): Json<UpsertCustomerRequest>,
) -> Result<(StatusCode, Json<UpsertCustomerResponse>), ApiError> {
    let input = CustomerInput::new(&body.name, body.phone.as_deref(), body.email.as_deref());
    let (customer, outcome) = state.store.upsert_customer(&input).await?;
    let config = state.store.get_config().await?;

    tracing::info!(
        customer_id = %customer.id,
        outcome = ?outcome,
        "Customer saved"
    );

    let status = match outcome {
        UpsertOutcome::Created => StatusCode::CREATED,
        UpsertOutcome::Updated => StatusCode::OK,
    };

    Ok((
        status,
        Json(UpsertCustomerResponse {
            customer: CustomerResponse::new(&customer, &config),
            outcome,
        }),
    ))
}

/// Customer list query parameters.
#[derive(Debug, Deserialize)]
pub struct ListCustomersQuery {
    /// Maximum number of customers to return (default: 200).
    #[serde(default = "default_list_limit")]
    pub limit: u32,
}

fn default_list_limit() -> u32 {
    DEFAULT_LIST_LIMIT
}

/// List customers, most recently registered first.
pub async fn list_customers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListCustomersQuery>,
) -> Result<Json<CustomerListResponse>, ApiError> {
    let limit = query.limit.min(MAX_LIST_LIMIT);
    let customers = state.store.list_customers(limit).await?;
    let config = state.store.get_config().await?;

    Ok(Json(CustomerListResponse::new(&customers, &config)))
}

/// Name search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchCustomersQuery {
    /// Substring of the name.
    #[serde(default)]
    pub q: String,
}

/// Search customers by name.
pub async fn search_customers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchCustomersQuery>,
) -> Result<Json<CustomerListResponse>, ApiError> {
    let customers = state.store.search_customers_by_name(&query.q).await?;
    let config = state.store.get_config().await?;

    Ok(Json(CustomerListResponse::new(&customers, &config)))
}

/// Look a customer up by phone.
pub async fn get_customer_by_phone(
    State(state): State<Arc<AppState>>,
    Path(phone): Path<String>,
) -> Result<Json<CustomerResponse>, ApiError> {
    let customer = state
        .store
        .find_customer_by_phone(&phone)
        .await?
        .ok_or_else(|| ApiError::NotFound("Customer not found".into()))?;
    let config = state.store.get_config().await?;

    Ok(Json(CustomerResponse::new(&customer, &config)))
}

/// Get a customer by ID.
pub async fn get_customer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CustomerResponse>, ApiError> {
    let customer_id = parse_customer_id(&id)?;
    let customer = state
        .store
        .get_customer(customer_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Customer not found".into()))?;
    let config = state.store.get_config().await?;

    Ok(Json(CustomerResponse::new(&customer, &config)))
}

/// Delete a customer and their transaction history.
pub async fn delete_customer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let customer_id = parse_customer_id(&id)?;
    state.store.delete_customer(customer_id).await?;

    tracing::info!(customer_id = %customer_id, "Customer deleted");

    Ok(Json(serde_json::json!({ "deleted": true })))
}
