//! Customer messaging handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use stampcard_core::messaging;
use stampcard_store::Store;

use super::parse_customer_id;
use crate::error::ApiError;
use crate::state::AppState;

/// Message link request.
#[derive(Debug, Default, Deserialize)]
pub struct MessageLinkRequest {
    /// Text to prefill. Defaults to a stamp progress message.
    pub message: Option<String>,
}

/// Message link response.
#[derive(Debug, Serialize)]
pub struct MessageLinkResponse {
    /// Click-to-chat URL.
    pub url: String,
    /// The prefilled text.
    pub message: String,
}

/// Build a WhatsApp link to message a customer.
pub async fn message_link(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<MessageLinkRequest>,
) -> Result<Json<MessageLinkResponse>, ApiError> {
    let customer_id = parse_customer_id(&id)?;
    let customer = state
        .store
        .get_customer(customer_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Customer not found".into()))?;

    let phone = customer
        .phone
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("Customer has no phone number".into()))?;

    let message = match body.message.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => {
            let config = state.store.get_config().await?;
            messaging::progress_message(&customer, &config)
        }
    };

    let url = messaging::whatsapp_link(phone, &message)?;

    Ok(Json(MessageLinkResponse { url, message }))
}
