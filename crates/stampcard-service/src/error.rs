//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use stampcard_core::LoyaltyError;
use stampcard_store::StoreError;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Not enough stamps for the requested operation.
    #[error("insufficient stamps: balance={balance}, required={required}")]
    InsufficientStamps {
        /// Current stamp balance.
        balance: i64,
        /// Stamps the operation needs.
        required: i64,
    },

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone(), None),
            Self::InsufficientStamps { balance, required } => (
                StatusCode::CONFLICT,
                "insufficient_stamps",
                self.to_string(),
                Some(serde_json::json!({
                    "balance": balance,
                    "required": required
                })),
            ),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => {
                Self::NotFound(format!("{entity} not found: {id}"))
            }
            StoreError::InsufficientStamps { balance, required } => {
                Self::InsufficientStamps { balance, required }
            }
            StoreError::Validation(msg) => Self::BadRequest(msg),
            StoreError::Database(_)
            | StoreError::Migration(_)
            | StoreError::Io(_)
            | StoreError::Serialization(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<LoyaltyError> for ApiError {
    fn from(err: LoyaltyError) -> Self {
        match err {
            LoyaltyError::Validation(msg) => Self::BadRequest(msg),
            LoyaltyError::InvalidId(e) => Self::BadRequest(e.to_string()),
            LoyaltyError::CustomerNotFound { customer_id } => {
                Self::NotFound(format!("customer not found: {customer_id}"))
            }
            LoyaltyError::InsufficientStamps { balance, required } => {
                Self::InsufficientStamps { balance, required }
            }
        }
    }
}
