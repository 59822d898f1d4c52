//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{admin, customers, health, ledger, messaging};
use crate::state::AppState;

/// Maximum concurrent requests for API endpoints.
const API_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
///
/// ## Customers
/// - `POST /v1/customers` - Register or update by phone
/// - `GET /v1/customers` - List, newest first
/// - `GET /v1/customers/search?q=` - Search by name
/// - `GET /v1/customers/by-phone/:phone` - Look up by phone
/// - `GET /v1/customers/:id` - Get customer
/// - `DELETE /v1/customers/:id` - Delete customer and history
/// - `POST /v1/customers/:id/message-link` - WhatsApp link
///
/// ## Ledger
/// - `GET /v1/customers/:id/transactions` - Transaction history
/// - `POST /v1/customers/:id/purchases` - Record purchase
/// - `POST /v1/customers/:id/redeem` - Redeem reward
/// - `POST /v1/customers/:id/adjust` - Manual correction
///
/// ## Admin
/// - `GET /v1/config` / `PUT /v1/config` - Program rules
/// - `GET /v1/stats` - Aggregate totals
/// - `GET /v1/audit` - Balance audit
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    // Build CORS layer
    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    let customer_routes = Router::new()
        .route(
            "/",
            post(customers::upsert_customer).get(customers::list_customers),
        )
        .route("/search", get(customers::search_customers))
        .route("/by-phone/:phone", get(customers::get_customer_by_phone))
        .route(
            "/:id",
            get(customers::get_customer).delete(customers::delete_customer),
        )
        .route("/:id/transactions", get(ledger::list_transactions))
        .route("/:id/purchases", post(ledger::record_purchase))
        .route("/:id/redeem", post(ledger::redeem))
        .route("/:id/adjust", post(ledger::adjust_stamps))
        .route("/:id/message-link", post(messaging::message_link));

    let api_routes = Router::new()
        .nest("/customers", customer_routes)
        .route("/config", get(admin::get_config).put(admin::update_config))
        .route("/stats", get(admin::get_stats))
        .route("/audit", get(admin::audit_balances))
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    Router::new()
        // Health (public, no rate limit)
        .route("/health", get(health::health))
        // API v1 routes (rate limited)
        .nest("/v1", api_routes)
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
