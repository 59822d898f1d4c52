//! Common test utilities for stampcard integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::http::StatusCode;
use axum::Router;
use axum_test::TestServer;
use serde_json::{json, Value};
use tempfile::TempDir;

use stampcard_core::LoyaltyConfig;
use stampcard_service::{create_router, AppState, ServiceConfig};
use stampcard_store::{SqliteStore, Store};

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Direct store access for setting up and inspecting state.
    pub store: Arc<SqliteStore>,
    /// Temporary directory for the database (kept alive for test duration).
    pub _temp_dir: TempDir,
}

impl TestHarness {
    /// Create a new test harness with a fresh database and default rules.
    pub async fn new() -> Self {
        Self::with_rules(LoyaltyConfig::default()).await
    }

    /// Create a new test harness whose database is seeded with `rules`.
    pub async fn with_rules(rules: LoyaltyConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let database_url = format!("sqlite://{}", temp_dir.path().join("test.db").display());

        let store = SqliteStore::connect(&database_url, 4)
            .await
            .expect("Failed to open store");
        store
            .seed_config(&rules)
            .await
            .expect("Failed to seed config");
        let store = Arc::new(store);

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            database_url,
            db_max_connections: 4,
            loyalty_defaults: rules,
            cors_origins: vec!["*".into()],
            max_body_bytes: 64 * 1024,
            request_timeout_seconds: 30,
        };

        let state = AppState::new(Arc::clone(&store), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            store,
            _temp_dir: temp_dir,
        }
    }

    /// Register a customer and return their ID.
    pub async fn register(&self, name: &str, phone: &str) -> i64 {
        let response = self
            .server
            .post("/v1/customers")
            .json(&json!({ "name": name, "phone": phone }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        body["customer"]["id"].as_i64().expect("customer id")
    }

    /// Record a purchase of `amount` reais and return the response body.
    pub async fn purchase(&self, customer_id: i64, amount: f64) -> Value {
        let response = self
            .server
            .post(&format!("/v1/customers/{customer_id}/purchases"))
            .json(&json!({ "amount": amount }))
            .await;

        response.assert_status_ok();
        response.json()
    }
}
