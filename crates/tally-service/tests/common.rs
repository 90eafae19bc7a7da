//! Common test utilities for tally integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use tempfile::TempDir;

use tally_service::{create_router, AppState, ServiceConfig};
use tally_store::RocksStore;

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Temporary directory for the database (kept alive for test duration).
    pub _temp_dir: TempDir,
    /// The service API key for authenticated requests.
    pub service_api_key: String,
}

impl TestHarness {
    /// Create a new test harness with a fresh database.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = RocksStore::open(temp_dir.path()).expect("Failed to open store");

        let service_api_key = "test-service-key".to_string();

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            data_dir: temp_dir.path().to_string_lossy().to_string(),
            tenant_site_id: 1,
            tenant_network_id: 1,
            service_api_key: Some(service_api_key.clone()),
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
        };

        let state = AppState::new(Arc::new(store), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            _temp_dir: temp_dir,
            service_api_key,
        }
    }

    /// Register a points type and return its slug.
    pub async fn create_points_type(&self, name: &str) -> String {
        let response = self
            .server
            .post("/v1/points-types")
            .add_header("x-api-key", self.service_api_key.clone())
            .json(&serde_json::json!({ "name": name }))
            .await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        body["slug"].as_str().expect("Missing slug").to_string()
    }

    /// Credit points to a user via the API.
    pub async fn add_points(&self, user_id: u64, points_type: &str, amount: i64) {
        self.server
            .post("/v1/points/add")
            .add_header("x-api-key", self.service_api_key.clone())
            .json(&serde_json::json!({
                "user_id": user_id,
                "points_type": points_type,
                "amount": amount,
                "kind": "test"
            }))
            .await
            .assert_status_ok();
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
