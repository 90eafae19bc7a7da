//! Health endpoint integration tests.

mod common;

use common::TestHarness;

#[tokio::test]
async fn health_check_is_public() {
    let harness = TestHarness::new();

    let response = harness.server.get("/health").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "tally");
}

#[tokio::test]
async fn protected_routes_require_the_api_key() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get("/v1/points-types")
        .await;
    response.assert_status_unauthorized();

    let response = harness
        .server
        .get("/v1/points-types")
        .add_header("x-api-key", "wrong-key")
        .await;
    response.assert_status_unauthorized();

    let response = harness
        .server
        .get("/v1/points-types")
        .add_header("x-api-key", harness.service_api_key.clone())
        .await;
    response.assert_status_ok();
}
