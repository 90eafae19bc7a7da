//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{health, logs, points, types};
use crate::state::AppState;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
///
/// ## Points (Service API Key auth)
/// - `POST /v1/points/alter` - Alter a balance by a signed delta
/// - `POST /v1/points/add` - Credit points
/// - `POST /v1/points/subtract` - Debit points
/// - `POST /v1/points/set` - Move a balance to a target value
/// - `GET /v1/points/balance` - Get a balance
/// - `GET /v1/points/top` - Leaderboard
/// - `POST /v1/points/purge` - Remove one user's rows for a type
///
/// ## Transaction log (Service API Key auth)
/// - `GET /v1/points/logs` - List log entries
/// - `GET /v1/points/logs/:id/meta` - Meta rows of one entry
/// - `POST /v1/points/regenerate-logs` - Re-render log text
///
/// ## Points types (Service API Key auth)
/// - `GET /v1/points-types` - List registered types
/// - `POST /v1/points-types` - Register a type
/// - `GET|PUT /v1/points-types/default` - Default type
/// - `GET|PUT|DELETE /v1/points-types/:slug` - One type
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    // Build CORS layer
    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    Router::new()
        // Health (public)
        .route("/health", get(health::health))
        // Points
        .route("/v1/points/alter", post(points::alter))
        .route("/v1/points/add", post(points::add))
        .route("/v1/points/subtract", post(points::subtract))
        .route("/v1/points/set", post(points::set))
        .route("/v1/points/balance", get(points::balance))
        .route("/v1/points/top", get(points::top_users))
        .route("/v1/points/purge", post(points::purge))
        // Transaction log
        .route("/v1/points/logs", get(logs::list_logs))
        .route("/v1/points/logs/:id/meta", get(logs::get_log_meta))
        .route("/v1/points/regenerate-logs", post(logs::regenerate_logs))
        // Points types
        .route("/v1/points-types", get(types::list_types))
        .route("/v1/points-types", post(types::create_type))
        .route("/v1/points-types/default", get(types::get_default_type))
        .route("/v1/points-types/default", put(types::set_default_type))
        .route("/v1/points-types/:slug", get(types::get_type))
        .route("/v1/points-types/:slug", put(types::update_type))
        .route("/v1/points-types/:slug", delete(types::delete_type))
        // Middleware
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
