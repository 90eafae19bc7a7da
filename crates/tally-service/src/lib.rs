//! Tally HTTP API Service.
//!
//! This crate provides the HTTP API for the tally points ledger, including:
//!
//! - Balance alteration (alter, add, subtract, set)
//! - Balance and leaderboard queries
//! - Transaction log listing, meta retrieval, and text regeneration
//! - Points-type registry management
//!
//! # Authentication
//!
//! All routes except `/health` require the shared service API key in the
//! `X-API-Key` header. When no key is configured, authentication is
//! disabled (intended for local development only).

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers need async for consistency

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
