//! Balance mutation and query handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use tally_core::{MetaMap, TransactionKind, UserId};
use tally_ledger::Alteration;

use crate::auth::ServiceAuth;
use crate::error::ApiError;
use crate::state::AppState;

/// Balance alteration request.
#[derive(Debug, Deserialize)]
pub struct AlterRequest {
    /// The user whose balance to alter.
    pub user_id: UserId,
    /// The points type slug.
    pub points_type: String,
    /// The signed delta to apply.
    pub delta: i64,
    /// The transaction kind.
    pub kind: TransactionKind,
    /// Metadata attached to the transaction log entry.
    #[serde(default)]
    pub meta: MetaMap,
}

/// Balance alteration response.
#[derive(Debug, Serialize)]
pub struct AlterResponse {
    /// The delta actually applied, after filters and the minimum clamp.
    pub applied_delta: i64,
    /// The transaction log entry id, if one was written.
    pub log_id: Option<u64>,
    /// The balance after the alteration.
    pub balance: i64,
}

fn alter_response(
    state: &AppState,
    user_id: UserId,
    points_type: &str,
    outcome: Alteration,
) -> Result<Json<AlterResponse>, ApiError> {
    let balance = state.ledger.balance(user_id, points_type)?;
    Ok(Json(AlterResponse {
        applied_delta: outcome.applied_delta,
        log_id: outcome.log_id.map(tally_core::LogId::get),
        balance,
    }))
}

/// Alter a balance by a signed delta.
pub async fn alter(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Json(body): Json<AlterRequest>,
) -> Result<Json<AlterResponse>, ApiError> {
    let outcome = state.ledger.alter(
        body.user_id,
        &body.points_type,
        body.delta,
        &body.kind,
        &body.meta,
    )?;

    tracing::info!(
        user_id = %body.user_id,
        points_type = %body.points_type,
        applied_delta = %outcome.applied_delta,
        "Balance altered"
    );

    alter_response(&state, body.user_id, &body.points_type, outcome)
}

/// Credit or debit request for the derived operations.
#[derive(Debug, Deserialize)]
pub struct AmountRequest {
    /// The user whose balance to alter.
    pub user_id: UserId,
    /// The points type slug.
    pub points_type: String,
    /// The amount. Negative amounts are treated as zero.
    pub amount: i64,
    /// The transaction kind.
    pub kind: TransactionKind,
    /// Metadata attached to the transaction log entry.
    #[serde(default)]
    pub meta: MetaMap,
}

/// Credit points to a user.
pub async fn add(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Json(body): Json<AmountRequest>,
) -> Result<Json<AlterResponse>, ApiError> {
    let outcome = state.ledger.add(
        body.user_id,
        &body.points_type,
        body.amount,
        &body.kind,
        &body.meta,
    )?;
    alter_response(&state, body.user_id, &body.points_type, outcome)
}

/// Debit points from a user, clamped at the type's minimum.
pub async fn subtract(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Json(body): Json<AmountRequest>,
) -> Result<Json<AlterResponse>, ApiError> {
    let outcome = state.ledger.subtract(
        body.user_id,
        &body.points_type,
        body.amount,
        &body.kind,
        &body.meta,
    )?;
    alter_response(&state, body.user_id, &body.points_type, outcome)
}

/// Balance set request.
#[derive(Debug, Deserialize)]
pub struct SetRequest {
    /// The user whose balance to set.
    pub user_id: UserId,
    /// The points type slug.
    pub points_type: String,
    /// The target balance.
    pub target: i64,
    /// The transaction kind.
    pub kind: TransactionKind,
    /// Metadata attached to the transaction log entry.
    #[serde(default)]
    pub meta: MetaMap,
}

/// Move a balance to a target value.
pub async fn set(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Json(body): Json<SetRequest>,
) -> Result<Json<AlterResponse>, ApiError> {
    let outcome = state.ledger.set(
        body.user_id,
        &body.points_type,
        body.target,
        &body.kind,
        &body.meta,
    )?;
    alter_response(&state, body.user_id, &body.points_type, outcome)
}

/// Balance query parameters.
#[derive(Debug, Deserialize)]
pub struct BalanceQuery {
    /// The user.
    pub user_id: UserId,
    /// The points type slug.
    pub points_type: String,
}

/// Balance response.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// The balance. An absent row reads as zero.
    pub balance: i64,
    /// The balance formatted with the type's display prefix and suffix.
    pub formatted: String,
    /// How far the balance sits above the type's effective minimum.
    pub above_minimum: i64,
}

/// Get a user's balance for a points type.
pub async fn balance(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Query(query): Query<BalanceQuery>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let balance = state.ledger.balance(query.user_id, &query.points_type)?;
    let formatted = state
        .ledger
        .formatted_balance(query.user_id, &query.points_type)?;
    let above_minimum = state
        .ledger
        .balance_above_minimum(query.user_id, &query.points_type)?;

    Ok(Json(BalanceResponse {
        balance,
        formatted,
        above_minimum,
    }))
}

/// Leaderboard query parameters.
#[derive(Debug, Deserialize)]
pub struct TopUsersQuery {
    /// The points type slug.
    pub points_type: String,
    /// Number of users to return (default: 10, max: 100).
    #[serde(default = "default_top_limit")]
    pub limit: usize,
}

fn default_top_limit() -> usize {
    10
}

/// Leaderboard response.
#[derive(Debug, Serialize)]
pub struct TopUsersResponse {
    /// User ids ordered by balance descending.
    pub users: Vec<u64>,
}

/// Get the top users by balance for a points type.
pub async fn top_users(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Query(query): Query<TopUsersQuery>,
) -> Result<Json<TopUsersResponse>, ApiError> {
    let limit = query.limit.min(100);
    let users = state.ledger.top_users(&query.points_type, limit)?;

    Ok(Json(TopUsersResponse {
        users: users.into_iter().map(UserId::get).collect(),
    }))
}

/// User purge request.
#[derive(Debug, Deserialize)]
pub struct PurgeRequest {
    /// The user whose rows to remove.
    pub user_id: UserId,
    /// The points type slug.
    pub points_type: String,
}

/// Remove one user's balance and log entries for a points type.
pub async fn purge(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Json(body): Json<PurgeRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.ledger.purge_user(body.user_id, &body.points_type)?;

    tracing::info!(
        user_id = %body.user_id,
        points_type = %body.points_type,
        "User points data purged"
    );

    Ok(Json(serde_json::json!({ "purged": true })))
}
