//! Transaction log handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use tally_core::{LogEntry, LogId, LogQuery, TransactionKind, UserId};

use crate::auth::ServiceAuth;
use crate::error::ApiError;
use crate::state::AppState;

/// Log list query parameters.
#[derive(Debug, Deserialize)]
pub struct ListLogsQuery {
    /// Only entries for this user.
    pub user_id: Option<UserId>,
    /// Only entries for this points type.
    pub points_type: Option<String>,
    /// Only entries with this transaction kind.
    pub kind: Option<TransactionKind>,
    /// Maximum number of entries to return (default: 50, max: 100).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

/// One transaction log entry.
#[derive(Debug, Serialize)]
pub struct LogEntryResponse {
    /// Log entry id.
    pub id: u64,
    /// The affected user.
    pub user_id: u64,
    /// The points type slug.
    pub points_type: String,
    /// The applied delta.
    pub delta: i64,
    /// The transaction kind.
    pub kind: String,
    /// Rendered description.
    pub text: String,
    /// Timestamp.
    pub created_at: String,
}

impl From<&LogEntry> for LogEntryResponse {
    fn from(entry: &LogEntry) -> Self {
        Self {
            id: entry.id.get(),
            user_id: entry.user_id.get(),
            points_type: entry.points_type.clone(),
            delta: entry.delta,
            kind: entry.kind.as_str().to_string(),
            text: entry.text.clone(),
            created_at: entry.timestamp.to_rfc3339(),
        }
    }
}

/// Log list response.
#[derive(Debug, Serialize)]
pub struct ListLogsResponse {
    /// Log entries, newest first.
    pub logs: Vec<LogEntryResponse>,
    /// Whether more entries match beyond this page.
    pub has_more: bool,
}

/// List transaction log entries, newest first.
pub async fn list_logs(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Query(query): Query<ListLogsQuery>,
) -> Result<Json<ListLogsResponse>, ApiError> {
    // Fetch one more than requested to determine has_more.
    let limit = query.limit.min(100);
    let entries = state.ledger.logs(&LogQuery {
        user_id: query.user_id,
        points_type: query.points_type,
        kind: query.kind,
        limit: Some(limit + 1),
        offset: query.offset,
    })?;

    let has_more = entries.len() > limit;
    let logs: Vec<_> = entries
        .iter()
        .take(limit)
        .map(LogEntryResponse::from)
        .collect();

    Ok(Json(ListLogsResponse { logs, has_more }))
}

/// One log meta row.
#[derive(Debug, Serialize)]
pub struct LogMetaRow {
    /// The meta key.
    pub key: String,
    /// The meta value.
    pub value: serde_json::Value,
}

/// Log meta response.
#[derive(Debug, Serialize)]
pub struct LogMetaResponse {
    /// Meta rows in insertion order.
    pub meta: Vec<LogMetaRow>,
}

/// Get the meta rows attached to one log entry.
pub async fn get_log_meta(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Path(log_id): Path<u64>,
) -> Result<Json<LogMetaResponse>, ApiError> {
    let log_id = LogId::new(log_id);

    state
        .ledger
        .log(log_id)?
        .ok_or_else(|| ApiError::NotFound(format!("log entry not found: {log_id}")))?;

    let meta = state
        .ledger
        .log_meta(log_id)?
        .into_iter()
        .map(|(key, value)| LogMetaRow { key, value })
        .collect();

    Ok(Json(LogMetaResponse { meta }))
}

/// Log regeneration request.
#[derive(Debug, Deserialize)]
pub struct RegenerateRequest {
    /// Only entries for this user.
    pub user_id: Option<UserId>,
    /// Only entries for this points type.
    pub points_type: Option<String>,
    /// Only entries with this transaction kind.
    pub kind: Option<TransactionKind>,
}

/// Log regeneration response.
#[derive(Debug, Serialize)]
pub struct RegenerateResponse {
    /// Number of entries whose text was rewritten.
    pub rewritten: u64,
}

/// Re-render the text of matching log entries from their stored kind and
/// meta. Used after formatter changes.
pub async fn regenerate_logs(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Json(body): Json<RegenerateRequest>,
) -> Result<Json<RegenerateResponse>, ApiError> {
    let rewritten = state.ledger.regenerate_logs(&LogQuery {
        user_id: body.user_id,
        points_type: body.points_type,
        kind: body.kind,
        limit: None,
        offset: 0,
    })?;

    tracing::info!(rewritten, "Log text regenerated");

    Ok(Json(RegenerateResponse { rewritten }))
}
