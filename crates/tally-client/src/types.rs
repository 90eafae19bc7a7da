//! Request and response types mirroring the tally service API.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use tally_core::MetaMap;

/// Balance alteration request.
#[derive(Debug, Clone, Serialize)]
pub struct AlterRequest {
    /// The user whose balance to alter.
    pub user_id: u64,
    /// The points type slug.
    pub points_type: String,
    /// The signed delta to apply.
    pub delta: i64,
    /// The transaction kind.
    pub kind: String,
    /// Metadata attached to the transaction log entry.
    #[serde(skip_serializing_if = "MetaMap::is_empty")]
    pub meta: MetaMap,
}

/// Balance alteration response.
#[derive(Debug, Clone, Deserialize)]
pub struct AlterResponse {
    /// The delta actually applied, after filters and the minimum clamp.
    pub applied_delta: i64,
    /// The transaction log entry id, if one was written.
    pub log_id: Option<u64>,
    /// The balance after the alteration.
    pub balance: i64,
}

/// Balance response.
#[derive(Debug, Clone, Deserialize)]
pub struct BalanceResponse {
    /// The balance.
    pub balance: i64,
    /// The balance formatted with the type's display prefix and suffix.
    pub formatted: String,
    /// How far the balance sits above the type's effective minimum.
    pub above_minimum: i64,
}

/// Leaderboard response.
#[derive(Debug, Clone, Deserialize)]
pub struct TopUsersResponse {
    /// User ids ordered by balance descending.
    pub users: Vec<u64>,
}

/// Filters for listing transaction log entries.
#[derive(Debug, Clone, Default)]
pub struct LogsQuery {
    /// Only entries for this user.
    pub user_id: Option<u64>,
    /// Only entries for this points type.
    pub points_type: Option<String>,
    /// Only entries with this transaction kind.
    pub kind: Option<String>,
    /// Maximum number of entries to return.
    pub limit: Option<usize>,
    /// Number of entries to skip.
    pub offset: Option<usize>,
}

impl LogsQuery {
    pub(crate) fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(user_id) = self.user_id {
            pairs.push(("user_id", user_id.to_string()));
        }
        if let Some(points_type) = &self.points_type {
            pairs.push(("points_type", points_type.clone()));
        }
        if let Some(kind) = &self.kind {
            pairs.push(("kind", kind.clone()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(offset) = self.offset {
            pairs.push(("offset", offset.to_string()));
        }
        pairs
    }
}

/// One transaction log entry.
#[derive(Debug, Clone, Deserialize)]
pub struct LogEntry {
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
    /// Timestamp (RFC 3339).
    pub created_at: String,
}

/// Log list response.
#[derive(Debug, Clone, Deserialize)]
pub struct ListLogsResponse {
    /// Log entries, newest first.
    pub logs: Vec<LogEntry>,
    /// Whether more entries match beyond this page.
    pub has_more: bool,
}

/// One log meta row.
#[derive(Debug, Clone, Deserialize)]
pub struct LogMetaRow {
    /// The meta key.
    pub key: String,
    /// The meta value.
    pub value: serde_json::Value,
}

/// Log meta response.
#[derive(Debug, Clone, Deserialize)]
pub struct LogMetaResponse {
    /// Meta rows in insertion order.
    pub meta: Vec<LogMetaRow>,
}

/// Log regeneration response.
#[derive(Debug, Clone, Deserialize)]
pub struct RegenerateResponse {
    /// Number of entries whose text was rewritten.
    pub rewritten: u64,
}

/// Points type settings, as sent to and returned by the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointsTypeSettings {
    /// Display name. The slug is derived from it at creation.
    pub name: String,
    /// Display prefix.
    #[serde(default)]
    pub prefix: String,
    /// Display suffix.
    #[serde(default)]
    pub suffix: String,
    /// Minimum balance override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<i64>,
    /// Balance storage key override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_key: Option<String>,
}

impl PointsTypeSettings {
    /// Settings with the given display name and defaults for the rest.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: String::new(),
            suffix: String::new(),
            minimum: None,
            storage_key: None,
        }
    }
}

/// Type list response.
#[derive(Debug, Clone, Deserialize)]
pub struct ListTypesResponse {
    /// Registered types keyed by slug.
    pub types: BTreeMap<String, PointsTypeSettings>,
}

/// Type creation response.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTypeResponse {
    /// The slug derived from the display name.
    pub slug: String,
}

/// Default points type response.
#[derive(Debug, Clone, Deserialize)]
pub struct DefaultTypeResponse {
    /// The default points type slug, if set.
    pub slug: Option<String>,
}

/// API error response body.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    /// The error payload.
    pub error: ApiErrorBody,
}

/// API error payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    /// Error code.
    pub code: String,
    /// Error message.
    pub message: String,
}
