//! Transaction log entry types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{LogId, TransactionKind, UserId};

/// Metadata attached to a transaction: arbitrary key/value pairs.
///
/// This is the map supplied by the caller of `alter`. Each pair becomes one
/// log meta row; duplicate keys can accumulate later through the meta API.
pub type MetaMap = BTreeMap<String, serde_json::Value>;

/// Tenant scope identifiers stamped onto every log row.
///
/// Multi-tenant (network-of-sites) deployments distinguish rows by the site
/// and network that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    /// The site within the network.
    pub site_id: u64,

    /// The network of sites.
    pub network_id: u64,
}

impl Default for Tenant {
    fn default() -> Self {
        Self {
            site_id: 1,
            network_id: 1,
        }
    }
}

/// An immutable transaction log entry.
///
/// The `text` field is the one exception to immutability: it may be
/// regenerated in place from the stored kind and metadata without changing
/// the entry's identity or any other field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Monotonic numeric id, assigned at insert.
    pub id: LogId,

    /// The user whose balance changed.
    pub user_id: UserId,

    /// The points type slug this entry is scoped to.
    pub points_type: String,

    /// The delta actually applied, after any minimum clamp.
    pub delta: i64,

    /// The transaction kind that classifies this change.
    pub kind: TransactionKind,

    /// Rendered human-readable description.
    pub text: String,

    /// When the entry was written.
    pub timestamp: DateTime<Utc>,

    /// Tenant scope of the originating request.
    pub tenant: Tenant,
}

/// A log entry about to be inserted; the id is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewLogEntry {
    /// The user whose balance changed.
    pub user_id: UserId,

    /// The points type slug.
    pub points_type: String,

    /// The applied delta.
    pub delta: i64,

    /// The transaction kind.
    pub kind: TransactionKind,

    /// Rendered description.
    pub text: String,

    /// Tenant scope.
    pub tenant: Tenant,
}

/// Filters for querying the transaction log.
///
/// All filters are conjunctive; unset fields match everything. Results are
/// returned newest first.
#[derive(Debug, Clone, Default)]
pub struct LogQuery {
    /// Only entries for this user.
    pub user_id: Option<UserId>,

    /// Only entries for this points type slug.
    pub points_type: Option<String>,

    /// Only entries with this transaction kind.
    pub kind: Option<TransactionKind>,

    /// Maximum number of entries to return. `None` means no limit.
    pub limit: Option<usize>,

    /// Number of matching entries to skip.
    pub offset: usize,
}

impl LogQuery {
    /// A query matching every entry for one points type.
    #[must_use]
    pub fn for_points_type(slug: impl Into<String>) -> Self {
        Self {
            points_type: Some(slug.into()),
            ..Self::default()
        }
    }

    /// A query matching every entry for one user.
    #[must_use]
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    /// Whether an entry passes the field filters (limit/offset excluded).
    #[must_use]
    pub fn matches(&self, entry: &LogEntry) -> bool {
        if self.user_id.is_some_and(|u| u != entry.user_id) {
            return false;
        }
        if self
            .points_type
            .as_deref()
            .is_some_and(|t| t != entry.points_type)
        {
            return false;
        }
        if self.kind.as_ref().is_some_and(|k| *k != entry.kind) {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(user: u64, points_type: &str, kind: &str) -> LogEntry {
        LogEntry {
            id: LogId::new(1),
            user_id: UserId::new(user).unwrap(),
            points_type: points_type.to_string(),
            delta: 10,
            kind: TransactionKind::new(kind).unwrap(),
            text: String::new(),
            timestamp: Utc::now(),
            tenant: Tenant::default(),
        }
    }

    #[test]
    fn empty_query_matches_everything() {
        let q = LogQuery::default();
        assert!(q.matches(&entry(1, "points", "test")));
    }

    #[test]
    fn query_filters_are_conjunctive() {
        let mut q = LogQuery::for_points_type("points");
        q.user_id = Some(UserId::new(2).unwrap());

        assert!(q.matches(&entry(2, "points", "test")));
        assert!(!q.matches(&entry(2, "credits", "test")));
        assert!(!q.matches(&entry(3, "points", "test")));
    }

    #[test]
    fn query_filters_by_kind() {
        let mut q = LogQuery::default();
        q.kind = Some(TransactionKind::new("purchase").unwrap());

        assert!(q.matches(&entry(1, "points", "purchase")));
        assert!(!q.matches(&entry(1, "points", "refund")));
    }
}
