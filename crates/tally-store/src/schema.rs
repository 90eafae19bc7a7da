//! Database schema definitions and column families.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Balance rows, keyed by `storage_key || 0x00 || user_id`.
    /// Values are big-endian `i64`; mutations go through the clamped-add
    /// merge operator.
    pub const BALANCES: &str = "balances";

    /// Transaction log entries, keyed by big-endian `log_id` so iteration
    /// order is insertion order.
    pub const LOGS: &str = "logs";

    /// Index: log entries by user, keyed by `user_id || log_id`.
    /// Value is empty (index only).
    pub const LOGS_BY_USER: &str = "logs_by_user";

    /// Log metadata rows, keyed by `log_id || seq`. Duplicate meta keys are
    /// permitted; each row stores its own `(key, value)` pair.
    pub const LOG_META: &str = "log_meta";

    /// Tenant-scoped settings documents: the points-type registry aggregate
    /// and the default points type slug.
    pub const SETTINGS: &str = "settings";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::BALANCES,
        cf::LOGS,
        cf::LOGS_BY_USER,
        cf::LOG_META,
        cf::SETTINGS,
    ]
}
