//! `RocksDB` storage layer for the tally points ledger.
//!
//! This crate provides persistent storage for balances, transaction log
//! entries, log metadata, and points-type settings documents, using
//! `RocksDB` with column families for efficient indexing.
//!
//! # Architecture
//!
//! The storage uses the following column families:
//!
//! - `balances`: Balance rows keyed by `(storage_key, user_id)`, mutated via
//!   a clamped-add merge operator so concurrent deltas never lose updates
//! - `logs`: Transaction log entries, keyed by big-endian `log_id`
//! - `logs_by_user`: Index for listing log entries by user
//! - `log_meta`: Metadata rows attached to log entries
//! - `settings`: Tenant-scoped aggregate documents (points-type registry,
//!   default points type)
//!
//! # Example
//!
//! ```no_run
//! use tally_store::{RocksStore, Store};
//! use tally_core::UserId;
//!
//! let store = RocksStore::open("/tmp/tally-db").unwrap();
//!
//! let user = UserId::new(7).unwrap();
//! store.apply_delta("tally_points-points", user, 10, 0).unwrap();
//! assert_eq!(store.balance("tally_points-points", user).unwrap(), Some(10));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use rocks::RocksStore;

use std::collections::BTreeMap;

use tally_core::{LogEntry, LogId, LogQuery, NewLogEntry, PointsType, UserId};

/// The storage trait defining all database operations.
///
/// This trait abstracts the storage layer, allowing for different
/// implementations. The ledger engine only ever talks to a `dyn Store`.
pub trait Store: Send + Sync {
    // =========================================================================
    // Balance Operations
    // =========================================================================

    /// Apply a delta to a balance row, clamped to `minimum`. Returns the
    /// balance after the merge.
    ///
    /// If no row exists for `(storage_key, user_id)`, the row is created with
    /// `delta` as its initial value. Otherwise the new value is
    /// `max(old + delta, minimum)`, computed atomically inside the storage
    /// engine rather than by an application-side read-modify-write, so
    /// concurrent deltas to the same row cannot lose updates.
    ///
    /// # Errors
    ///
    /// Returns an error only on a genuine database failure; an unchanged
    /// value is not an error.
    fn apply_delta(&self, storage_key: &str, user_id: UserId, delta: i64, minimum: i64)
        -> Result<i64>;

    /// Get a balance. `Ok(None)` means no row exists yet, which callers
    /// treat as a balance of zero once the points type itself is known valid.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn balance(&self, storage_key: &str, user_id: UserId) -> Result<Option<i64>>;

    /// List `(user_id, balance)` pairs under a storage key, ordered by
    /// balance descending (numeric) with ties broken by user id ascending,
    /// skipping `offset` rows and returning at most `limit`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn top_balances(
        &self,
        storage_key: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<(UserId, i64)>>;

    /// Delete one user's balance row under a storage key, if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn delete_balance(&self, storage_key: &str, user_id: UserId) -> Result<()>;

    /// Delete every balance row under a storage key. Returns the number of
    /// rows removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn delete_balances(&self, storage_key: &str) -> Result<u64>;

    // =========================================================================
    // Transaction Log Operations
    // =========================================================================

    /// Insert a log entry, assigning it the next monotonic id. The user
    /// index entry is written in the same atomic batch. Returns the id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn insert_log(&self, entry: &NewLogEntry) -> Result<LogId>;

    /// Get a log entry by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_log(&self, log_id: LogId) -> Result<Option<LogEntry>>;

    /// Query log entries, newest first, honoring the query's filters,
    /// offset, and limit.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn query_logs(&self, query: &LogQuery) -> Result<Vec<LogEntry>>;

    /// Overwrite the rendered text of a log entry in place. Identity and all
    /// other fields are untouched.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the entry doesn't exist.
    fn update_log_text(&self, log_id: LogId, text: &str) -> Result<()>;

    /// Delete a log entry along with its index entry and all its meta rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn delete_log(&self, log_id: LogId) -> Result<()>;

    /// Delete every log entry matching the query's field filters (limit and
    /// offset are ignored), cascading to index and meta rows. Returns the
    /// number of entries removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn delete_logs(&self, query: &LogQuery) -> Result<u64>;

    // =========================================================================
    // Log Meta Operations
    // =========================================================================

    /// Attach a `(key, value)` pair to a log entry. Duplicate keys are
    /// permitted; each call adds a new row.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn add_log_meta(&self, log_id: LogId, key: &str, value: &serde_json::Value) -> Result<()>;

    /// All `(key, value)` pairs attached to a log entry, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn log_meta(&self, log_id: LogId) -> Result<Vec<(String, serde_json::Value)>>;

    /// All values attached to a log entry under one meta key.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn log_meta_values(&self, log_id: LogId, key: &str) -> Result<Vec<serde_json::Value>>;

    /// Update meta rows matching `(log_id, key)` to a new value. When
    /// `previous` is given, only rows currently holding that value are
    /// updated; this is the caller's tool for enforcing last-write-wins.
    /// Returns the number of rows updated.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn update_log_meta(
        &self,
        log_id: LogId,
        key: &str,
        value: &serde_json::Value,
        previous: Option<&serde_json::Value>,
    ) -> Result<u64>;

    /// Delete meta rows of a log entry, optionally narrowed to one key and
    /// further to one value. Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn delete_log_meta(
        &self,
        log_id: LogId,
        key: Option<&str>,
        value: Option<&serde_json::Value>,
    ) -> Result<u64>;

    // =========================================================================
    // Points-Type Settings Documents
    // =========================================================================

    /// Load the points-type registry document for a tenant scope. An absent
    /// document is an empty registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_points_types(&self, network_id: u64) -> Result<BTreeMap<String, PointsType>>;

    /// Replace the points-type registry document for a tenant scope.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_points_types(
        &self,
        network_id: u64,
        types: &BTreeMap<String, PointsType>,
    ) -> Result<()>;

    /// Get the default points type slug for a tenant scope, if set.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_default_points_type(&self, network_id: u64) -> Result<Option<String>>;

    /// Set or clear the default points type slug for a tenant scope.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_default_points_type(&self, network_id: u64, slug: Option<&str>) -> Result<()>;
}
