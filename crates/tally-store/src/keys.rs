//! Key encoding utilities for `RocksDB`.
//!
//! All multi-part keys use big-endian integer encodings so that the natural
//! `RocksDB` key order matches numeric order.

use tally_core::{LogId, UserId};

/// Separator between the storage-key namespace and the user id in balance
/// keys. Storage keys are slug-derived strings and never contain NUL.
const NS_SEP: u8 = 0;

/// Create a balance row key: `storage_key || 0x00 || user_id`.
#[must_use]
pub fn balance_key(storage_key: &str, user_id: UserId) -> Vec<u8> {
    let mut key = Vec::with_capacity(storage_key.len() + 9);
    key.extend_from_slice(storage_key.as_bytes());
    key.push(NS_SEP);
    key.extend_from_slice(&user_id.to_be_bytes());
    key
}

/// Create the prefix for iterating all balance rows under a storage key.
#[must_use]
pub fn balance_prefix(storage_key: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(storage_key.len() + 1);
    prefix.extend_from_slice(storage_key.as_bytes());
    prefix.push(NS_SEP);
    prefix
}

/// Extract the user id from a balance row key.
///
/// Returns `None` if the key is malformed or the id is zero.
#[must_use]
pub fn user_id_from_balance_key(key: &[u8]) -> Option<UserId> {
    if key.len() < 9 {
        return None;
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&key[key.len() - 8..]);
    UserId::from_be_bytes(bytes).ok()
}

/// Create a log entry key from a log id.
#[must_use]
pub fn log_key(log_id: LogId) -> [u8; 8] {
    log_id.to_be_bytes()
}

/// Create a user-log index key: `user_id (8 bytes) || log_id (8 bytes)`.
///
/// Log ids are monotonic, so a user's index entries are sorted by time.
#[must_use]
pub fn user_log_key(user_id: UserId, log_id: LogId) -> Vec<u8> {
    let mut key = Vec::with_capacity(16);
    key.extend_from_slice(&user_id.to_be_bytes());
    key.extend_from_slice(&log_id.to_be_bytes());
    key
}

/// Create the prefix for iterating all log index entries for a user.
#[must_use]
pub fn user_logs_prefix(user_id: UserId) -> Vec<u8> {
    user_id.to_be_bytes().to_vec()
}

/// Extract the log id from a user-log index key.
///
/// # Panics
///
/// Panics if the key is not at least 16 bytes.
#[must_use]
pub fn log_id_from_user_key(key: &[u8]) -> LogId {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&key[8..16]);
    LogId::from_be_bytes(bytes)
}

/// Create a log meta row key: `log_id (8 bytes) || seq (8 bytes)`.
#[must_use]
pub fn log_meta_key(log_id: LogId, seq: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(16);
    key.extend_from_slice(&log_id.to_be_bytes());
    key.extend_from_slice(&seq.to_be_bytes());
    key
}

/// Create the prefix for iterating all meta rows of one log entry.
#[must_use]
pub fn log_meta_prefix(log_id: LogId) -> Vec<u8> {
    log_id.to_be_bytes().to_vec()
}

/// Extract the sequence number from a log meta row key.
///
/// # Panics
///
/// Panics if the key is not at least 16 bytes.
#[must_use]
pub fn seq_from_log_meta_key(key: &[u8]) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&key[8..16]);
    u64::from_be_bytes(bytes)
}

/// Settings key for the points-type registry document of a tenant scope.
#[must_use]
pub fn points_types_key(network_id: u64) -> String {
    format!("points_types:{network_id}")
}

/// Settings key for the default points type slug of a tenant scope.
#[must_use]
pub fn default_points_type_key(network_id: u64) -> String {
    format!("default_points_type:{network_id}")
}
