//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store`
//! trait. Balance mutation is the one operation with a concurrency
//! contract: it is expressed as a `RocksDB` merge so the clamped increment
//! `max(old + delta, minimum)` happens inside the engine, the same way the
//! original SQL formulation used a single `UPDATE ... GREATEST(...)`.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode,
    MergeOperands, MultiThreaded, Options, WriteBatch,
};
use serde::{Deserialize, Serialize};

use tally_core::{LogEntry, LogId, LogQuery, NewLogEntry, PointsType, UserId};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::Store;

/// One stored log meta row: the pair itself, since the row key only carries
/// `(log_id, seq)`.
#[derive(Debug, Serialize, Deserialize)]
struct MetaRow {
    key: String,
    value: serde_json::Value,
}

/// A clamped-add merge operand: `delta (8 bytes BE) || minimum (8 bytes BE)`.
fn encode_operand(delta: i64, minimum: i64) -> [u8; 16] {
    let mut buf = [0u8; 16];
    buf[..8].copy_from_slice(&delta.to_be_bytes());
    buf[8..].copy_from_slice(&minimum.to_be_bytes());
    buf
}

fn decode_operand(op: &[u8]) -> Option<(i64, i64)> {
    if op.len() != 16 {
        return None;
    }
    let mut delta = [0u8; 8];
    let mut minimum = [0u8; 8];
    delta.copy_from_slice(&op[..8]);
    minimum.copy_from_slice(&op[8..]);
    Some((i64::from_be_bytes(delta), i64::from_be_bytes(minimum)))
}

fn decode_balance(value: &[u8]) -> Option<i64> {
    let bytes: [u8; 8] = value.try_into().ok()?;
    Some(i64::from_be_bytes(bytes))
}

/// Full merge for the balances column family.
///
/// A missing base row means create-if-absent: the first operand's delta
/// becomes the initial value verbatim. Every subsequent operand is a clamped
/// increment. Malformed operands are skipped rather than poisoning the row.
fn clamped_add_full(
    _key: &[u8],
    existing: Option<&[u8]>,
    operands: &MergeOperands,
) -> Option<Vec<u8>> {
    let mut value = existing.and_then(decode_balance);

    for op in operands {
        let Some((delta, minimum)) = decode_operand(op) else {
            continue;
        };
        value = Some(match value {
            None => delta,
            Some(v) => v.saturating_add(delta).max(minimum),
        });
    }

    value.map(|v| v.to_be_bytes().to_vec())
}

/// Partial merge is declined: two clamped increments with different minimums
/// cannot be folded into one operand without the base value.
fn clamped_add_partial(
    _key: &[u8],
    _existing: Option<&[u8]>,
    _operands: &MergeOperands,
) -> Option<Vec<u8>> {
    None
}

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,

    /// Next log entry id. Seeded from the last key in the logs column family
    /// at open; RocksDB holds a process lock on the database, so a single
    /// counter is sufficient for id monotonicity.
    next_log_id: AtomicU64,

    /// Serializes meta-row sequence allocation for a single log entry.
    meta_write_lock: Mutex<()>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| {
                let mut cf_opts = Options::default();
                if name == cf::BALANCES {
                    cf_opts.set_merge_operator(
                        "tally_clamped_add",
                        clamped_add_full,
                        clamped_add_partial,
                    );
                }
                ColumnFamilyDescriptor::new(name, cf_opts)
            })
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        let db = Arc::new(db);

        let next_log_id = last_log_id(&db)?.map_or(1, |id| id.get() + 1);
        tracing::debug!(next_log_id, "opened tally store");

        Ok(Self {
            db,
            next_log_id: AtomicU64::new(next_log_id),
            meta_write_lock: Mutex::new(()),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// All meta rows of a log entry with their row keys, in key order.
    fn log_meta_rows(&self, log_id: LogId) -> Result<Vec<(Vec<u8>, MetaRow)>> {
        let cf = self.cf(cf::LOG_META)?;
        let prefix = keys::log_meta_prefix(log_id);

        let mut rows = Vec::new();
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(&prefix, Direction::Forward));

        for item in iter {
            let (key, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }
            rows.push((key.to_vec(), Self::deserialize(&value)?));
        }

        Ok(rows)
    }

    /// Log entries matching the query's field filters, ascending by id.
    fn scan_logs(&self, query: &LogQuery) -> Result<Vec<LogEntry>> {
        let mut entries = Vec::new();

        if let Some(user_id) = query.user_id {
            // Walk the per-user index instead of the whole log.
            let cf_index = self.cf(cf::LOGS_BY_USER)?;
            let prefix = keys::user_logs_prefix(user_id);
            let iter = self
                .db
                .iterator_cf(&cf_index, IteratorMode::From(&prefix, Direction::Forward));

            for item in iter {
                let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
                if !key.starts_with(&prefix) {
                    break;
                }
                let log_id = keys::log_id_from_user_key(&key);
                if let Some(entry) = self.get_log(log_id)? {
                    if query.matches(&entry) {
                        entries.push(entry);
                    }
                }
            }
        } else {
            let cf_logs = self.cf(cf::LOGS)?;
            for item in self.db.iterator_cf(&cf_logs, IteratorMode::Start) {
                let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
                let entry: LogEntry = Self::deserialize(&value)?;
                if query.matches(&entry) {
                    entries.push(entry);
                }
            }
        }

        Ok(entries)
    }

    /// Delete one log entry's row, index entry, and meta rows into a batch.
    fn delete_log_into_batch(&self, entry: &LogEntry, batch: &mut WriteBatch) -> Result<()> {
        let cf_logs = self.cf(cf::LOGS)?;
        let cf_index = self.cf(cf::LOGS_BY_USER)?;
        let cf_meta = self.cf(cf::LOG_META)?;

        batch.delete_cf(&cf_logs, keys::log_key(entry.id));
        batch.delete_cf(&cf_index, keys::user_log_key(entry.user_id, entry.id));

        for (key, _) in self.log_meta_rows(entry.id)? {
            batch.delete_cf(&cf_meta, key);
        }

        Ok(())
    }
}

/// The id of the last inserted log entry, if any.
fn last_log_id(db: &DBWithThreadMode<MultiThreaded>) -> Result<Option<LogId>> {
    let cf = db
        .cf_handle(cf::LOGS)
        .ok_or_else(|| StoreError::Database("column family not found: logs".into()))?;

    match db.iterator_cf(&cf, IteratorMode::End).next() {
        Some(item) => {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            let bytes: [u8; 8] = key
                .as_ref()
                .try_into()
                .map_err(|_| StoreError::Database("malformed log key".into()))?;
            Ok(Some(LogId::from_be_bytes(bytes)))
        }
        None => Ok(None),
    }
}

impl Store for RocksStore {
    // =========================================================================
    // Balance Operations
    // =========================================================================

    fn apply_delta(
        &self,
        storage_key: &str,
        user_id: UserId,
        delta: i64,
        minimum: i64,
    ) -> Result<i64> {
        let cf = self.cf(cf::BALANCES)?;
        let key = keys::balance_key(storage_key, user_id);

        self.db
            .merge_cf(&cf, &key, encode_operand(delta, minimum))
            .map_err(|e| StoreError::Database(e.to_string()))?;

        // Read back the merged value. Another writer may have merged in
        // between, in which case this reports their later balance, which is
        // still a balance the row actually held.
        let value = self
            .db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .and_then(|bytes| decode_balance(&bytes));

        value.ok_or(StoreError::NotFound)
    }

    fn balance(&self, storage_key: &str, user_id: UserId) -> Result<Option<i64>> {
        let cf = self.cf(cf::BALANCES)?;
        let key = keys::balance_key(storage_key, user_id);

        let value = self
            .db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        match value {
            Some(data) => decode_balance(&data)
                .map(Some)
                .ok_or_else(|| StoreError::Serialization("malformed balance value".into())),
            None => Ok(None),
        }
    }

    fn top_balances(
        &self,
        storage_key: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<(UserId, i64)>> {
        let cf = self.cf(cf::BALANCES)?;
        let prefix = keys::balance_prefix(storage_key);

        let mut rows: Vec<(UserId, i64)> = Vec::new();
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(&prefix, Direction::Forward));

        for item in iter {
            let (key, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }
            let Some(user_id) = keys::user_id_from_balance_key(&key) else {
                continue;
            };
            let balance = decode_balance(&value)
                .ok_or_else(|| StoreError::Serialization("malformed balance value".into()))?;
            rows.push((user_id, balance));
        }

        // Numeric ordering, not key order: balances are signed.
        rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }

    fn delete_balance(&self, storage_key: &str, user_id: UserId) -> Result<()> {
        let cf = self.cf(cf::BALANCES)?;
        self.db
            .delete_cf(&cf, keys::balance_key(storage_key, user_id))
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn delete_balances(&self, storage_key: &str) -> Result<u64> {
        let cf = self.cf(cf::BALANCES)?;
        let prefix = keys::balance_prefix(storage_key);

        let mut batch = WriteBatch::default();
        let mut removed = 0u64;
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(&prefix, Direction::Forward));

        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }
            batch.delete_cf(&cf, key);
            removed += 1;
        }

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(removed)
    }

    // =========================================================================
    // Transaction Log Operations
    // =========================================================================

    fn insert_log(&self, entry: &NewLogEntry) -> Result<LogId> {
        let cf_logs = self.cf(cf::LOGS)?;
        let cf_index = self.cf(cf::LOGS_BY_USER)?;

        let log_id = LogId::new(self.next_log_id.fetch_add(1, Ordering::SeqCst));

        let stored = LogEntry {
            id: log_id,
            user_id: entry.user_id,
            points_type: entry.points_type.clone(),
            delta: entry.delta,
            kind: entry.kind.clone(),
            text: entry.text.clone(),
            timestamp: chrono::Utc::now(),
            tenant: entry.tenant,
        };
        let value = Self::serialize(&stored)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_logs, keys::log_key(log_id), &value);
        batch.put_cf(&cf_index, keys::user_log_key(entry.user_id, log_id), []);

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(log_id)
    }

    fn get_log(&self, log_id: LogId) -> Result<Option<LogEntry>> {
        let cf = self.cf(cf::LOGS)?;

        self.db
            .get_cf(&cf, keys::log_key(log_id))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn query_logs(&self, query: &LogQuery) -> Result<Vec<LogEntry>> {
        let mut entries = self.scan_logs(query)?;

        // Ids are monotonic, so reversing gives newest first.
        entries.reverse();

        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(entries.into_iter().skip(query.offset).take(limit).collect())
    }

    fn update_log_text(&self, log_id: LogId, text: &str) -> Result<()> {
        let cf = self.cf(cf::LOGS)?;

        let mut entry = self.get_log(log_id)?.ok_or(StoreError::NotFound)?;
        entry.text = text.to_string();

        let value = Self::serialize(&entry)?;
        self.db
            .put_cf(&cf, keys::log_key(log_id), value)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn delete_log(&self, log_id: LogId) -> Result<()> {
        let Some(entry) = self.get_log(log_id)? else {
            return Ok(());
        };

        let mut batch = WriteBatch::default();
        self.delete_log_into_batch(&entry, &mut batch)?;

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn delete_logs(&self, query: &LogQuery) -> Result<u64> {
        let entries = self.scan_logs(query)?;

        let mut batch = WriteBatch::default();
        for entry in &entries {
            self.delete_log_into_batch(entry, &mut batch)?;
        }

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(entries.len() as u64)
    }

    // =========================================================================
    // Log Meta Operations
    // =========================================================================

    fn add_log_meta(&self, log_id: LogId, key: &str, value: &serde_json::Value) -> Result<()> {
        let cf = self.cf(cf::LOG_META)?;
        let row = Self::serialize(&MetaRow {
            key: key.to_string(),
            value: value.clone(),
        })?;

        // Sequence allocation scans for the current tail; hold the lock so
        // two writers cannot pick the same slot.
        let _guard = self
            .meta_write_lock
            .lock()
            .map_err(|_| StoreError::Database("meta write lock poisoned".into()))?;

        let next_seq = self
            .log_meta_rows(log_id)?
            .last()
            .map_or(0, |(key, _)| keys::seq_from_log_meta_key(key) + 1);

        self.db
            .put_cf(&cf, keys::log_meta_key(log_id, next_seq), row)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn log_meta(&self, log_id: LogId) -> Result<Vec<(String, serde_json::Value)>> {
        Ok(self
            .log_meta_rows(log_id)?
            .into_iter()
            .map(|(_, row)| (row.key, row.value))
            .collect())
    }

    fn log_meta_values(&self, log_id: LogId, key: &str) -> Result<Vec<serde_json::Value>> {
        Ok(self
            .log_meta_rows(log_id)?
            .into_iter()
            .filter(|(_, row)| row.key == key)
            .map(|(_, row)| row.value)
            .collect())
    }

    fn update_log_meta(
        &self,
        log_id: LogId,
        key: &str,
        value: &serde_json::Value,
        previous: Option<&serde_json::Value>,
    ) -> Result<u64> {
        let cf = self.cf(cf::LOG_META)?;

        let mut batch = WriteBatch::default();
        let mut updated = 0u64;

        for (row_key, row) in self.log_meta_rows(log_id)? {
            if row.key != key {
                continue;
            }
            if previous.is_some_and(|p| *p != row.value) {
                continue;
            }
            let new_row = Self::serialize(&MetaRow {
                key: row.key,
                value: value.clone(),
            })?;
            batch.put_cf(&cf, row_key, new_row);
            updated += 1;
        }

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(updated)
    }

    fn delete_log_meta(
        &self,
        log_id: LogId,
        key: Option<&str>,
        value: Option<&serde_json::Value>,
    ) -> Result<u64> {
        let cf = self.cf(cf::LOG_META)?;

        let mut batch = WriteBatch::default();
        let mut removed = 0u64;

        for (row_key, row) in self.log_meta_rows(log_id)? {
            if key.is_some_and(|k| k != row.key) {
                continue;
            }
            if value.is_some_and(|v| *v != row.value) {
                continue;
            }
            batch.delete_cf(&cf, row_key);
            removed += 1;
        }

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(removed)
    }

    // =========================================================================
    // Points-Type Settings Documents
    // =========================================================================

    fn get_points_types(&self, network_id: u64) -> Result<BTreeMap<String, PointsType>> {
        let cf = self.cf(cf::SETTINGS)?;

        self.db
            .get_cf(&cf, keys::points_types_key(network_id))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map_or_else(|| Ok(BTreeMap::new()), |data| Self::deserialize(&data))
    }

    fn put_points_types(
        &self,
        network_id: u64,
        types: &BTreeMap<String, PointsType>,
    ) -> Result<()> {
        let cf = self.cf(cf::SETTINGS)?;
        let value = Self::serialize(types)?;

        self.db
            .put_cf(&cf, keys::points_types_key(network_id), value)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn get_default_points_type(&self, network_id: u64) -> Result<Option<String>> {
        let cf = self.cf(cf::SETTINGS)?;

        let value = self
            .db
            .get_cf(&cf, keys::default_points_type_key(network_id))
            .map_err(|e| StoreError::Database(e.to_string()))?;

        match value {
            Some(data) => String::from_utf8(data)
                .map(Some)
                .map_err(|e| StoreError::Serialization(e.to_string())),
            None => Ok(None),
        }
    }

    fn put_default_points_type(&self, network_id: u64, slug: Option<&str>) -> Result<()> {
        let cf = self.cf(cf::SETTINGS)?;
        let key = keys::default_points_type_key(network_id);

        match slug {
            Some(slug) => self.db.put_cf(&cf, key, slug.as_bytes()),
            None => self.db.delete_cf(&cf, key),
        }
        .map_err(|e| StoreError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tally_core::{Tenant, TransactionKind};
    use tempfile::TempDir;

    const STORAGE_KEY: &str = "tally_points-points";

    fn create_test_store() -> (RocksStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = RocksStore::open(dir.path()).unwrap();
        (store, dir)
    }

    fn user(raw: u64) -> UserId {
        UserId::new(raw).unwrap()
    }

    fn new_log(user_id: u64, points_type: &str, delta: i64, kind: &str) -> NewLogEntry {
        NewLogEntry {
            user_id: user(user_id),
            points_type: points_type.to_string(),
            delta,
            kind: TransactionKind::new(kind).unwrap(),
            text: format!("{kind}: {delta}"),
            tenant: Tenant::default(),
        }
    }

    #[test]
    fn apply_delta_creates_row_with_raw_delta() {
        let (store, _dir) = create_test_store();

        assert_eq!(store.apply_delta(STORAGE_KEY, user(7), 10, 0).unwrap(), 10);
        assert_eq!(store.balance(STORAGE_KEY, user(7)).unwrap(), Some(10));
    }

    #[test]
    fn apply_delta_clamps_existing_row_to_minimum() {
        let (store, _dir) = create_test_store();

        store.apply_delta(STORAGE_KEY, user(7), 5, 0).unwrap();
        assert_eq!(store.apply_delta(STORAGE_KEY, user(7), -20, 0).unwrap(), 0);

        assert_eq!(store.balance(STORAGE_KEY, user(7)).unwrap(), Some(0));
    }

    #[test]
    fn apply_delta_respects_negative_minimum() {
        let (store, _dir) = create_test_store();

        store.apply_delta(STORAGE_KEY, user(7), 5, -100).unwrap();
        store.apply_delta(STORAGE_KEY, user(7), -20, -100).unwrap();

        assert_eq!(store.balance(STORAGE_KEY, user(7)).unwrap(), Some(-15));
    }

    #[test]
    fn absent_balance_is_distinct_from_zero() {
        let (store, _dir) = create_test_store();

        assert_eq!(store.balance(STORAGE_KEY, user(1)).unwrap(), None);

        store.apply_delta(STORAGE_KEY, user(1), 0, 0).unwrap();
        assert_eq!(store.balance(STORAGE_KEY, user(1)).unwrap(), Some(0));
    }

    #[test]
    fn concurrent_deltas_lose_no_updates() {
        let (store, _dir) = create_test_store();
        let store = std::sync::Arc::new(store);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        store.apply_delta(STORAGE_KEY, user(7), 1, 0).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.balance(STORAGE_KEY, user(7)).unwrap(), Some(800));
    }

    #[test]
    fn top_balances_orders_numerically_descending() {
        let (store, _dir) = create_test_store();

        store.apply_delta(STORAGE_KEY, user(1), 5, -100).unwrap();
        store.apply_delta(STORAGE_KEY, user(2), 1000, -100).unwrap();
        store.apply_delta(STORAGE_KEY, user(3), -50, -100).unwrap();
        store.apply_delta(STORAGE_KEY, user(4), 30, -100).unwrap();

        let top = store.top_balances(STORAGE_KEY, 0, 10).unwrap();
        let users: Vec<u64> = top.iter().map(|(u, _)| u.get()).collect();
        assert_eq!(users, vec![2, 4, 1, 3]);

        // Offset fetches the missing suffix only.
        let suffix = store.top_balances(STORAGE_KEY, 2, 2).unwrap();
        let users: Vec<u64> = suffix.iter().map(|(u, _)| u.get()).collect();
        assert_eq!(users, vec![1, 3]);
    }

    #[test]
    fn top_balances_scoped_to_storage_key() {
        let (store, _dir) = create_test_store();

        store.apply_delta(STORAGE_KEY, user(1), 5, 0).unwrap();
        store.apply_delta("tally_points-karma", user(2), 50, 0).unwrap();

        let top = store.top_balances(STORAGE_KEY, 0, 10).unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].0, user(1));
    }

    #[test]
    fn delete_balances_removes_only_one_namespace() {
        let (store, _dir) = create_test_store();

        store.apply_delta(STORAGE_KEY, user(1), 5, 0).unwrap();
        store.apply_delta(STORAGE_KEY, user(2), 6, 0).unwrap();
        store.apply_delta("tally_points-karma", user(1), 7, 0).unwrap();

        assert_eq!(store.delete_balances(STORAGE_KEY).unwrap(), 2);
        assert_eq!(store.balance(STORAGE_KEY, user(1)).unwrap(), None);
        assert_eq!(
            store.balance("tally_points-karma", user(1)).unwrap(),
            Some(7)
        );
    }

    #[test]
    fn insert_log_assigns_monotonic_ids() {
        let (store, _dir) = create_test_store();

        let first = store.insert_log(&new_log(1, "points", 10, "test")).unwrap();
        let second = store.insert_log(&new_log(1, "points", -5, "spend")).unwrap();

        assert!(second > first);

        let entry = store.get_log(first).unwrap().unwrap();
        assert_eq!(entry.delta, 10);
        assert_eq!(entry.kind.as_str(), "test");
    }

    #[test]
    fn log_ids_survive_reopen() {
        let dir = TempDir::new().unwrap();

        let first = {
            let store = RocksStore::open(dir.path()).unwrap();
            store.insert_log(&new_log(1, "points", 10, "test")).unwrap()
        };

        let store = RocksStore::open(dir.path()).unwrap();
        let second = store.insert_log(&new_log(1, "points", 5, "test")).unwrap();

        assert!(second > first);
        assert!(store.get_log(first).unwrap().is_some());
    }

    #[test]
    fn query_logs_newest_first_with_pagination() {
        let (store, _dir) = create_test_store();

        for delta in 1..=5 {
            store
                .insert_log(&new_log(1, "points", delta, "test"))
                .unwrap();
        }
        store.insert_log(&new_log(2, "points", 99, "test")).unwrap();

        let mut query = LogQuery::for_user(user(1));
        query.limit = Some(2);

        let page = store.query_logs(&query).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].delta, 5);
        assert_eq!(page[1].delta, 4);

        query.offset = 2;
        let page = store.query_logs(&query).unwrap();
        assert_eq!(page[0].delta, 3);
        assert_eq!(page[1].delta, 2);
    }

    #[test]
    fn query_logs_filters_by_type_and_kind() {
        let (store, _dir) = create_test_store();

        store.insert_log(&new_log(1, "points", 1, "register")).unwrap();
        store.insert_log(&new_log(1, "karma", 2, "register")).unwrap();
        store.insert_log(&new_log(1, "points", 3, "purchase")).unwrap();

        let mut query = LogQuery::for_points_type("points");
        query.kind = Some(TransactionKind::new("register").unwrap());

        let entries = store.query_logs(&query).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].delta, 1);
    }

    #[test]
    fn update_log_text_preserves_identity() {
        let (store, _dir) = create_test_store();

        let id = store.insert_log(&new_log(1, "points", 10, "test")).unwrap();
        store.update_log_text(id, "regenerated").unwrap();

        let entry = store.get_log(id).unwrap().unwrap();
        assert_eq!(entry.text, "regenerated");
        assert_eq!(entry.id, id);
        assert_eq!(entry.delta, 10);
    }

    #[test]
    fn update_log_text_missing_entry_is_not_found() {
        let (store, _dir) = create_test_store();
        let result = store.update_log_text(LogId::new(999), "text");
        assert!(matches!(result, Err(StoreError::NotFound)));
    }

    #[test]
    fn meta_allows_duplicate_keys() {
        let (store, _dir) = create_test_store();
        let id = store.insert_log(&new_log(1, "points", 10, "test")).unwrap();

        store.add_log_meta(id, "badge", &json!("gold")).unwrap();
        store.add_log_meta(id, "badge", &json!("silver")).unwrap();
        store.add_log_meta(id, "source", &json!("quiz")).unwrap();

        let all = store.log_meta(id).unwrap();
        assert_eq!(all.len(), 3);

        let badges = store.log_meta_values(id, "badge").unwrap();
        assert_eq!(badges, vec![json!("gold"), json!("silver")]);
    }

    #[test]
    fn update_meta_with_previous_guard() {
        let (store, _dir) = create_test_store();
        let id = store.insert_log(&new_log(1, "points", 10, "test")).unwrap();

        store.add_log_meta(id, "state", &json!("pending")).unwrap();
        store.add_log_meta(id, "state", &json!("failed")).unwrap();

        // Only the row holding "pending" is rewritten.
        let updated = store
            .update_log_meta(id, "state", &json!("done"), Some(&json!("pending")))
            .unwrap();
        assert_eq!(updated, 1);

        let values = store.log_meta_values(id, "state").unwrap();
        assert!(values.contains(&json!("done")));
        assert!(values.contains(&json!("failed")));

        // Unguarded update rewrites every row under the key.
        let updated = store
            .update_log_meta(id, "state", &json!("reset"), None)
            .unwrap();
        assert_eq!(updated, 2);
    }

    #[test]
    fn delete_meta_narrowed_by_key_and_value() {
        let (store, _dir) = create_test_store();
        let id = store.insert_log(&new_log(1, "points", 10, "test")).unwrap();

        store.add_log_meta(id, "badge", &json!("gold")).unwrap();
        store.add_log_meta(id, "badge", &json!("silver")).unwrap();
        store.add_log_meta(id, "source", &json!("quiz")).unwrap();

        let removed = store
            .delete_log_meta(id, Some("badge"), Some(&json!("gold")))
            .unwrap();
        assert_eq!(removed, 1);

        let removed = store.delete_log_meta(id, Some("badge"), None).unwrap();
        assert_eq!(removed, 1);

        let removed = store.delete_log_meta(id, None, None).unwrap();
        assert_eq!(removed, 1);
        assert!(store.log_meta(id).unwrap().is_empty());
    }

    #[test]
    fn delete_log_cascades_to_index_and_meta() {
        let (store, _dir) = create_test_store();

        let id = store.insert_log(&new_log(1, "points", 10, "test")).unwrap();
        store.add_log_meta(id, "badge", &json!("gold")).unwrap();

        store.delete_log(id).unwrap();

        assert!(store.get_log(id).unwrap().is_none());
        assert!(store.log_meta(id).unwrap().is_empty());
        assert!(store
            .query_logs(&LogQuery::for_user(user(1)))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn delete_logs_by_type() {
        let (store, _dir) = create_test_store();

        let a = store.insert_log(&new_log(1, "points", 1, "test")).unwrap();
        let b = store.insert_log(&new_log(2, "points", 2, "test")).unwrap();
        let c = store.insert_log(&new_log(1, "karma", 3, "test")).unwrap();
        store.add_log_meta(a, "k", &json!(1)).unwrap();

        let removed = store
            .delete_logs(&LogQuery::for_points_type("points"))
            .unwrap();
        assert_eq!(removed, 2);

        assert!(store.get_log(a).unwrap().is_none());
        assert!(store.get_log(b).unwrap().is_none());
        assert!(store.get_log(c).unwrap().is_some());
        assert!(store.log_meta(a).unwrap().is_empty());
    }

    #[test]
    fn points_types_document_roundtrip() {
        let (store, _dir) = create_test_store();

        assert!(store.get_points_types(1).unwrap().is_empty());

        let mut types = BTreeMap::new();
        types.insert("points".to_string(), PointsType::named("Points"));
        store.put_points_types(1, &types).unwrap();

        let loaded = store.get_points_types(1).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded["points"].name, "Points");

        // A different tenant scope sees its own document.
        assert!(store.get_points_types(2).unwrap().is_empty());
    }

    #[test]
    fn default_points_type_roundtrip() {
        let (store, _dir) = create_test_store();

        assert_eq!(store.get_default_points_type(1).unwrap(), None);

        store.put_default_points_type(1, Some("points")).unwrap();
        assert_eq!(
            store.get_default_points_type(1).unwrap(),
            Some("points".to_string())
        );

        store.put_default_points_type(1, None).unwrap();
        assert_eq!(store.get_default_points_type(1).unwrap(), None);
    }
}
