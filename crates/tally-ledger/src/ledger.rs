//! The ledger engine.
//!
//! [`Ledger::alter`] is the single write path for balances. Every mutation
//! flows through it: validation, the delta filter chain, the minimum clamp,
//! the atomic balance apply, transaction logging, cache invalidation, and
//! event emission, in that order. The derived operations (`add`, `subtract`,
//! `set`) are thin wrappers that compute a delta and delegate.

use std::sync::Arc;

use tally_core::{LogEntry, LogId, LogQuery, MetaMap, Tenant, TransactionKind, UserId};
use tally_store::Store;

use crate::error::{LedgerError, Result};
use crate::hooks::{AlterContext, AlteredEvent, DeltaDecision, Hooks, LoggedEvent};
use crate::leaderboard::LeaderboardCache;
use crate::render::{LogDetails, TextRenderer};
use crate::types_registry::PointsTypes;

/// The outcome of a successful alteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alteration {
    /// The delta actually applied, after filters and the minimum clamp.
    /// Zero when the alteration was a no-op.
    pub applied_delta: i64,

    /// The id of the transaction log entry, or `None` when the alteration
    /// was a no-op, logging was filtered off, or the log write failed.
    pub log_id: Option<LogId>,
}

/// The points ledger engine.
pub struct Ledger {
    store: Arc<dyn Store>,
    tenant: Tenant,
    hooks: Arc<Hooks>,
    renderer: TextRenderer,
    leaderboard: LeaderboardCache,
    types: PointsTypes,
}

impl Ledger {
    /// Assemble a ledger over a store, with the hook registry and log text
    /// formatters collected during startup.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, tenant: Tenant, hooks: Hooks, renderer: TextRenderer) -> Self {
        let hooks = Arc::new(hooks);
        let types = PointsTypes::new(Arc::clone(&store), tenant, Arc::clone(&hooks));
        Self {
            store,
            tenant,
            hooks,
            renderer,
            leaderboard: LeaderboardCache::new(),
            types,
        }
    }

    /// The points-type registry.
    #[must_use]
    pub fn points_types(&self) -> &PointsTypes {
        &self.types
    }

    /// Alter a user's balance by `delta` for one points type.
    ///
    /// The sequence is:
    ///
    /// 1. The points type is validated against the registry.
    /// 2. The delta filter chain runs. A rewrite to `0` returns a no-op
    ///    success without touching storage or firing events; an abort fails
    ///    with `InvalidArgument`.
    /// 3. The delta is clamped so the balance cannot settle below the type's
    ///    effective minimum, then applied atomically in the store (which
    ///    enforces the same clamp authoritatively against concurrent writes).
    /// 4. Unless the should-log chain says otherwise, a log entry is written
    ///    with the rendered description and one meta row per `meta` pair. A
    ///    log or meta write failure is reported via `tracing::warn!` and does
    ///    not fail the alteration.
    /// 5. The leaderboard cache entry for the type is dropped and listeners
    ///    are notified.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an unknown points type or a filter veto, in
    /// which case nothing was persisted; or a store error from the balance
    /// apply itself.
    pub fn alter(
        &self,
        user_id: UserId,
        points_type: &str,
        delta: i64,
        kind: &TransactionKind,
        meta: &MetaMap,
    ) -> Result<Alteration> {
        let settings = self.types.get(points_type)?.ok_or_else(|| {
            LedgerError::invalid(format!("unknown points type: {points_type}"))
        })?;

        let ctx = AlterContext {
            user_id,
            points_type,
            kind,
            meta,
        };

        let delta = match self.hooks.filter_delta(delta, &ctx) {
            DeltaDecision::Proceed(0) => {
                return Ok(Alteration {
                    applied_delta: 0,
                    log_id: None,
                })
            }
            DeltaDecision::Proceed(delta) => delta,
            DeltaDecision::Abort => {
                return Err(LedgerError::invalid(format!(
                    "alteration vetoed for points type: {points_type}"
                )))
            }
        };

        let storage_key = settings.storage_key(points_type);
        let minimum = self
            .hooks
            .effective_minimum(settings.base_minimum(), points_type);

        // Pre-clamp against the current balance so the logged delta matches
        // what was applied. The store repeats the clamp atomically, which is
        // what holds under concurrent writers.
        let current = self.store.balance(&storage_key, user_id)?.unwrap_or(0);
        let delta = if current.saturating_add(delta) < minimum {
            minimum.saturating_sub(current)
        } else {
            delta
        };

        self.store
            .apply_delta(&storage_key, user_id, delta, minimum)?;

        let log_id = if self.hooks.should_log(delta, &ctx) {
            self.write_log(delta, &ctx)
        } else {
            None
        };

        self.leaderboard.invalidate(points_type);

        self.hooks.emit_altered(&AlteredEvent {
            user_id,
            applied_delta: delta,
            points_type: points_type.to_string(),
            kind: kind.clone(),
            meta: meta.clone(),
            log_id,
        });

        Ok(Alteration {
            applied_delta: delta,
            log_id,
        })
    }

    fn write_log(&self, delta: i64, ctx: &AlterContext<'_>) -> Option<LogId> {
        let text = self.renderer.render(&LogDetails {
            user_id: ctx.user_id,
            delta,
            points_type: ctx.points_type,
            kind: ctx.kind,
            meta: ctx.meta,
        });

        let entry = tally_core::NewLogEntry {
            user_id: ctx.user_id,
            points_type: ctx.points_type.to_string(),
            delta,
            kind: ctx.kind.clone(),
            text,
            tenant: self.tenant,
        };

        let log_id = match self.store.insert_log(&entry) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(
                    user_id = %ctx.user_id,
                    points_type = %ctx.points_type,
                    error = %e,
                    "transaction log write failed; balance change stands unaudited"
                );
                return None;
            }
        };

        for (key, value) in ctx.meta {
            if let Err(e) = self.store.add_log_meta(log_id, key, value) {
                tracing::warn!(
                    log_id = %log_id,
                    key = %key,
                    error = %e,
                    "log meta write failed"
                );
            }
        }

        self.hooks.emit_logged(&LoggedEvent {
            user_id: ctx.user_id,
            applied_delta: delta,
            points_type: ctx.points_type.to_string(),
            kind: ctx.kind.clone(),
            meta: ctx.meta.clone(),
            log_id,
        });

        Some(log_id)
    }

    /// Credit `amount` points. Negative amounts are treated as zero.
    ///
    /// # Errors
    ///
    /// Same as [`Ledger::alter`].
    pub fn add(
        &self,
        user_id: UserId,
        points_type: &str,
        amount: i64,
        kind: &TransactionKind,
        meta: &MetaMap,
    ) -> Result<Alteration> {
        self.alter(user_id, points_type, amount.max(0), kind, meta)
    }

    /// Debit `amount` points. Negative amounts are treated as zero.
    ///
    /// # Errors
    ///
    /// Same as [`Ledger::alter`].
    pub fn subtract(
        &self,
        user_id: UserId,
        points_type: &str,
        amount: i64,
        kind: &TransactionKind,
        meta: &MetaMap,
    ) -> Result<Alteration> {
        self.alter(
            user_id,
            points_type,
            amount.max(0).saturating_neg(),
            kind,
            meta,
        )
    }

    /// Move a balance to `target` by altering with the difference from the
    /// current value. The clamp still applies, so a target below the
    /// effective minimum settles at the minimum.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the difference does not fit an `i64`; otherwise
    /// same as [`Ledger::alter`].
    pub fn set(
        &self,
        user_id: UserId,
        points_type: &str,
        target: i64,
        kind: &TransactionKind,
        meta: &MetaMap,
    ) -> Result<Alteration> {
        let current = self.balance(user_id, points_type)?;
        let delta = i64::try_from(i128::from(target) - i128::from(current))
            .map_err(|_| LedgerError::invalid("balance difference out of range"))?;
        self.alter(user_id, points_type, delta, kind, meta)
    }

    /// A user's balance for a points type. An absent row reads as zero.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an unknown points type.
    pub fn balance(&self, user_id: UserId, points_type: &str) -> Result<i64> {
        let storage_key = self.types.storage_key_for(points_type)?;
        Ok(self.store.balance(&storage_key, user_id)?.unwrap_or(0))
    }

    /// How far a user's balance sits above the type's effective minimum,
    /// floored at zero.
    ///
    /// This is a point-in-time hint for "can this user afford N"; the
    /// authoritative answer is only known at `alter` time.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an unknown points type.
    pub fn balance_above_minimum(&self, user_id: UserId, points_type: &str) -> Result<i64> {
        let balance = self.balance(user_id, points_type)?;
        let minimum = self.types.minimum_for(points_type)?;
        Ok(balance.saturating_sub(minimum).max(0))
    }

    /// A user's balance formatted with the type's display prefix and suffix.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an unknown points type.
    pub fn formatted_balance(&self, user_id: UserId, points_type: &str) -> Result<String> {
        let settings = self.types.get(points_type)?.ok_or_else(|| {
            LedgerError::invalid(format!("unknown points type: {points_type}"))
        })?;
        let storage_key = settings.storage_key(points_type);
        let balance = self.store.balance(&storage_key, user_id)?.unwrap_or(0);
        Ok(settings.format(balance))
    }

    /// The top `n` users by balance for a points type, served through the
    /// leaderboard cache.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an unknown points type.
    pub fn top_users(&self, points_type: &str, n: usize) -> Result<Vec<UserId>> {
        let storage_key = self.types.storage_key_for(points_type)?;
        self.leaderboard.top_users(points_type, n, |offset, limit| {
            let rows = self.store.top_balances(&storage_key, offset, limit)?;
            Ok(rows.into_iter().map(|(user, _)| user).collect())
        })
    }

    /// Query the transaction log, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    pub fn logs(&self, query: &LogQuery) -> Result<Vec<LogEntry>> {
        Ok(self.store.query_logs(query)?)
    }

    /// Fetch one log entry by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    pub fn log(&self, log_id: LogId) -> Result<Option<LogEntry>> {
        Ok(self.store.get_log(log_id)?)
    }

    /// The meta rows attached to a log entry, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    pub fn log_meta(&self, log_id: LogId) -> Result<Vec<(String, serde_json::Value)>> {
        Ok(self.store.log_meta(log_id)?)
    }

    /// Re-render the text of every log entry matching the query from its
    /// stored kind and meta, writing back only entries whose text changed.
    /// Returns the number of entries rewritten.
    ///
    /// Used after formatter changes so old entries pick up the new wording.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails; individual rewrite
    /// failures are logged and skipped.
    pub fn regenerate_logs(&self, query: &LogQuery) -> Result<u64> {
        let mut rewritten = 0;

        for entry in self.store.query_logs(query)? {
            let meta: MetaMap = self.store.log_meta(entry.id)?.into_iter().collect();
            let text = self.renderer.render(&LogDetails {
                user_id: entry.user_id,
                delta: entry.delta,
                points_type: &entry.points_type,
                kind: &entry.kind,
                meta: &meta,
            });

            if text == entry.text {
                continue;
            }
            match self.store.update_log_text(entry.id, &text) {
                Ok(()) => rewritten += 1,
                Err(e) => {
                    tracing::warn!(log_id = %entry.id, error = %e, "log text rewrite failed");
                }
            }
        }

        Ok(rewritten)
    }

    /// Remove one user's balance and log entries for a points type, then
    /// drop the type's leaderboard cache entry.
    ///
    /// # Errors
    ///
    /// Same as [`PointsTypes::purge_user`].
    pub fn purge_user(&self, user_id: UserId, points_type: &str) -> Result<()> {
        self.types.purge_user(user_id, points_type)?;
        self.leaderboard.invalidate(points_type);
        Ok(())
    }

    /// Delete a points type and everything scoped to it, then drop its
    /// leaderboard cache entry.
    ///
    /// # Errors
    ///
    /// Same as [`PointsTypes::delete`].
    pub fn delete_points_type(&self, slug: &str) -> Result<()> {
        self.types.delete(slug)?;
        self.leaderboard.invalidate(slug);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::EventListener;
    use crate::render::NO_DESCRIPTION;
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use tally_core::PointsType;
    use tally_store::RocksStore;
    use tempfile::TempDir;

    fn user(raw: u64) -> UserId {
        UserId::new(raw).unwrap()
    }

    fn kind(raw: &str) -> TransactionKind {
        TransactionKind::new(raw).unwrap()
    }

    fn ledger_with(hooks: Hooks, renderer: TextRenderer) -> (Ledger, TempDir) {
        let dir = TempDir::new().unwrap();
        let store: Arc<dyn Store> = Arc::new(RocksStore::open(dir.path()).unwrap());
        let ledger = Ledger::new(store, Tenant::default(), hooks, renderer);
        ledger
            .points_types()
            .create(PointsType::named("Points"))
            .unwrap();
        (ledger, dir)
    }

    fn ledger() -> (Ledger, TempDir) {
        ledger_with(Hooks::default(), TextRenderer::new())
    }

    #[derive(Default)]
    struct Capture {
        altered: Mutex<Vec<AlteredEvent>>,
        logged: Mutex<Vec<LoggedEvent>>,
    }

    struct CaptureListener(Arc<Capture>);

    impl EventListener for CaptureListener {
        fn on_altered(&self, event: &AlteredEvent) {
            self.0.altered.lock().unwrap().push(event.clone());
        }

        fn on_logged(&self, event: &LoggedEvent) {
            self.0.logged.lock().unwrap().push(event.clone());
        }
    }

    #[test]
    fn alter_applies_delta_and_writes_log() {
        let (ledger, _dir) = ledger();

        let outcome = ledger
            .alter(user(7), "points", 10, &kind("test"), &BTreeMap::new())
            .unwrap();
        assert_eq!(outcome.applied_delta, 10);
        let log_id = outcome.log_id.unwrap();

        assert_eq!(ledger.balance(user(7), "points").unwrap(), 10);

        let logs = ledger.logs(&LogQuery::for_user(user(7))).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].id, log_id);
        assert_eq!(logs[0].delta, 10);
        assert_eq!(logs[0].text, NO_DESCRIPTION);
    }

    #[test]
    fn delta_is_clamped_to_the_minimum() {
        let (ledger, _dir) = ledger();
        ledger
            .alter(user(7), "points", 5, &kind("test"), &BTreeMap::new())
            .unwrap();

        let outcome = ledger
            .alter(user(7), "points", -20, &kind("test"), &BTreeMap::new())
            .unwrap();

        // Only -5 of the -20 could be applied, and that is what gets logged.
        assert_eq!(outcome.applied_delta, -5);
        assert_eq!(ledger.balance(user(7), "points").unwrap(), 0);

        let logs = ledger.logs(&LogQuery::for_user(user(7))).unwrap();
        assert_eq!(logs[0].delta, -5);
    }

    #[test]
    fn unknown_points_type_persists_nothing() {
        let (ledger, _dir) = ledger();

        let result = ledger.alter(user(7), "bogus", 10, &kind("test"), &BTreeMap::new());
        assert!(matches!(result, Err(LedgerError::InvalidArgument(_))));
        assert!(ledger.logs(&LogQuery::default()).unwrap().is_empty());
    }

    #[test]
    fn zero_delta_is_a_silent_noop() {
        let capture = Arc::new(Capture::default());
        let hooks = Hooks::builder()
            .listener(CaptureListener(Arc::clone(&capture)))
            .build();
        let (ledger, _dir) = ledger_with(hooks, TextRenderer::new());

        let outcome = ledger
            .alter(user(7), "points", 0, &kind("test"), &BTreeMap::new())
            .unwrap();

        assert_eq!(outcome.applied_delta, 0);
        assert_eq!(outcome.log_id, None);
        assert!(ledger.logs(&LogQuery::default()).unwrap().is_empty());
        assert!(capture.altered.lock().unwrap().is_empty());
    }

    #[test]
    fn delta_filter_rewrite_is_applied() {
        let hooks = Hooks::builder()
            .delta_filter(|delta: i64, _: &AlterContext<'_>| DeltaDecision::Proceed(delta * 2))
            .build();
        let (ledger, _dir) = ledger_with(hooks, TextRenderer::new());

        let outcome = ledger
            .alter(user(7), "points", 10, &kind("test"), &BTreeMap::new())
            .unwrap();
        assert_eq!(outcome.applied_delta, 20);
        assert_eq!(ledger.balance(user(7), "points").unwrap(), 20);
    }

    #[test]
    fn delta_filter_abort_fails_without_persisting() {
        let hooks = Hooks::builder()
            .delta_filter(|_: i64, _: &AlterContext<'_>| DeltaDecision::Abort)
            .build();
        let (ledger, _dir) = ledger_with(hooks, TextRenderer::new());

        let result = ledger.alter(user(7), "points", 10, &kind("test"), &BTreeMap::new());
        assert!(matches!(result, Err(LedgerError::InvalidArgument(_))));
        assert_eq!(ledger.balance(user(7), "points").unwrap(), 0);
        assert!(ledger.logs(&LogQuery::default()).unwrap().is_empty());
    }

    #[test]
    fn should_log_false_still_fires_altered_event() {
        let capture = Arc::new(Capture::default());
        let hooks = Hooks::builder()
            .should_log_filter(|_: bool, _: i64, _: &AlterContext<'_>| false)
            .listener(CaptureListener(Arc::clone(&capture)))
            .build();
        let (ledger, _dir) = ledger_with(hooks, TextRenderer::new());

        let outcome = ledger
            .alter(user(7), "points", 10, &kind("test"), &BTreeMap::new())
            .unwrap();

        assert_eq!(outcome.applied_delta, 10);
        assert_eq!(outcome.log_id, None);
        assert!(ledger.logs(&LogQuery::default()).unwrap().is_empty());

        let altered = capture.altered.lock().unwrap();
        assert_eq!(altered.len(), 1);
        assert_eq!(altered[0].log_id, None);
        assert!(capture.logged.lock().unwrap().is_empty());
    }

    #[test]
    fn add_and_subtract_round_trip() {
        let (ledger, _dir) = ledger();

        ledger
            .add(user(7), "points", 30, &kind("test"), &BTreeMap::new())
            .unwrap();
        ledger
            .subtract(user(7), "points", 12, &kind("test"), &BTreeMap::new())
            .unwrap();
        assert_eq!(ledger.balance(user(7), "points").unwrap(), 18);

        // Negative amounts are clamped to zero and become no-ops.
        let outcome = ledger
            .subtract(user(7), "points", -5, &kind("test"), &BTreeMap::new())
            .unwrap();
        assert_eq!(outcome.applied_delta, 0);
        assert_eq!(ledger.balance(user(7), "points").unwrap(), 18);
    }

    #[test]
    fn set_moves_the_balance_to_the_target() {
        let (ledger, _dir) = ledger();
        ledger
            .add(user(7), "points", 30, &kind("test"), &BTreeMap::new())
            .unwrap();

        let outcome = ledger
            .set(user(7), "points", 12, &kind("test"), &BTreeMap::new())
            .unwrap();
        assert_eq!(outcome.applied_delta, -18);
        assert_eq!(ledger.balance(user(7), "points").unwrap(), 12);

        // A target below the minimum settles at the minimum.
        ledger
            .set(user(7), "points", -50, &kind("test"), &BTreeMap::new())
            .unwrap();
        assert_eq!(ledger.balance(user(7), "points").unwrap(), 0);
    }

    #[test]
    fn minimum_filter_overrides_the_floor() {
        let hooks = Hooks::builder()
            .minimum_filter(|_: i64, _: &str| -100)
            .build();
        let (ledger, _dir) = ledger_with(hooks, TextRenderer::new());

        ledger
            .alter(user(7), "points", -30, &kind("test"), &BTreeMap::new())
            .unwrap();
        assert_eq!(ledger.balance(user(7), "points").unwrap(), -30);
        assert_eq!(ledger.balance_above_minimum(user(7), "points").unwrap(), 70);
    }

    #[test]
    fn listeners_see_both_events_on_a_logged_alter() {
        let capture = Arc::new(Capture::default());
        let hooks = Hooks::builder()
            .listener(CaptureListener(Arc::clone(&capture)))
            .build();
        let (ledger, _dir) = ledger_with(hooks, TextRenderer::new());

        let outcome = ledger
            .alter(user(7), "points", 10, &kind("test"), &BTreeMap::new())
            .unwrap();

        let logged = capture.logged.lock().unwrap();
        assert_eq!(logged.len(), 1);
        assert_eq!(Some(logged[0].log_id), outcome.log_id);

        let altered = capture.altered.lock().unwrap();
        assert_eq!(altered.len(), 1);
        assert_eq!(altered[0].applied_delta, 10);
        assert_eq!(altered[0].log_id, outcome.log_id);
    }

    #[test]
    fn meta_pairs_become_log_meta_rows() {
        let (ledger, _dir) = ledger();

        let mut meta = BTreeMap::new();
        meta.insert("item".to_string(), serde_json::json!("a hat"));
        meta.insert("order".to_string(), serde_json::json!(42));

        let outcome = ledger
            .alter(user(7), "points", -25, &kind("purchase"), &meta)
            .unwrap();

        let rows = ledger.log_meta(outcome.log_id.unwrap()).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.contains(&("item".to_string(), serde_json::json!("a hat"))));
        assert!(rows.contains(&("order".to_string(), serde_json::json!(42))));
    }

    #[test]
    fn alter_invalidates_the_leaderboard() {
        let (ledger, _dir) = ledger();
        ledger
            .add(user(7), "points", 10, &kind("test"), &BTreeMap::new())
            .unwrap();
        ledger
            .add(user(8), "points", 5, &kind("test"), &BTreeMap::new())
            .unwrap();

        assert_eq!(
            ledger.top_users("points", 2).unwrap(),
            vec![user(7), user(8)]
        );

        ledger
            .add(user(8), "points", 100, &kind("test"), &BTreeMap::new())
            .unwrap();
        assert_eq!(
            ledger.top_users("points", 2).unwrap(),
            vec![user(8), user(7)]
        );
    }

    #[test]
    fn regenerate_logs_rewrites_stale_text() {
        let dir = TempDir::new().unwrap();
        let store: Arc<dyn Store> = Arc::new(RocksStore::open(dir.path()).unwrap());

        let mut renderer = TextRenderer::new();
        renderer.register("purchase", |d: &LogDetails<'_>| {
            let item = d
                .meta
                .get("item")
                .and_then(|v| v.as_str())
                .unwrap_or("something");
            format!("Purchased {item}")
        });
        let ledger = Ledger::new(
            Arc::clone(&store),
            Tenant::default(),
            Hooks::default(),
            renderer,
        );
        ledger
            .points_types()
            .create(PointsType::named("Points"))
            .unwrap();

        let mut meta = BTreeMap::new();
        meta.insert("item".to_string(), serde_json::json!("a hat"));
        ledger
            .alter(user(7), "points", -25, &kind("purchase"), &meta)
            .unwrap();
        ledger
            .alter(user(7), "points", 5, &kind("test"), &BTreeMap::new())
            .unwrap();

        // Unchanged text is left alone, so a pass with the same formatter
        // rewrites nothing.
        assert_eq!(ledger.regenerate_logs(&LogQuery::default()).unwrap(), 0);

        // A ledger with a reworded formatter over the same store rewrites
        // exactly the entries whose text changed.
        let mut renderer = TextRenderer::new();
        renderer.register("purchase", |d: &LogDetails<'_>| {
            let item = d
                .meta
                .get("item")
                .and_then(|v| v.as_str())
                .unwrap_or("something");
            format!("Bought {item}")
        });
        let ledger = Ledger::new(store, Tenant::default(), Hooks::default(), renderer);

        assert_eq!(ledger.regenerate_logs(&LogQuery::default()).unwrap(), 1);
        let logs = ledger
            .logs(&LogQuery {
                kind: Some(kind("purchase")),
                ..LogQuery::default()
            })
            .unwrap();
        assert_eq!(logs[0].text, "Bought a hat");
    }

    #[test]
    fn delete_points_type_cascades_and_resets_the_leaderboard() {
        let (ledger, _dir) = ledger();
        ledger
            .add(user(7), "points", 10, &kind("test"), &BTreeMap::new())
            .unwrap();
        ledger.top_users("points", 1).unwrap();

        ledger.delete_points_type("points").unwrap();

        assert!(!ledger.points_types().is_valid("points").unwrap());
        assert!(ledger.logs(&LogQuery::default()).unwrap().is_empty());

        let result = ledger.balance(user(7), "points");
        assert!(matches!(result, Err(LedgerError::InvalidArgument(_))));
    }

    #[test]
    fn formatted_balance_uses_the_display_settings() {
        let (ledger, _dir) = ledger();
        let mut settings = ledger.points_types().get("points").unwrap().unwrap();
        settings.prefix = "$".into();
        ledger.points_types().update("points", settings).unwrap();

        ledger
            .add(user(7), "points", 50, &kind("test"), &BTreeMap::new())
            .unwrap();
        assert_eq!(ledger.formatted_balance(user(7), "points").unwrap(), "$50");
    }
}
