//! Extension hooks for the ledger engine.
//!
//! Collaborators influence the engine through explicit, ordered lists of
//! typed handlers, collected by a [`HooksBuilder`] during initialization and
//! immutable afterwards. The built [`Hooks`] value is passed into the
//! `Ledger` constructor; there is no ambient global hook table.
//!
//! Each chain threads a value through its handlers in registration order:
//! the delta filters thread the delta (and may abort), the should-log
//! filters thread a boolean, the minimum filters thread the effective
//! minimum. Event listeners observe lifecycle events after the fact and
//! cannot influence the outcome.

use tally_core::{LogId, MetaMap, TransactionKind, UserId};

/// The immutable context of one `alter` call, shared with every handler.
#[derive(Debug, Clone, Copy)]
pub struct AlterContext<'a> {
    /// The user whose balance is being altered.
    pub user_id: UserId,

    /// The points type slug.
    pub points_type: &'a str,

    /// The transaction kind.
    pub kind: &'a TransactionKind,

    /// The caller-supplied transaction metadata.
    pub meta: &'a MetaMap,
}

/// Outcome of one delta filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaDecision {
    /// Continue with this delta. Rewriting to `0` makes the whole `alter`
    /// a no-op success.
    Proceed(i64),

    /// Veto the alteration; `alter` fails with `InvalidArgument` and
    /// nothing is persisted.
    Abort,
}

/// Rewrites the delta before any storage is touched.
pub trait DeltaFilter: Send + Sync {
    /// Inspect and possibly rewrite the delta.
    fn filter(&self, delta: i64, ctx: &AlterContext<'_>) -> DeltaDecision;
}

impl<F> DeltaFilter for F
where
    F: Fn(i64, &AlterContext<'_>) -> DeltaDecision + Send + Sync,
{
    fn filter(&self, delta: i64, ctx: &AlterContext<'_>) -> DeltaDecision {
        self(delta, ctx)
    }
}

/// Decides whether a successful alteration is written to the transaction
/// log. The chain starts at `true`.
pub trait ShouldLogFilter: Send + Sync {
    /// Return the (possibly overridden) logging decision.
    fn decide(&self, current: bool, delta: i64, ctx: &AlterContext<'_>) -> bool;
}

impl<F> ShouldLogFilter for F
where
    F: Fn(bool, i64, &AlterContext<'_>) -> bool + Send + Sync,
{
    fn decide(&self, current: bool, delta: i64, ctx: &AlterContext<'_>) -> bool {
        self(current, delta, ctx)
    }
}

/// Overrides the effective minimum balance for a points type. The chain
/// starts from the type's configured minimum (default 0).
pub trait MinimumFilter: Send + Sync {
    /// Return the (possibly overridden) minimum.
    fn minimum(&self, current: i64, points_type: &str) -> i64;
}

impl<F> MinimumFilter for F
where
    F: Fn(i64, &str) -> i64 + Send + Sync,
{
    fn minimum(&self, current: i64, points_type: &str) -> i64 {
        self(current, points_type)
    }
}

/// Fired on every successful `alter`, even when logging was skipped or the
/// log write failed.
#[derive(Debug, Clone)]
pub struct AlteredEvent {
    /// The affected user.
    pub user_id: UserId,

    /// The delta actually applied, after any clamp.
    pub applied_delta: i64,

    /// The points type slug.
    pub points_type: String,

    /// The transaction kind.
    pub kind: TransactionKind,

    /// The transaction metadata.
    pub meta: MetaMap,

    /// The log entry id, or `None` when the transaction was not logged.
    pub log_id: Option<LogId>,
}

/// Fired only when a log row was actually inserted.
#[derive(Debug, Clone)]
pub struct LoggedEvent {
    /// The affected user.
    pub user_id: UserId,

    /// The applied delta.
    pub applied_delta: i64,

    /// The points type slug.
    pub points_type: String,

    /// The transaction kind.
    pub kind: TransactionKind,

    /// The transaction metadata.
    pub meta: MetaMap,

    /// The inserted log entry id.
    pub log_id: LogId,
}

/// Observes ledger lifecycle events. Rank, leaderboard, and notification
/// subsystems hang off these.
pub trait EventListener: Send + Sync {
    /// A balance was altered.
    fn on_altered(&self, _event: &AlteredEvent) {}

    /// A transaction was logged.
    fn on_logged(&self, _event: &LoggedEvent) {}
}

/// The immutable hook registry handed to the ledger at construction.
#[derive(Default)]
pub struct Hooks {
    delta_filters: Vec<Box<dyn DeltaFilter>>,
    should_log_filters: Vec<Box<dyn ShouldLogFilter>>,
    minimum_filters: Vec<Box<dyn MinimumFilter>>,
    listeners: Vec<Box<dyn EventListener>>,
}

impl Hooks {
    /// Start building a hook registry.
    #[must_use]
    pub fn builder() -> HooksBuilder {
        HooksBuilder::default()
    }

    /// Run the delta filter chain.
    #[must_use]
    pub fn filter_delta(&self, delta: i64, ctx: &AlterContext<'_>) -> DeltaDecision {
        let mut current = delta;
        for filter in &self.delta_filters {
            match filter.filter(current, ctx) {
                DeltaDecision::Proceed(next) => current = next,
                DeltaDecision::Abort => return DeltaDecision::Abort,
            }
        }
        DeltaDecision::Proceed(current)
    }

    /// Run the should-log chain, starting from `true`.
    #[must_use]
    pub fn should_log(&self, delta: i64, ctx: &AlterContext<'_>) -> bool {
        let mut current = true;
        for filter in &self.should_log_filters {
            current = filter.decide(current, delta, ctx);
        }
        current
    }

    /// Run the minimum override chain over the type's base minimum.
    #[must_use]
    pub fn effective_minimum(&self, base: i64, points_type: &str) -> i64 {
        let mut current = base;
        for filter in &self.minimum_filters {
            current = filter.minimum(current, points_type);
        }
        current
    }

    /// Notify listeners of a balance alteration.
    pub fn emit_altered(&self, event: &AlteredEvent) {
        for listener in &self.listeners {
            listener.on_altered(event);
        }
    }

    /// Notify listeners of a logged transaction.
    pub fn emit_logged(&self, event: &LoggedEvent) {
        for listener in &self.listeners {
            listener.on_logged(event);
        }
    }
}

/// Builder collecting handlers during startup.
#[derive(Default)]
pub struct HooksBuilder {
    hooks: Hooks,
}

impl HooksBuilder {
    /// Append a delta filter to the chain.
    #[must_use]
    pub fn delta_filter(mut self, filter: impl DeltaFilter + 'static) -> Self {
        self.hooks.delta_filters.push(Box::new(filter));
        self
    }

    /// Append a should-log filter to the chain.
    #[must_use]
    pub fn should_log_filter(mut self, filter: impl ShouldLogFilter + 'static) -> Self {
        self.hooks.should_log_filters.push(Box::new(filter));
        self
    }

    /// Append a minimum override to the chain.
    #[must_use]
    pub fn minimum_filter(mut self, filter: impl MinimumFilter + 'static) -> Self {
        self.hooks.minimum_filters.push(Box::new(filter));
        self
    }

    /// Register a lifecycle event listener.
    #[must_use]
    pub fn listener(mut self, listener: impl EventListener + 'static) -> Self {
        self.hooks.listeners.push(Box::new(listener));
        self
    }

    /// Finish building; the registry is immutable from here on.
    #[must_use]
    pub fn build(self) -> Hooks {
        self.hooks
    }
}
