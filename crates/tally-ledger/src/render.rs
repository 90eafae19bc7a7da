//! Log text rendering.
//!
//! Each transaction kind may register a formatter that turns the transaction
//! details into a human-readable description for its log entry. Formatters
//! are pure: they must not touch the store.

use std::collections::HashMap;

use tally_core::{MetaMap, TransactionKind, UserId};

/// Fallback description used when no formatter is registered for a kind, or
/// when the formatter produced an empty string.
pub const NO_DESCRIPTION: &str = "(no description)";

/// The details available to a formatter.
#[derive(Debug, Clone, Copy)]
pub struct LogDetails<'a> {
    /// The affected user.
    pub user_id: UserId,

    /// The applied delta.
    pub delta: i64,

    /// The points type slug.
    pub points_type: &'a str,

    /// The transaction kind.
    pub kind: &'a TransactionKind,

    /// The transaction metadata.
    pub meta: &'a MetaMap,
}

/// Renders the log text for one transaction kind.
pub trait LogFormatter: Send + Sync {
    /// Produce the description. An empty string falls back to
    /// [`NO_DESCRIPTION`].
    fn render(&self, details: &LogDetails<'_>) -> String;
}

impl<F> LogFormatter for F
where
    F: Fn(&LogDetails<'_>) -> String + Send + Sync,
{
    fn render(&self, details: &LogDetails<'_>) -> String {
        self(details)
    }
}

/// Kind-keyed registry of log text formatters.
///
/// Registration is additive; registering a second formatter for the same
/// kind replaces the first (last registration wins).
#[derive(Default)]
pub struct TextRenderer {
    formatters: HashMap<String, Box<dyn LogFormatter>>,
}

impl TextRenderer {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a formatter for a transaction kind. Returns `true` when a
    /// previously registered formatter was replaced.
    pub fn register(
        &mut self,
        kind: impl Into<String>,
        formatter: impl LogFormatter + 'static,
    ) -> bool {
        self.formatters
            .insert(kind.into(), Box::new(formatter))
            .is_some()
    }

    /// Render the description for a transaction.
    #[must_use]
    pub fn render(&self, details: &LogDetails<'_>) -> String {
        let text = self
            .formatters
            .get(details.kind.as_str())
            .map(|f| f.render(details))
            .unwrap_or_default();

        if text.is_empty() {
            NO_DESCRIPTION.to_string()
        } else {
            text
        }
    }
}
