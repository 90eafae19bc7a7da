//! Error types for the ledger engine.

use tally_store::StoreError;

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors surfaced by the ledger engine.
///
/// There is deliberately no variant for a failed log write: once the balance
/// mutation has committed, a log or meta failure degrades to "mutation
/// succeeded, unaudited" and is reported via `tracing::warn!` only.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Bad input: invalid user id, unknown points type, empty transaction
    /// kind, an unrepresentable delta, or a delta filter veto. Nothing was
    /// persisted.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The backing store failed. When raised from the balance-apply step the
    /// balance is guaranteed unchanged.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LedgerError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}
