//! Transaction kind tags.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A transaction kind: a string tag classifying why a balance changed
/// (e.g. `"purchase"`, `"registration"`).
///
/// Kinds are open-ended rather than a closed enum because extensions define
/// their own; the only structural requirement is that a kind is non-empty.
/// The kind selects the log text formatter for the entry.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TransactionKind(String);

impl TransactionKind {
    /// Create a kind from a raw string.
    ///
    /// # Errors
    ///
    /// Returns `KindError::Empty` if the string is empty.
    pub fn new(raw: impl Into<String>) -> Result<Self, KindError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(KindError::Empty);
        }
        Ok(Self(raw))
    }

    /// Return the kind as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for TransactionKind {
    type Err = KindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for TransactionKind {
    type Error = KindError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TransactionKind> for String {
    fn from(kind: TransactionKind) -> Self {
        kind.0
    }
}

impl fmt::Debug for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransactionKind({})", self.0)
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors that can occur when constructing a transaction kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KindError {
    /// The kind string is empty.
    #[error("transaction kind must not be empty")]
    Empty,
}
