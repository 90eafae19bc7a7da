//! Identifier types for the tally ledger.
//!
//! User ids are positive integers assigned by the host system; log ids are
//! monotonic integers assigned by the transaction log at insert time. Both
//! are newtypes so they cannot be mixed up at call sites.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A user identifier.
///
/// Always positive; zero is rejected at construction so that the invalid-id
/// sentinel of the host system can never reach the ledger.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct UserId(u64);

impl UserId {
    /// Create a user id from a raw integer.
    ///
    /// # Errors
    ///
    /// Returns `IdError::NotPositive` if `raw` is zero.
    pub fn new(raw: u64) -> Result<Self, IdError> {
        if raw == 0 {
            return Err(IdError::NotPositive);
        }
        Ok(Self(raw))
    }

    /// Return the raw integer value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Big-endian byte encoding, used in store keys so ids sort numerically.
    #[must_use]
    pub const fn to_be_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    /// Decode a user id from its big-endian key encoding.
    ///
    /// # Errors
    ///
    /// Returns `IdError::NotPositive` if the bytes decode to zero.
    pub fn from_be_bytes(bytes: [u8; 8]) -> Result<Self, IdError> {
        Self::new(u64::from_be_bytes(bytes))
    }
}

impl TryFrom<u64> for UserId {
    type Error = IdError;

    fn try_from(raw: u64) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<UserId> for u64 {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl FromStr for UserId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: u64 = s.parse().map_err(|_| IdError::Unparseable)?;
        Self::new(raw)
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A transaction log entry identifier.
///
/// Assigned monotonically by the transaction log at insert; never reused.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LogId(u64);

impl LogId {
    /// Create a log id from a raw integer.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Return the raw integer value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Big-endian byte encoding, so log rows iterate in insertion order.
    #[must_use]
    pub const fn to_be_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    /// Decode a log id from its big-endian key encoding.
    #[must_use]
    pub const fn from_be_bytes(bytes: [u8; 8]) -> Self {
        Self(u64::from_be_bytes(bytes))
    }
}

impl FromStr for LogId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: u64 = s.parse().map_err(|_| IdError::Unparseable)?;
        Ok(Self(raw))
    }
}

impl fmt::Debug for LogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LogId({})", self.0)
    }
}

impl fmt::Display for LogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors that can occur when constructing or parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The id is zero or negative.
    #[error("identifier must be a positive integer")]
    NotPositive,

    /// The input is not an integer.
    #[error("identifier is not a valid integer")]
    Unparseable,
}
