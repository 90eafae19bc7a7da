//! Core types for the tally points ledger.
//!
//! This crate provides the foundational types used throughout tally:
//!
//! - **Identifiers**: `UserId`, `LogId`
//! - **Points types**: `PointsType`, slug sanitization
//! - **Transactions**: `TransactionKind`, `LogEntry`, `MetaMap`
//! - **Tenancy**: `Tenant` (site/network scope stamped onto log rows)
//!
//! # Balances
//!
//! Balances are signed integers (`i64`) scoped to one `(user, points type)`
//! pair. There is no upper bound; the lower bound is the points type's
//! effective minimum, enforced at mutation time by the storage layer.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ids;
pub mod kind;
pub mod log;
pub mod points_type;

pub use ids::{IdError, LogId, UserId};
pub use kind::{KindError, TransactionKind};
pub use log::{LogEntry, LogQuery, MetaMap, NewLogEntry, Tenant};
pub use points_type::{points_type_slug, PointsType, SlugError};
