//! The tally points ledger engine.
//!
//! This crate ties the storage layer into the business rules of a points
//! system: per-user balances partitioned by points type, an append-style
//! transaction log with metadata, minimum-balance clamping, and an
//! extension surface of typed filter chains and event listeners.
//!
//! # Example
//!
//! ```no_run
//! use std::collections::BTreeMap;
//! use std::sync::Arc;
//! use tally_core::{PointsType, Tenant, TransactionKind, UserId};
//! use tally_ledger::{Hooks, Ledger, TextRenderer};
//! use tally_store::RocksStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(RocksStore::open("/tmp/tally-db")?);
//! let ledger = Ledger::new(
//!     store,
//!     Tenant::default(),
//!     Hooks::default(),
//!     TextRenderer::new(),
//! );
//!
//! ledger.points_types().create(PointsType::named("Points"))?;
//!
//! let user = UserId::new(7)?;
//! let kind = TransactionKind::new("registration")?;
//! ledger.alter(user, "points", 10, &kind, &BTreeMap::new())?;
//! assert_eq!(ledger.balance(user, "points")?, 10);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod hooks;
pub mod leaderboard;
pub mod ledger;
pub mod render;
pub mod types_registry;

pub use error::{LedgerError, Result};
pub use hooks::{
    AlterContext, AlteredEvent, DeltaDecision, DeltaFilter, EventListener, Hooks, HooksBuilder,
    LoggedEvent, MinimumFilter, ShouldLogFilter,
};
pub use leaderboard::LeaderboardCache;
pub use ledger::{Alteration, Ledger};
pub use render::{LogDetails, LogFormatter, TextRenderer, NO_DESCRIPTION};
pub use types_registry::PointsTypes;
