//! Tally Client SDK.
//!
//! This crate provides a client library for services to interact with the
//! tally points ledger API.
//!
//! # Example
//!
//! ```no_run
//! use std::collections::BTreeMap;
//! use tally_client::{AlterRequest, TallyClient};
//!
//! # async fn example() -> Result<(), tally_client::ClientError> {
//! let client = TallyClient::new("http://tally:8080", "your-service-api-key");
//!
//! // Award points for a forum post
//! let outcome = client
//!     .alter(AlterRequest {
//!         user_id: 7,
//!         points_type: "points".to_string(),
//!         delta: 10,
//!         kind: "post_publish".to_string(),
//!         meta: BTreeMap::new(),
//!     })
//!     .await?;
//!
//! println!("New balance: {}", outcome.balance);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod client;
mod error;
mod types;

pub use client::{ClientOptions, TallyClient};
pub use error::ClientError;
pub use types::*;
