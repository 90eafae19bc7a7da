//! Request handlers.

pub mod health;
pub mod logs;
pub mod points;
pub mod types;
