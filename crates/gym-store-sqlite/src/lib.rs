//! SQLite backend for the gym store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every write runs one `gym-core`
//! engine operation inside a single `IMMEDIATE` transaction.

mod encode;
mod query;
mod schema;
mod store;
mod unit;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
