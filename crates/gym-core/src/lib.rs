//! Core types, engines and trait definitions for the gym membership backend.
//!
//! This crate is free of HTTP and database dependencies. The contract
//! lifecycle engine ([`lifecycle`]) and the scheduling conflict detector
//! ([`schedule`]) operate on an injected [`unit::UnitOfWork`]; storage
//! backends implement that port and the async [`store::GymStore`] trait.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod account;
pub mod client;
pub mod code;
pub mod contract;
pub mod error;
pub mod lifecycle;
pub mod membership;
pub mod nullable;
pub mod query;
pub mod schedule;
pub mod session;
pub mod store;
pub mod unit;

mod validate;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
