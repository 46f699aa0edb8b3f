//! JSON REST API for the gym backend.
//!
//! Exposes an axum [`Router`] backed by any [`gym_core::store::GymStore`].
//! Every route except `/auth/login` requires a bearer token; TLS and
//! transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", gym_api::api_router(state))
//! ```

pub mod accounts;
pub mod auth;
pub mod clients;
pub mod contracts;
pub mod envelope;
pub mod error;
pub mod memberships;
pub mod schedule;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use gym_core::store::GymStore;

pub use auth::TokenConfig;
pub use error::ApiError;

/// Shared state threaded through all handlers.
pub struct ApiState<S> {
  pub store:  Arc<S>,
  pub tokens: Arc<TokenConfig>,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), tokens: Arc::clone(&self.tokens) }
  }
}

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: ApiState<S>) -> Router<()>
where
  S: GymStore + 'static,
{
  Router::new()
    .route("/auth/login", post(auth::login::<S>))
    // Accounts
    .route("/accounts", post(accounts::create::<S>))
    .route("/accounts/{id}", get(accounts::get_one::<S>))
    // Clients
    .route("/clients", get(clients::list::<S>).post(clients::create::<S>))
    .route(
      "/clients/{id}",
      get(clients::get_one::<S>).put(clients::update::<S>).delete(clients::deactivate::<S>),
    )
    .route("/clients/{id}/beneficiaries", get(clients::beneficiaries::<S>))
    // Memberships
    .route("/memberships", get(memberships::list::<S>).post(memberships::create::<S>))
    .route(
      "/memberships/{id}",
      get(memberships::get_one::<S>)
        .put(memberships::update::<S>)
        .delete(memberships::deactivate::<S>),
    )
    // Contracts
    .route("/contracts", get(contracts::list::<S>).post(contracts::create::<S>))
    .route("/contracts/renew", post(contracts::renew::<S>))
    .route("/contracts/freeze", post(contracts::freeze::<S>))
    .route(
      "/contracts/{id}",
      get(contracts::get_one::<S>).put(contracts::update::<S>).delete(contracts::cancel::<S>),
    )
    .route("/contracts/{id}/history", get(contracts::history::<S>))
    // Schedule
    .route("/schedule", get(schedule::list::<S>).post(schedule::create::<S>))
    .route("/schedule/availability", post(schedule::availability::<S>))
    .route("/schedule/client/{id}", get(schedule::client_schedule::<S>))
    .route("/schedule/trainer/{id}", get(schedule::trainer_schedule::<S>))
    .route(
      "/schedule/{id}",
      get(schedule::get_one::<S>).put(schedule::update::<S>).delete(schedule::cancel::<S>),
    )
    .with_state(state)
}
