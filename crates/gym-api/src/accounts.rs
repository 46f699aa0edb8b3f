//! Handlers for `/accounts` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/accounts` | Body: account fields plus `password`; returns 201 |
//! | `GET`  | `/accounts/:id` | 404 if not found |

use axum::{
  extract::State,
  response::IntoResponse,
};
use gym_core::{account::NewAccount, store::GymStore};
use serde::Deserialize;

use crate::{
  ApiState,
  auth::{Authenticated, hash_password},
  envelope::{self, Body, Path},
  error::ApiError,
};

/// An account as submitted over the wire: the profile plus a plaintext
/// password that is hashed before it reaches the store.
#[derive(Debug, Deserialize)]
pub struct NewAccountBody {
  #[serde(flatten)]
  pub account:  NewAccount,
  pub password: String,
}

impl NewAccountBody {
  pub fn into_account(self) -> Result<NewAccount, ApiError> {
    if self.password.trim().is_empty() {
      return Err(gym_core::Error::validation("password is required").into());
    }
    let mut account = self.account;
    account.password_hash = hash_password(&self.password)?;
    Ok(account)
  }
}

/// `POST /accounts`
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  _auth: Authenticated,
  Body(body): Body<NewAccountBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GymStore + 'static,
{
  let account = state.store.create_account(body.into_account()?).await.map_err(ApiError::store)?;
  Ok(envelope::created("account created", account))
}

/// `GET /accounts/:id`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  _auth: Authenticated,
  Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GymStore + 'static,
{
  let account = state
    .store
    .get_account(id)
    .await
    .map_err(ApiError::store)?
    .ok_or(gym_core::Error::not_found("account", id))?;
  Ok(envelope::ok("account retrieved", account))
}
