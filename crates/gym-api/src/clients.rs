//! Handlers for `/clients` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/clients` | `?page&limit&search&active&holder_id` |
//! | `POST`   | `/clients` | Body: [`NewClientBody`]; returns 201 |
//! | `GET`    | `/clients/:id` | 404 if not found |
//! | `PUT`    | `/clients/:id` | Body: [`ClientPatch`] |
//! | `DELETE` | `/clients/:id` | Soft delete |
//! | `GET`    | `/clients/:id/beneficiaries` | Active dependents of a holder |

use axum::{
  extract::State,
  response::IntoResponse,
};
use gym_core::{
  client::{ClientPatch, NewClient, NewEmergencyContact},
  query::{ClientQuery, PageRequest},
  store::GymStore,
};
use serde::Deserialize;

use crate::{
  ApiState,
  accounts::NewAccountBody,
  auth::Authenticated,
  envelope::{self, Body, Params, Path},
  error::ApiError,
};

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub page:      Option<u32>,
  pub limit:     Option<u32>,
  pub search:    Option<String>,
  pub active:    Option<bool>,
  pub holder_id: Option<i64>,
}

impl ListParams {
  fn into_query(self) -> Result<ClientQuery, ApiError> {
    Ok(ClientQuery {
      page:      PageRequest::new(self.page, self.limit)?,
      search:    self.search,
      active:    self.active,
      holder_id: self.holder_id,
    })
  }
}

/// `GET /clients`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  _auth: Authenticated,
  Params(params): Params<ListParams>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GymStore + 'static,
{
  let page = state.store.list_clients(params.into_query()?).await.map_err(ApiError::store)?;
  Ok(envelope::page("clients retrieved", page))
}

// ─── Create ──────────────────────────────────────────────────────────────────

fn default_true() -> bool { true }

/// A client as submitted over the wire. The optional login account carries a
/// plaintext password.
#[derive(Debug, Deserialize)]
pub struct NewClientBody {
  #[serde(default)]
  pub account:            Option<NewAccountBody>,
  #[serde(default)]
  pub holder_id:          Option<i64>,
  #[serde(default)]
  pub relationship:       Option<String>,
  #[serde(default = "default_true")]
  pub active:             bool,
  #[serde(default)]
  pub emergency_contacts: Vec<NewEmergencyContact>,
}

impl NewClientBody {
  fn into_client(self) -> Result<NewClient, ApiError> {
    Ok(NewClient {
      account:            self.account.map(NewAccountBody::into_account).transpose()?,
      holder_id:          self.holder_id,
      relationship:       self.relationship,
      active:             self.active,
      emergency_contacts: self.emergency_contacts,
    })
  }
}

/// `POST /clients`
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  _auth: Authenticated,
  Body(body): Body<NewClientBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GymStore + 'static,
{
  let client = state.store.create_client(body.into_client()?).await.map_err(ApiError::store)?;
  Ok(envelope::created("client created", client))
}

// ─── Single client ───────────────────────────────────────────────────────────

/// `GET /clients/:id`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  _auth: Authenticated,
  Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GymStore + 'static,
{
  let client = state
    .store
    .get_client(id)
    .await
    .map_err(ApiError::store)?
    .ok_or(gym_core::Error::not_found("client", id))?;
  Ok(envelope::ok("client retrieved", client))
}

/// `PUT /clients/:id`
pub async fn update<S>(
  State(state): State<ApiState<S>>,
  _auth: Authenticated,
  Path(id): Path<i64>,
  Body(patch): Body<ClientPatch>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GymStore + 'static,
{
  let client = state.store.update_client(id, patch).await.map_err(ApiError::store)?;
  Ok(envelope::ok("client updated", client))
}

/// `DELETE /clients/:id`
pub async fn deactivate<S>(
  State(state): State<ApiState<S>>,
  _auth: Authenticated,
  Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GymStore + 'static,
{
  let client = state.store.deactivate_client(id).await.map_err(ApiError::store)?;
  Ok(envelope::ok("client deactivated", client))
}

/// `GET /clients/:id/beneficiaries`
pub async fn beneficiaries<S>(
  State(state): State<ApiState<S>>,
  _auth: Authenticated,
  Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GymStore + 'static,
{
  let clients = state.store.beneficiaries(id).await.map_err(ApiError::store)?;
  Ok(envelope::ok("beneficiaries retrieved", clients))
}
