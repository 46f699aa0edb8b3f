//! Handlers for `/contracts` endpoints.
//!
//! Every write is attributed to the authenticated account, which ends up as
//! the actor of the resulting history entries.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/contracts` | `?page&limit&search&status&client_id&start_from&end_until` |
//! | `POST`   | `/contracts` | Body: [`NewContract`]; returns 201 with history |
//! | `GET`    | `/contracts/:id` | Contract plus history |
//! | `PUT`    | `/contracts/:id` | Body: [`ContractPatch`] |
//! | `DELETE` | `/contracts/:id` | Cancels; the row stays |
//! | `POST`   | `/contracts/renew` | Body: [`RenewContract`]; returns 201 with the successor |
//! | `POST`   | `/contracts/freeze` | Body: [`FreezeContract`] |
//! | `GET`    | `/contracts/:id/history` | Most recent first |

use axum::{
  extract::State,
  response::IntoResponse,
};
use chrono::NaiveDate;
use gym_core::{
  contract::{ContractPatch, ContractStatus, FreezeContract, NewContract, RenewContract},
  query::{ContractQuery, PageRequest},
  store::GymStore,
};
use serde::Deserialize;

use crate::{
  ApiState,
  auth::Authenticated,
  envelope::{self, Body, Params, Path},
  error::ApiError,
};

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub page:       Option<u32>,
  pub limit:      Option<u32>,
  pub search:     Option<String>,
  pub status:     Option<ContractStatus>,
  pub client_id:  Option<i64>,
  pub start_from: Option<NaiveDate>,
  pub end_until:  Option<NaiveDate>,
}

/// `GET /contracts`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  _auth: Authenticated,
  Params(params): Params<ListParams>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GymStore + 'static,
{
  let query = ContractQuery {
    page:       PageRequest::new(params.page, params.limit)?,
    search:     params.search,
    status:     params.status,
    client_id:  params.client_id,
    start_from: params.start_from,
    end_until:  params.end_until,
  };
  let page = state.store.list_contracts(query).await.map_err(ApiError::store)?;
  Ok(envelope::page("contracts retrieved", page))
}

// ─── Lifecycle ───────────────────────────────────────────────────────────────

/// `POST /contracts`
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Body(body): Body<NewContract>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GymStore + 'static,
{
  let view = state
    .store
    .create_contract(body, Some(auth.account_id))
    .await
    .map_err(ApiError::store)?;
  Ok(envelope::created("contract created", view))
}

/// `GET /contracts/:id`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  _auth: Authenticated,
  Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GymStore + 'static,
{
  let view = state
    .store
    .get_contract(id)
    .await
    .map_err(ApiError::store)?
    .ok_or(gym_core::Error::not_found("contract", id))?;
  Ok(envelope::ok("contract retrieved", view))
}

/// `PUT /contracts/:id`
pub async fn update<S>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<i64>,
  Body(patch): Body<ContractPatch>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GymStore + 'static,
{
  let view = state
    .store
    .update_contract(id, patch, Some(auth.account_id))
    .await
    .map_err(ApiError::store)?;
  Ok(envelope::ok("contract updated", view))
}

/// `DELETE /contracts/:id`
pub async fn cancel<S>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GymStore + 'static,
{
  let view = state
    .store
    .cancel_contract(id, Some(auth.account_id))
    .await
    .map_err(ApiError::store)?;
  Ok(envelope::ok("contract cancelled", view))
}

/// `POST /contracts/renew`
pub async fn renew<S>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Body(body): Body<RenewContract>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GymStore + 'static,
{
  let view = state
    .store
    .renew_contract(body, Some(auth.account_id))
    .await
    .map_err(ApiError::store)?;
  Ok(envelope::created("contract renewed", view))
}

/// `POST /contracts/freeze`
pub async fn freeze<S>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Body(body): Body<FreezeContract>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GymStore + 'static,
{
  let view = state
    .store
    .freeze_contract(body, Some(auth.account_id))
    .await
    .map_err(ApiError::store)?;
  Ok(envelope::ok("contract frozen", view))
}

/// `GET /contracts/:id/history`
pub async fn history<S>(
  State(state): State<ApiState<S>>,
  _auth: Authenticated,
  Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GymStore + 'static,
{
  let entries = state.store.contract_history(id).await.map_err(ApiError::store)?;
  Ok(envelope::ok("contract history retrieved", entries))
}
