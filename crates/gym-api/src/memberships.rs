//! Handlers for `/memberships` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/memberships` | `?page&limit&search&active` |
//! | `POST`   | `/memberships` | Body: [`NewMembership`]; returns 201 |
//! | `GET`    | `/memberships/:id` | 404 if not found |
//! | `PUT`    | `/memberships/:id` | Body: [`MembershipPatch`] |
//! | `DELETE` | `/memberships/:id` | Soft delete |

use axum::{
  extract::State,
  response::IntoResponse,
};
use gym_core::{
  membership::{MembershipPatch, NewMembership},
  query::{MembershipQuery, PageRequest},
  store::GymStore,
};
use serde::Deserialize;

use crate::{
  ApiState,
  auth::Authenticated,
  envelope::{self, Body, Params, Path},
  error::ApiError,
};

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub page:   Option<u32>,
  pub limit:  Option<u32>,
  pub search: Option<String>,
  pub active: Option<bool>,
}

/// `GET /memberships`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  _auth: Authenticated,
  Params(params): Params<ListParams>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GymStore + 'static,
{
  let query = MembershipQuery {
    page:   PageRequest::new(params.page, params.limit)?,
    search: params.search,
    active: params.active,
  };
  let page = state.store.list_memberships(query).await.map_err(ApiError::store)?;
  Ok(envelope::page("memberships retrieved", page))
}

/// `POST /memberships`
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  _auth: Authenticated,
  Body(body): Body<NewMembership>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GymStore + 'static,
{
  let membership = state.store.create_membership(body).await.map_err(ApiError::store)?;
  Ok(envelope::created("membership created", membership))
}

/// `GET /memberships/:id`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  _auth: Authenticated,
  Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GymStore + 'static,
{
  let membership = state
    .store
    .get_membership(id)
    .await
    .map_err(ApiError::store)?
    .ok_or(gym_core::Error::not_found("membership", id))?;
  Ok(envelope::ok("membership retrieved", membership))
}

/// `PUT /memberships/:id`
pub async fn update<S>(
  State(state): State<ApiState<S>>,
  _auth: Authenticated,
  Path(id): Path<i64>,
  Body(patch): Body<MembershipPatch>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GymStore + 'static,
{
  let membership = state.store.update_membership(id, patch).await.map_err(ApiError::store)?;
  Ok(envelope::ok("membership updated", membership))
}

/// `DELETE /memberships/:id`
pub async fn deactivate<S>(
  State(state): State<ApiState<S>>,
  _auth: Authenticated,
  Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GymStore + 'static,
{
  let membership = state.store.deactivate_membership(id).await.map_err(ApiError::store)?;
  Ok(envelope::ok("membership deactivated", membership))
}
