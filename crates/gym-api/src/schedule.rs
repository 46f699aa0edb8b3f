//! Handlers for `/schedule` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/schedule` | `?page&limit&search&status&trainer_id&client_id&start_from&end_until` |
//! | `POST`   | `/schedule` | Body: [`NewSession`]; 409 with conflicting ids on overlap |
//! | `GET`    | `/schedule/:id` | 404 if not found |
//! | `PUT`    | `/schedule/:id` | Body: [`SessionPatch`] |
//! | `DELETE` | `/schedule/:id` | Cancels; the row stays |
//! | `POST`   | `/schedule/availability` | Body: [`AvailabilityQuery`] |
//! | `GET`    | `/schedule/client/:id` | Upcoming sessions of a client |
//! | `GET`    | `/schedule/trainer/:id` | Upcoming sessions of a trainer |

use axum::{
  extract::State,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use gym_core::{
  query::{PageRequest, SessionQuery},
  schedule::AvailabilityQuery,
  session::{NewSession, SessionPatch, SessionStatus},
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
  pub page:       Option<u32>,
  pub limit:      Option<u32>,
  pub search:     Option<String>,
  pub status:     Option<SessionStatus>,
  pub trainer_id: Option<i64>,
  pub client_id:  Option<i64>,
  pub start_from: Option<DateTime<Utc>>,
  pub end_until:  Option<DateTime<Utc>>,
}

/// `GET /schedule`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  _auth: Authenticated,
  Params(params): Params<ListParams>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GymStore + 'static,
{
  let query = SessionQuery {
    page:       PageRequest::new(params.page, params.limit)?,
    search:     params.search,
    status:     params.status,
    trainer_id: params.trainer_id,
    client_id:  params.client_id,
    start_from: params.start_from,
    end_until:  params.end_until,
  };
  let page = state.store.list_sessions(query).await.map_err(ApiError::store)?;
  Ok(envelope::page("sessions retrieved", page))
}

/// `POST /schedule`
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  _auth: Authenticated,
  Body(body): Body<NewSession>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GymStore + 'static,
{
  let session = state.store.create_session(body).await.map_err(ApiError::store)?;
  Ok(envelope::created("session scheduled", session))
}

/// `GET /schedule/:id`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  _auth: Authenticated,
  Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GymStore + 'static,
{
  let session = state
    .store
    .get_session(id)
    .await
    .map_err(ApiError::store)?
    .ok_or(gym_core::Error::not_found("session", id))?;
  Ok(envelope::ok("session retrieved", session))
}

/// `PUT /schedule/:id`
pub async fn update<S>(
  State(state): State<ApiState<S>>,
  _auth: Authenticated,
  Path(id): Path<i64>,
  Body(patch): Body<SessionPatch>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GymStore + 'static,
{
  let session = state.store.update_session(id, patch).await.map_err(ApiError::store)?;
  Ok(envelope::ok("session updated", session))
}

/// `DELETE /schedule/:id`
pub async fn cancel<S>(
  State(state): State<ApiState<S>>,
  _auth: Authenticated,
  Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GymStore + 'static,
{
  let session = state.store.cancel_session(id).await.map_err(ApiError::store)?;
  Ok(envelope::ok("session cancelled", session))
}

/// `POST /schedule/availability`
pub async fn availability<S>(
  State(state): State<ApiState<S>>,
  _auth: Authenticated,
  Body(query): Body<AvailabilityQuery>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GymStore + 'static,
{
  let availability = state.store.check_availability(query).await.map_err(ApiError::store)?;
  Ok(envelope::ok("availability checked", availability))
}

/// `GET /schedule/client/:id`
pub async fn client_schedule<S>(
  State(state): State<ApiState<S>>,
  _auth: Authenticated,
  Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GymStore + 'static,
{
  let sessions = state.store.client_schedule(id).await.map_err(ApiError::store)?;
  Ok(envelope::ok("client schedule retrieved", sessions))
}

/// `GET /schedule/trainer/:id`
pub async fn trainer_schedule<S>(
  State(state): State<ApiState<S>>,
  _auth: Authenticated,
  Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GymStore + 'static,
{
  let sessions = state.store.trainer_schedule(id).await.map_err(ApiError::store)?;
  Ok(envelope::ok("trainer schedule retrieved", sessions))
}
