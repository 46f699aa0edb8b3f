//! The `{success, message, data, pagination}` response envelope and the
//! extractors that turn malformed input into [`ApiError::BadRequest`].

use axum::{
  Json,
  extract::{FromRequest, FromRequestParts},
  http::StatusCode,
};
use gym_core::query::{Page, Pagination};
use serde::Serialize;

use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
  pub success:    bool,
  pub message:    String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub data:       Option<T>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub pagination: Option<Pagination>,
}

/// `200` with `data`.
pub fn ok<T: Serialize>(message: &str, data: T) -> Json<Envelope<T>> {
  Json(Envelope {
    success:    true,
    message:    message.to_owned(),
    data:       Some(data),
    pagination: None,
  })
}

/// `201` with the created entity.
pub fn created<T: Serialize>(message: &str, data: T) -> (StatusCode, Json<Envelope<T>>) {
  (StatusCode::CREATED, ok(message, data))
}

/// `200` with one page of a list and its pagination.
pub fn page<T: Serialize>(message: &str, page: Page<T>) -> Json<Envelope<Vec<T>>> {
  Json(Envelope {
    success:    true,
    message:    message.to_owned(),
    data:       Some(page.data),
    pagination: Some(page.pagination),
  })
}

// ─── Extractors ──────────────────────────────────────────────────────────────

/// [`axum::Json`] with an envelope-shaped rejection.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct Body<T>(pub T);

/// [`axum::extract::Query`] with an envelope-shaped rejection.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct Params<T>(pub T);

/// [`axum::extract::Path`] with an envelope-shaped rejection.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct Path<T>(pub T);
