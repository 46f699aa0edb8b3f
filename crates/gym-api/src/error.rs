//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Core(#[from] gym_core::Error),

  #[error("unauthorized")]
  Unauthorized,

  /// Malformed JSON body or query string.
  #[error("bad request: {0}")]
  BadRequest(String),

  /// Token signing or password hashing failed.
  #[error("internal error: {0}")]
  Internal(String),
}

impl ApiError {
  /// Convert a store error. Usable directly in `map_err`.
  pub fn store<E: Into<gym_core::Error>>(e: E) -> Self { Self::Core(e.into()) }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl From<PathRejection> for ApiError {
  fn from(rejection: PathRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message, errors) = match &self {
      ApiError::Core(gym_core::Error::Conflict { conflicts }) => {
        (StatusCode::CONFLICT, self.to_string(), Some(json!(conflicts)))
      }
      ApiError::Core(e @ (gym_core::Error::Storage(_) | gym_core::Error::DuplicateCode(_))) => {
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_owned(), None)
      }
      ApiError::Core(e) => {
        let status =
          StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, e.to_string(), None)
      }
      ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string(), None),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone(), None),
      ApiError::Internal(m) => {
        tracing::error!(error = %m, "internal failure");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_owned(), None)
      }
    };

    let mut body = json!({ "success": false, "message": message });
    if let Some(errors) = errors {
      body["errors"] = errors;
    }
    (status, Json(body)).into_response()
  }
}
