//! Error types for `gym-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A referenced entity does not exist.
  #[error("{entity} {id} not found")]
  NotFound { entity: &'static str, id: i64 },

  /// The operation is not permitted in the entity's current status.
  #[error("{0}")]
  InvalidState(String),

  /// The proposed interval collides with existing training sessions.
  #[error("scheduling conflict with {} existing session(s)", conflicts.len())]
  Conflict { conflicts: Vec<i64> },

  #[error("{0}")]
  Validation(String),

  /// A generated code collided with an existing row; the payload names the
  /// colliding column. Storage backends retry the unit of work on this.
  #[error("generated code collided on {0}")]
  DuplicateCode(String),

  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn not_found(entity: &'static str, id: i64) -> Self {
    Self::NotFound { entity, id }
  }

  pub fn validation(message: impl Into<String>) -> Self {
    Self::Validation(message.into())
  }

  /// The HTTP-equivalent status code suggested for this error.
  pub fn status_code(&self) -> u16 {
    match self {
      Self::NotFound { .. } => 404,
      Self::InvalidState(_) | Self::Validation(_) => 400,
      Self::Conflict { .. } => 409,
      Self::DuplicateCode(_) | Self::Storage(_) => 500,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
