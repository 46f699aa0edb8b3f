//! Error type for `gym-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] gym_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(rusqlite::Error),

  /// A stored value could not be decoded into its domain type.
  #[error("decode error: {0}")]
  Decode(String),

  #[error("date/time parse error: {0}")]
  DateParse(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<rusqlite::Error> for Error {
  /// Unique-constraint failures on business keys become domain errors; a
  /// collision on a generated code becomes `DuplicateCode` so the unit of
  /// work can be retried.
  fn from(e: rusqlite::Error) -> Self {
    let column = match &e {
      rusqlite::Error::SqliteFailure(err, Some(message))
        if err.code == rusqlite::ErrorCode::ConstraintViolation =>
      {
        message.strip_prefix("UNIQUE constraint failed: ").map(str::to_owned)
      }
      _ => None,
    };
    let Some(column) = column else {
      return Self::Sqlite(e);
    };

    let core = match column.as_str() {
      c if c.ends_with(".code") => gym_core::Error::DuplicateCode(column),
      "accounts.email" => gym_core::Error::validation("email is already registered"),
      "accounts.document_number" => {
        gym_core::Error::validation("document number is already registered")
      }
      "memberships.name" => gym_core::Error::validation("a membership with that name exists"),
      _ => return Self::Sqlite(e),
    };
    Self::Core(core)
  }
}

impl From<Error> for gym_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::Core(core) => core,
      other => gym_core::Error::Storage(Box::new(other)),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn unique_failure(column: &str) -> rusqlite::Error {
    rusqlite::Error::SqliteFailure(
      rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE),
      Some(format!("UNIQUE constraint failed: {column}")),
    )
  }

  #[test]
  fn code_collisions_are_retryable() {
    let err = Error::from(unique_failure("clients.code"));
    assert!(matches!(err, Error::Core(gym_core::Error::DuplicateCode(ref c)) if c == "clients.code"));
  }

  #[test]
  fn business_key_collisions_are_validation_errors() {
    let err: gym_core::Error = Error::from(unique_failure("accounts.email")).into();
    assert!(matches!(err, gym_core::Error::Validation(_)));
  }

  #[test]
  fn other_failures_stay_storage_errors() {
    let err: gym_core::Error = Error::from(rusqlite::Error::QueryReturnedNoRows).into();
    assert!(matches!(err, gym_core::Error::Storage(_)));
  }
}
