//! Training sessions: bookings of a trainer with a client.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, validate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
  Scheduled,
  Completed,
  Cancelled,
}

impl SessionStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Scheduled => "scheduled",
      Self::Completed => "completed",
      Self::Cancelled => "cancelled",
    }
  }
}

impl FromStr for SessionStatus {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "scheduled" => Ok(Self::Scheduled),
      "completed" => Ok(Self::Completed),
      "cancelled" => Ok(Self::Cancelled),
      other => Err(Error::validation(format!("unknown session status: {other:?}"))),
    }
  }
}

impl fmt::Display for SessionStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// A booking occupying `[start, end)`. Sessions carry no audit history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSession {
  pub session_id:  i64,
  pub title:       String,
  pub description: Option<String>,
  pub start:       DateTime<Utc>,
  pub end:         DateTime<Utc>,
  pub trainer_id:  i64,
  pub client_id:   i64,
  pub status:      SessionStatus,
  pub notes:       Option<String>,
  pub created_at:  DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSession {
  pub title:       String,
  #[serde(default)]
  pub description: Option<String>,
  pub start:       DateTime<Utc>,
  pub end:         DateTime<Utc>,
  pub trainer_id:  i64,
  pub client_id:   i64,
  #[serde(default)]
  pub notes:       Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SessionPatch {
  pub title:       Option<String>,
  pub description: Option<String>,
  pub start:       Option<DateTime<Utc>>,
  pub end:         Option<DateTime<Utc>>,
  pub trainer_id:  Option<i64>,
  pub client_id:   Option<i64>,
  pub status:      Option<SessionStatus>,
  pub notes:       Option<String>,
}

pub(crate) fn check_title(title: &str) -> Result<()> { validate::length("title", title, 3, 100) }
