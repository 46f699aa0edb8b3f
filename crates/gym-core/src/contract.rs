//! Contracts, their audit history and the inputs of the lifecycle operations.
//!
//! The rules deciding how a contract's status may change live in
//! [`crate::lifecycle`]; this module only defines the data.

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Error, Result, membership::check_price};

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
  Active,
  Frozen,
  Expired,
  Cancelled,
  AboutToExpire,
}

impl ContractStatus {
  pub const ALL: [Self; 5] =
    [Self::Active, Self::Frozen, Self::Expired, Self::Cancelled, Self::AboutToExpire];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Active => "active",
      Self::Frozen => "frozen",
      Self::Expired => "expired",
      Self::Cancelled => "cancelled",
      Self::AboutToExpire => "about_to_expire",
    }
  }
}

impl FromStr for ContractStatus {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    Self::ALL
      .into_iter()
      .find(|status| status.as_str() == s)
      .ok_or_else(|| Error::validation(format!("unknown contract status: {s:?}")))
  }
}

impl fmt::Display for ContractStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// A priced binding of a client to a membership over `[start_date, end_date)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
  pub contract_id:   i64,
  pub code:          String,
  pub client_id:     i64,
  pub membership_id: i64,
  pub start_date:    NaiveDate,
  pub end_date:      NaiveDate,
  /// Copied from the membership at signing time unless overridden.
  pub price:         Decimal,
  pub status:        ContractStatus,
  /// The contract this one was created from by renewal.
  pub renewed_from:  Option<i64>,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
  pub created_by:    Option<i64>,
  pub updated_by:    Option<i64>,
}

/// One immutable status change. `previous_status` is `None` for the entry
/// written at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
  pub history_id:      i64,
  pub contract_id:     i64,
  pub previous_status: Option<ContractStatus>,
  pub new_status:      ContractStatus,
  pub changed_at:      DateTime<Utc>,
  pub actor_id:        Option<i64>,
  /// Display name of the acting account, resolved on read.
  pub actor_name:      Option<String>,
  pub reason:          String,
}

#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
  pub contract_id:     i64,
  pub previous_status: Option<ContractStatus>,
  pub new_status:      ContractStatus,
  pub changed_at:      DateTime<Utc>,
  pub actor_id:        Option<i64>,
  pub reason:          String,
}

/// A contract together with its full history, most recent entry first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractView {
  #[serde(flatten)]
  pub contract: Contract,
  pub history:  Vec<HistoryEntry>,
}

/// The row inserted for a new contract, code already allocated.
#[derive(Debug, Clone)]
pub struct ContractDraft {
  pub code:          String,
  pub client_id:     i64,
  pub membership_id: i64,
  pub start_date:    NaiveDate,
  pub end_date:      NaiveDate,
  pub price:         Decimal,
  pub status:        ContractStatus,
  pub renewed_from:  Option<i64>,
  pub actor_id:      Option<i64>,
  pub now:           DateTime<Utc>,
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

pub fn check_dates(start: NaiveDate, end: NaiveDate) -> Result<()> {
  if end <= start {
    return Err(Error::validation("end_date must be after start_date"));
  }
  Ok(())
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewContract {
  pub client_id:     i64,
  pub membership_id: i64,
  pub start_date:    NaiveDate,
  pub end_date:      NaiveDate,
  /// Defaults to the membership's current price.
  #[serde(default)]
  pub price:         Option<Decimal>,
  /// Defaults to [`ContractStatus::Active`].
  #[serde(default)]
  pub status:        Option<ContractStatus>,
}

impl NewContract {
  pub fn validate(&self) -> Result<()> {
    check_dates(self.start_date, self.end_date)?;
    self.price.map_or(Ok(()), check_price)
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContractPatch {
  pub membership_id: Option<i64>,
  pub start_date:    Option<NaiveDate>,
  pub end_date:      Option<NaiveDate>,
  pub price:         Option<Decimal>,
  pub status:        Option<ContractStatus>,
  /// Recorded in history when the status changes.
  pub reason:        Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenewContract {
  pub contract_id:   i64,
  pub membership_id: i64,
  pub start_date:    NaiveDate,
  pub end_date:      NaiveDate,
  /// Defaults to the new membership's price.
  #[serde(default)]
  pub price:         Option<Decimal>,
}

impl RenewContract {
  pub fn validate(&self) -> Result<()> {
    check_dates(self.start_date, self.end_date)?;
    self.price.map_or(Ok(()), check_price)
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FreezeContract {
  pub contract_id: i64,
  pub reason:      String,
}
