//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microsecond
//! precision, `Z` suffix) and dates as `YYYY-MM-DD`, so SQL string
//! comparison matches chronological order. Decimals are stored as strings.
//! Enumerations use their wire names.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rust_decimal::Decimal;

use gym_core::{
  account::{Account, DocumentType, Gender, Role},
  contract::{Contract, ContractStatus, HistoryEntry},
  membership::Membership,
  session::{SessionStatus, TrainingSession},
};

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_decimal(d: Decimal) -> String { d.to_string() }

pub fn decode_decimal(s: &str) -> Result<Decimal> {
  Decimal::from_str(s).map_err(|e| Error::Decode(format!("price {s:?}: {e}")))
}

/// Decode an enumeration stored under its wire name.
pub fn decode_name<T: FromStr<Err = gym_core::Error>>(s: &str) -> Result<T> {
  s.parse().map_err(|e: gym_core::Error| Error::Decode(e.to_string()))
}

fn decode_count(n: i64, column: &str) -> Result<u32> {
  u32::try_from(n).map_err(|_| Error::Decode(format!("{column} out of range: {n}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const ACCOUNT_COLUMNS: &str = "account_id, code, first_name, last_name, email, phone, \
   address, gender, document_type, document_number, birth_date, role, active, created_at, \
   updated_at";

/// Raw values read directly from an `accounts` row.
pub struct RawAccount {
  pub account_id:      i64,
  pub code:            String,
  pub first_name:      String,
  pub last_name:       String,
  pub email:           String,
  pub phone:           Option<String>,
  pub address:         Option<String>,
  pub gender:          Option<String>,
  pub document_type:   Option<String>,
  pub document_number: String,
  pub birth_date:      String,
  pub role:            String,
  pub active:          bool,
  pub created_at:      String,
  pub updated_at:      String,
}

impl RawAccount {
  /// Read the columns listed in [`ACCOUNT_COLUMNS`], starting at index 0.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      account_id:      row.get(0)?,
      code:            row.get(1)?,
      first_name:      row.get(2)?,
      last_name:       row.get(3)?,
      email:           row.get(4)?,
      phone:           row.get(5)?,
      address:         row.get(6)?,
      gender:          row.get(7)?,
      document_type:   row.get(8)?,
      document_number: row.get(9)?,
      birth_date:      row.get(10)?,
      role:            row.get(11)?,
      active:          row.get(12)?,
      created_at:      row.get(13)?,
      updated_at:      row.get(14)?,
    })
  }

  pub fn into_account(self) -> Result<Account> {
    Ok(Account {
      account_id:      self.account_id,
      code:            self.code,
      first_name:      self.first_name,
      last_name:       self.last_name,
      email:           self.email,
      phone:           self.phone,
      address:         self.address,
      gender:          self.gender.as_deref().map(decode_name::<Gender>).transpose()?,
      document_type:   self
        .document_type
        .as_deref()
        .map(decode_name::<DocumentType>)
        .transpose()?,
      document_number: self.document_number,
      birth_date:      decode_date(&self.birth_date)?,
      role:            decode_name::<Role>(&self.role)?,
      active:          self.active,
      created_at:      decode_dt(&self.created_at)?,
      updated_at:      decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read directly from a `clients` row. Account and emergency
/// contacts are hydrated separately.
pub struct RawClient {
  pub client_id:     i64,
  pub code:          String,
  pub account_id:    Option<i64>,
  pub holder_id:     Option<i64>,
  pub relationship:  Option<String>,
  pub active:        bool,
  pub registered_at: String,
  pub updated_at:    String,
}

pub const CLIENT_COLUMNS: &str =
  "client_id, code, account_id, holder_id, relationship, active, registered_at, updated_at";

impl RawClient {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      client_id:     row.get(0)?,
      code:          row.get(1)?,
      account_id:    row.get(2)?,
      holder_id:     row.get(3)?,
      relationship:  row.get(4)?,
      active:        row.get(5)?,
      registered_at: row.get(6)?,
      updated_at:    row.get(7)?,
    })
  }
}

pub const MEMBERSHIP_COLUMNS: &str = "membership_id, code, name, description, access_days, \
   validity_days, price, active, created_at";

pub struct RawMembership {
  pub membership_id: i64,
  pub code:          String,
  pub name:          String,
  pub description:   Option<String>,
  pub access_days:   i64,
  pub validity_days: i64,
  pub price:         String,
  pub active:        bool,
  pub created_at:    String,
}

impl RawMembership {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      membership_id: row.get(0)?,
      code:          row.get(1)?,
      name:          row.get(2)?,
      description:   row.get(3)?,
      access_days:   row.get(4)?,
      validity_days: row.get(5)?,
      price:         row.get(6)?,
      active:        row.get(7)?,
      created_at:    row.get(8)?,
    })
  }

  pub fn into_membership(self) -> Result<Membership> {
    Ok(Membership {
      membership_id: self.membership_id,
      code:          self.code,
      name:          self.name,
      description:   self.description,
      access_days:   decode_count(self.access_days, "access_days")?,
      validity_days: decode_count(self.validity_days, "validity_days")?,
      price:         decode_decimal(&self.price)?,
      active:        self.active,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

pub const CONTRACT_COLUMNS: &str = "contract_id, code, client_id, membership_id, start_date, \
   end_date, price, status, renewed_from, created_at, updated_at, created_by, updated_by";

pub struct RawContract {
  pub contract_id:   i64,
  pub code:          String,
  pub client_id:     i64,
  pub membership_id: i64,
  pub start_date:    String,
  pub end_date:      String,
  pub price:         String,
  pub status:        String,
  pub renewed_from:  Option<i64>,
  pub created_at:    String,
  pub updated_at:    String,
  pub created_by:    Option<i64>,
  pub updated_by:    Option<i64>,
}

impl RawContract {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      contract_id:   row.get(0)?,
      code:          row.get(1)?,
      client_id:     row.get(2)?,
      membership_id: row.get(3)?,
      start_date:    row.get(4)?,
      end_date:      row.get(5)?,
      price:         row.get(6)?,
      status:        row.get(7)?,
      renewed_from:  row.get(8)?,
      created_at:    row.get(9)?,
      updated_at:    row.get(10)?,
      created_by:    row.get(11)?,
      updated_by:    row.get(12)?,
    })
  }

  pub fn into_contract(self) -> Result<Contract> {
    Ok(Contract {
      contract_id:   self.contract_id,
      code:          self.code,
      client_id:     self.client_id,
      membership_id: self.membership_id,
      start_date:    decode_date(&self.start_date)?,
      end_date:      decode_date(&self.end_date)?,
      price:         decode_decimal(&self.price)?,
      status:        decode_name::<ContractStatus>(&self.status)?,
      renewed_from:  self.renewed_from,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
      created_by:    self.created_by,
      updated_by:    self.updated_by,
    })
  }
}

/// Raw values from a `contract_history` row joined with the acting account.
pub struct RawHistoryEntry {
  pub history_id:      i64,
  pub contract_id:     i64,
  pub previous_status: Option<String>,
  pub new_status:      String,
  pub changed_at:      String,
  pub actor_id:        Option<i64>,
  pub actor_name:      Option<String>,
  pub reason:          String,
}

impl RawHistoryEntry {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      history_id:      row.get(0)?,
      contract_id:     row.get(1)?,
      previous_status: row.get(2)?,
      new_status:      row.get(3)?,
      changed_at:      row.get(4)?,
      actor_id:        row.get(5)?,
      actor_name:      row.get(6)?,
      reason:          row.get(7)?,
    })
  }

  pub fn into_entry(self) -> Result<HistoryEntry> {
    Ok(HistoryEntry {
      history_id:      self.history_id,
      contract_id:     self.contract_id,
      previous_status: self
        .previous_status
        .as_deref()
        .map(decode_name::<ContractStatus>)
        .transpose()?,
      new_status:      decode_name::<ContractStatus>(&self.new_status)?,
      changed_at:      decode_dt(&self.changed_at)?,
      actor_id:        self.actor_id,
      actor_name:      self.actor_name,
      reason:          self.reason,
    })
  }
}

pub const SESSION_COLUMNS: &str = "session_id, title, description, start_at, end_at, \
   trainer_id, client_id, status, notes, created_at";

pub struct RawSession {
  pub session_id:  i64,
  pub title:       String,
  pub description: Option<String>,
  pub start_at:    String,
  pub end_at:      String,
  pub trainer_id:  i64,
  pub client_id:   i64,
  pub status:      String,
  pub notes:       Option<String>,
  pub created_at:  String,
}

impl RawSession {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      session_id:  row.get(0)?,
      title:       row.get(1)?,
      description: row.get(2)?,
      start_at:    row.get(3)?,
      end_at:      row.get(4)?,
      trainer_id:  row.get(5)?,
      client_id:   row.get(6)?,
      status:      row.get(7)?,
      notes:       row.get(8)?,
      created_at:  row.get(9)?,
    })
  }

  pub fn into_session(self) -> Result<TrainingSession> {
    Ok(TrainingSession {
      session_id:  self.session_id,
      title:       self.title,
      description: self.description,
      start:       decode_dt(&self.start_at)?,
      end:         decode_dt(&self.end_at)?,
      trainer_id:  self.trainer_id,
      client_id:   self.client_id,
      status:      decode_name::<SessionStatus>(&self.status)?,
      notes:       self.notes,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}
