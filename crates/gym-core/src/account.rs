//! Accounts: login identities for staff, trainers and clients.

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, code::CodeSeries, unit::UnitOfWork, validate};

// ─── Enumerations ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Admin,
  Trainer,
  Client,
}

impl Role {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Admin => "admin",
      Self::Trainer => "trainer",
      Self::Client => "client",
    }
  }
}

impl FromStr for Role {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "admin" => Ok(Self::Admin),
      "trainer" => Ok(Self::Trainer),
      "client" => Ok(Self::Client),
      other => Err(Error::validation(format!("unknown role: {other:?}"))),
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
  #[serde(rename = "M")]
  Male,
  #[serde(rename = "F")]
  Female,
  #[serde(rename = "O")]
  Other,
}

impl Gender {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Male => "M",
      Self::Female => "F",
      Self::Other => "O",
    }
  }
}

impl FromStr for Gender {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "M" => Ok(Self::Male),
      "F" => Ok(Self::Female),
      "O" => Ok(Self::Other),
      other => Err(Error::validation(format!("unknown gender: {other:?}"))),
    }
  }
}

/// Identity document kinds accepted at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DocumentType {
  /// Citizenship card.
  Cc,
  /// Foreigner ID card.
  Ce,
  /// Minor's identity card.
  Ti,
  Pp,
  Die,
}

impl DocumentType {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Cc => "CC",
      Self::Ce => "CE",
      Self::Ti => "TI",
      Self::Pp => "PP",
      Self::Die => "DIE",
    }
  }
}

impl FromStr for DocumentType {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "CC" => Ok(Self::Cc),
      "CE" => Ok(Self::Ce),
      "TI" => Ok(Self::Ti),
      "PP" => Ok(Self::Pp),
      "DIE" => Ok(Self::Die),
      other => Err(Error::validation(format!("unknown document type: {other:?}"))),
    }
  }
}

// ─── Account ─────────────────────────────────────────────────────────────────

/// A persisted account. The password hash is stored alongside but never
/// leaves the store as part of this type; see [`Credentials`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
  pub account_id:      i64,
  pub code:            String,
  pub first_name:      String,
  pub last_name:       String,
  pub email:           String,
  pub phone:           Option<String>,
  pub address:         Option<String>,
  pub gender:          Option<Gender>,
  pub document_type:   Option<DocumentType>,
  pub document_number: String,
  pub birth_date:      NaiveDate,
  pub role:            Role,
  pub active:          bool,
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
}

impl Account {
  pub fn display_name(&self) -> String { format!("{} {}", self.first_name, self.last_name) }
}

/// An account together with its stored password hash, for login checks.
#[derive(Debug, Clone)]
pub struct Credentials {
  pub account:       Account,
  pub password_hash: String,
}

/// Input for creating an account. `password_hash` is an argon2 PHC string
/// produced by the caller; the core never sees plaintext passwords.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAccount {
  pub first_name:      String,
  pub last_name:       String,
  pub email:           String,
  #[serde(default)]
  pub phone:           Option<String>,
  #[serde(default)]
  pub address:         Option<String>,
  #[serde(default)]
  pub gender:          Option<Gender>,
  #[serde(default)]
  pub document_type:   Option<DocumentType>,
  pub document_number: String,
  pub birth_date:      NaiveDate,
  pub role:            Role,
  #[serde(skip)]
  pub password_hash:   String,
}

impl NewAccount {
  pub fn validate(&self, today: NaiveDate) -> Result<()> {
    validate::length("first_name", &self.first_name, 3, 100)?;
    validate::length("last_name", &self.last_name, 3, 100)?;
    validate::email(&self.email)?;
    if let Some(phone) = &self.phone {
      validate::phone("phone", phone)?;
    }
    validate::length("document_number", &self.document_number, 5, 20)?;
    if self.birth_date > today {
      return Err(Error::validation("birth_date cannot be in the future"));
    }
    if self.password_hash.is_empty() {
      return Err(Error::validation("password is required"));
    }
    Ok(())
  }
}

/// Partial update of an account's profile fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AccountPatch {
  pub first_name:      Option<String>,
  pub last_name:       Option<String>,
  pub email:           Option<String>,
  pub phone:           Option<String>,
  pub address:         Option<String>,
  pub gender:          Option<Gender>,
  pub document_type:   Option<DocumentType>,
  pub document_number: Option<String>,
  pub birth_date:      Option<NaiveDate>,
  pub active:          Option<bool>,
}

impl AccountPatch {
  pub fn validate(&self, today: NaiveDate) -> Result<()> {
    if let Some(v) = &self.first_name {
      validate::length("first_name", v, 3, 100)?;
    }
    if let Some(v) = &self.last_name {
      validate::length("last_name", v, 3, 100)?;
    }
    if let Some(v) = &self.email {
      validate::email(v)?;
    }
    if let Some(v) = &self.phone {
      validate::phone("phone", v)?;
    }
    if let Some(v) = &self.document_number {
      validate::length("document_number", v, 5, 20)?;
    }
    if self.birth_date.is_some_and(|d| d > today) {
      return Err(Error::validation("birth_date cannot be in the future"));
    }
    Ok(())
  }

  pub fn apply(self, account: &mut Account, now: DateTime<Utc>) {
    if let Some(v) = self.first_name {
      account.first_name = v;
    }
    if let Some(v) = self.last_name {
      account.last_name = v;
    }
    if let Some(v) = self.email {
      account.email = v;
    }
    if let Some(v) = self.phone {
      account.phone = Some(v);
    }
    if let Some(v) = self.address {
      account.address = Some(v);
    }
    if let Some(v) = self.gender {
      account.gender = Some(v);
    }
    if let Some(v) = self.document_type {
      account.document_type = Some(v);
    }
    if let Some(v) = self.document_number {
      account.document_number = v;
    }
    if let Some(v) = self.birth_date {
      account.birth_date = v;
    }
    if let Some(v) = self.active {
      account.active = v;
    }
    account.updated_at = now;
  }
}

// ─── Operations ──────────────────────────────────────────────────────────────

/// Validate `input`, allocate the next `U###` code and insert the account.
pub fn create_account<U: UnitOfWork + ?Sized>(
  uow: &mut U,
  input: &NewAccount,
  now: DateTime<Utc>,
) -> Result<Account> {
  input.validate(now.date_naive())?;
  let highest = uow.max_code(CodeSeries::Account)?;
  let code = CodeSeries::Account.next_after(highest.as_deref())?;
  uow.insert_account(&code, input, now)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::{MemoryUnit, new_account, now};

  #[test]
  fn allocates_sequential_codes() {
    let mut uow = MemoryUnit::default();
    let a = create_account(&mut uow, &new_account("ana@example.com", "100200"), now()).unwrap();
    let b = create_account(&mut uow, &new_account("bea@example.com", "100300"), now()).unwrap();
    assert_eq!(a.code, "U001");
    assert_eq!(b.code, "U002");
    assert_eq!(a.display_name(), "Ana Gomez");
  }

  #[test]
  fn duplicate_email_is_a_validation_error() {
    let mut uow = MemoryUnit::default();
    create_account(&mut uow, &new_account("ana@example.com", "100200"), now()).unwrap();
    let err =
      create_account(&mut uow, &new_account("ana@example.com", "999999"), now()).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
  }

  #[test]
  fn rejects_bad_fields() {
    let mut uow = MemoryUnit::default();
    let mut input = new_account("ana@example.com", "100200");
    input.phone = Some("12-34".into());
    assert!(create_account(&mut uow, &input, now()).is_err());

    let mut input = new_account("ana@example.com", "100200");
    input.birth_date = now().date_naive().succ_opt().unwrap();
    assert!(create_account(&mut uow, &input, now()).is_err());
  }

  #[test]
  fn enums_use_wire_names() {
    assert_eq!(serde_json::to_value(DocumentType::Die).unwrap(), "DIE");
    assert_eq!(serde_json::to_value(Gender::Female).unwrap(), "F");
    assert_eq!("trainer".parse::<Role>().unwrap(), Role::Trainer);
  }
}
