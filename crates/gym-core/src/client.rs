//! Clients, their holder (beneficiary) links and emergency contacts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  account::{Account, AccountPatch, NewAccount, Role, create_account},
  code::CodeSeries,
  nullable,
  unit::UnitOfWork,
  validate,
};

/// Longest holder chain accepted when linking a client to a holder.
pub const MAX_HOLDER_DEPTH: usize = 16;

// ─── Types ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyContact {
  pub contact_id:          i64,
  pub name:                String,
  pub phone:               String,
  pub relationship:        Option<String>,
  pub same_as_beneficiary: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewEmergencyContact {
  pub name:                String,
  pub phone:               String,
  #[serde(default)]
  pub relationship:        Option<String>,
  #[serde(default)]
  pub same_as_beneficiary: bool,
}

impl NewEmergencyContact {
  pub fn validate(&self) -> Result<()> {
    validate::length("emergency contact name", &self.name, 3, 100)?;
    validate::phone("emergency contact phone", &self.phone)?;
    validate::max_length("emergency contact relationship", self.relationship.as_deref(), 50)
  }
}

/// A gym member or dependent. `account` is hydrated on read when the client
/// has a login identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
  pub client_id:          i64,
  pub code:               String,
  pub account:            Option<Account>,
  pub holder_id:          Option<i64>,
  pub relationship:       Option<String>,
  pub active:             bool,
  pub registered_at:      DateTime<Utc>,
  pub updated_at:         DateTime<Utc>,
  pub emergency_contacts: Vec<EmergencyContact>,
}

/// The flat row inserted for a new client.
#[derive(Debug, Clone)]
pub struct ClientRecord {
  pub code:          String,
  pub account_id:    Option<i64>,
  pub holder_id:     Option<i64>,
  pub relationship:  Option<String>,
  pub active:        bool,
  pub registered_at: DateTime<Utc>,
}

fn default_true() -> bool { true }

#[derive(Debug, Clone, Deserialize)]
pub struct NewClient {
  /// Create a linked login account in the same unit of work. Its role is
  /// always [`Role::Client`].
  #[serde(default)]
  pub account:            Option<NewAccount>,
  #[serde(default)]
  pub holder_id:          Option<i64>,
  #[serde(default)]
  pub relationship:       Option<String>,
  #[serde(default = "default_true")]
  pub active:             bool,
  #[serde(default)]
  pub emergency_contacts: Vec<NewEmergencyContact>,
}

impl NewClient {
  pub fn validate(&self) -> Result<()> {
    validate::max_length("relationship", self.relationship.as_deref(), 50)?;
    self.emergency_contacts.iter().try_for_each(NewEmergencyContact::validate)
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClientPatch {
  /// Ignored when the client has no linked account.
  pub account:            Option<AccountPatch>,
  #[serde(deserialize_with = "nullable::deserialize")]
  pub holder_id:          Option<Option<i64>>,
  #[serde(deserialize_with = "nullable::deserialize")]
  pub relationship:       Option<Option<String>>,
  pub active:             Option<bool>,
  /// Replaces the whole list when present and non-empty.
  pub emergency_contacts: Option<Vec<NewEmergencyContact>>,
}

impl ClientPatch {
  pub fn validate(&self) -> Result<()> {
    if let Some(Some(relationship)) = &self.relationship {
      validate::max_length("relationship", Some(relationship), 50)?;
    }
    if let Some(contacts) = &self.emergency_contacts {
      contacts.iter().try_for_each(NewEmergencyContact::validate)?;
    }
    Ok(())
  }
}

// ─── Holder chain ────────────────────────────────────────────────────────────

/// Check that `holder_id` exists and that linking `client_id` (if already
/// persisted) under it keeps the holder graph acyclic and shallow.
pub fn ensure_holder_chain<U: UnitOfWork + ?Sized>(
  uow: &mut U,
  client_id: Option<i64>,
  holder_id: i64,
) -> Result<()> {
  let mut current = Some(holder_id);
  let mut links = 0;
  while let Some(id) = current {
    if Some(id) == client_id {
      return Err(Error::validation("holder chain would form a cycle"));
    }
    links += 1;
    if links > MAX_HOLDER_DEPTH {
      return Err(Error::validation(format!(
        "holder chain exceeds {MAX_HOLDER_DEPTH} links"
      )));
    }
    current = uow
      .client(id)?
      .ok_or_else(|| Error::not_found("client", id))?
      .holder_id;
  }
  Ok(())
}

// ─── Operations ──────────────────────────────────────────────────────────────

pub fn create_client<U: UnitOfWork + ?Sized>(
  uow: &mut U,
  input: &NewClient,
  now: DateTime<Utc>,
) -> Result<Client> {
  input.validate()?;
  if let Some(holder_id) = input.holder_id {
    ensure_holder_chain(uow, None, holder_id)?;
  }

  let account_id = match &input.account {
    Some(account) => {
      let account = NewAccount { role: Role::Client, ..account.clone() };
      Some(create_account(uow, &account, now)?.account_id)
    }
    None => None,
  };

  let highest = uow.max_code(CodeSeries::Client)?;
  let code = CodeSeries::Client.next_after(highest.as_deref())?;
  let client_id = uow.insert_client(&ClientRecord {
    code,
    account_id,
    holder_id: input.holder_id,
    relationship: input.relationship.clone(),
    active: input.active,
    registered_at: now,
  })?;
  if !input.emergency_contacts.is_empty() {
    uow.replace_emergency_contacts(client_id, &input.emergency_contacts)?;
  }

  uow.client(client_id)?.ok_or_else(|| Error::not_found("client", client_id))
}

pub fn update_client<U: UnitOfWork + ?Sized>(
  uow: &mut U,
  client_id: i64,
  patch: ClientPatch,
  now: DateTime<Utc>,
) -> Result<Client> {
  let mut client = uow.client(client_id)?.ok_or_else(|| Error::not_found("client", client_id))?;
  patch.validate()?;
  if let Some(account_patch) = &patch.account {
    account_patch.validate(now.date_naive())?;
  }

  if let Some(holder) = patch.holder_id {
    if let Some(holder_id) = holder {
      ensure_holder_chain(uow, Some(client_id), holder_id)?;
    }
    client.holder_id = holder;
  }
  if let Some(relationship) = patch.relationship {
    client.relationship = relationship;
  }
  if let Some(active) = patch.active {
    client.active = active;
  }
  client.updated_at = now;
  uow.update_client(&client)?;

  if let (Some(account_patch), Some(account)) = (patch.account, client.account.as_mut()) {
    account_patch.apply(account, now);
    uow.update_account(account)?;
  }
  if let Some(contacts) = patch.emergency_contacts.filter(|c| !c.is_empty()) {
    uow.replace_emergency_contacts(client_id, &contacts)?;
  }

  uow.client(client_id)?.ok_or_else(|| Error::not_found("client", client_id))
}

/// Soft delete: the row stays, `active` becomes false.
pub fn deactivate_client<U: UnitOfWork + ?Sized>(
  uow: &mut U,
  client_id: i64,
  now: DateTime<Utc>,
) -> Result<Client> {
  let mut client = uow.client(client_id)?.ok_or_else(|| Error::not_found("client", client_id))?;
  client.active = false;
  client.updated_at = now;
  uow.update_client(&client)?;
  Ok(client)
}
