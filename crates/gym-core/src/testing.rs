//! An in-memory [`UnitOfWork`] and fixtures for engine tests.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;

use crate::{
  Error, Result,
  account::{Account, NewAccount, Role, create_account},
  client::{Client, ClientRecord, EmergencyContact, NewEmergencyContact, NewClient, create_client},
  code::{CodeSeries, numeric_order},
  contract::{
    Contract, ContractDraft, ContractStatus, HistoryEntry, NewContract, NewHistoryEntry,
  },
  lifecycle::create_contract,
  membership::{Membership, NewMembership, create_membership},
  schedule::Interval,
  session::{NewSession, SessionStatus, TrainingSession},
  unit::UnitOfWork,
};

#[derive(Debug, Default)]
pub struct MemoryUnit {
  next_id:        i64,
  accounts:       BTreeMap<i64, Account>,
  clients:        BTreeMap<i64, ClientRecord>,
  contacts:       BTreeMap<i64, Vec<EmergencyContact>>,
  memberships:    BTreeMap<i64, Membership>,
  contracts:      BTreeMap<i64, Contract>,
  history:        Vec<HistoryEntry>,
  sessions:       BTreeMap<i64, TrainingSession>,
  client_updated: BTreeMap<i64, DateTime<Utc>>,
}

impl MemoryUnit {
  fn id(&mut self) -> i64 {
    self.next_id += 1;
    self.next_id
  }
}

impl UnitOfWork for MemoryUnit {
  fn max_code(&mut self, series: CodeSeries) -> Result<Option<String>> {
    let codes: Vec<&String> = match series {
      CodeSeries::Account => self.accounts.values().map(|a| &a.code).collect(),
      CodeSeries::Client => self.clients.values().map(|c| &c.code).collect(),
      CodeSeries::Membership => self.memberships.values().map(|m| &m.code).collect(),
      CodeSeries::Contract => self.contracts.values().map(|c| &c.code).collect(),
    };
    Ok(codes.into_iter().max_by(|a, b| numeric_order(a, b)).cloned())
  }

  fn account(&mut self, id: i64) -> Result<Option<Account>> {
    Ok(self.accounts.get(&id).cloned())
  }

  fn insert_account(
    &mut self,
    code: &str,
    input: &NewAccount,
    now: DateTime<Utc>,
  ) -> Result<Account> {
    if self.accounts.values().any(|a| a.email == input.email) {
      return Err(Error::validation("email is already registered"));
    }
    if self.accounts.values().any(|a| a.document_number == input.document_number) {
      return Err(Error::validation("document number is already registered"));
    }
    let account = Account {
      account_id:      self.id(),
      code:            code.to_owned(),
      first_name:      input.first_name.clone(),
      last_name:       input.last_name.clone(),
      email:           input.email.clone(),
      phone:           input.phone.clone(),
      address:         input.address.clone(),
      gender:          input.gender,
      document_type:   input.document_type,
      document_number: input.document_number.clone(),
      birth_date:      input.birth_date,
      role:            input.role,
      active:          true,
      created_at:      now,
      updated_at:      now,
    };
    self.accounts.insert(account.account_id, account.clone());
    Ok(account)
  }

  fn update_account(&mut self, account: &Account) -> Result<()> {
    self.accounts.insert(account.account_id, account.clone());
    Ok(())
  }

  fn client(&mut self, id: i64) -> Result<Option<Client>> {
    let Some(record) = self.clients.get(&id) else {
      return Ok(None);
    };
    Ok(Some(Client {
      client_id:          id,
      code:               record.code.clone(),
      account:            record.account_id.and_then(|a| self.accounts.get(&a).cloned()),
      holder_id:          record.holder_id,
      relationship:       record.relationship.clone(),
      active:             record.active,
      registered_at:      record.registered_at,
      updated_at:         self.client_updated.get(&id).copied().unwrap_or(record.registered_at),
      emergency_contacts: self.contacts.get(&id).cloned().unwrap_or_default(),
    }))
  }

  fn insert_client(&mut self, record: &ClientRecord) -> Result<i64> {
    let id = self.id();
    self.clients.insert(id, record.clone());
    Ok(id)
  }

  fn update_client(&mut self, client: &Client) -> Result<()> {
    let record = self
      .clients
      .get_mut(&client.client_id)
      .ok_or_else(|| Error::not_found("client", client.client_id))?;
    record.holder_id = client.holder_id;
    record.relationship = client.relationship.clone();
    record.active = client.active;
    self.client_updated.insert(client.client_id, client.updated_at);
    Ok(())
  }

  fn replace_emergency_contacts(
    &mut self,
    client_id: i64,
    contacts: &[NewEmergencyContact],
  ) -> Result<()> {
    let mut stored = Vec::with_capacity(contacts.len());
    for c in contacts {
      stored.push(EmergencyContact {
        contact_id:          self.id(),
        name:                c.name.clone(),
        phone:               c.phone.clone(),
        relationship:        c.relationship.clone(),
        same_as_beneficiary: c.same_as_beneficiary,
      });
    }
    self.contacts.insert(client_id, stored);
    Ok(())
  }

  fn membership(&mut self, id: i64) -> Result<Option<Membership>> {
    Ok(self.memberships.get(&id).cloned())
  }

  fn insert_membership(
    &mut self,
    code: &str,
    input: &NewMembership,
    now: DateTime<Utc>,
  ) -> Result<Membership> {
    let membership = Membership {
      membership_id: self.id(),
      code:          code.to_owned(),
      name:          input.name.clone(),
      description:   input.description.clone(),
      access_days:   input.access_days,
      validity_days: input.validity_days,
      price:         input.price,
      active:        input.active,
      created_at:    now,
    };
    self.memberships.insert(membership.membership_id, membership.clone());
    Ok(membership)
  }

  fn update_membership(&mut self, membership: &Membership) -> Result<()> {
    self.memberships.insert(membership.membership_id, membership.clone());
    Ok(())
  }

  fn contract(&mut self, id: i64) -> Result<Option<Contract>> {
    Ok(self.contracts.get(&id).cloned())
  }

  fn insert_contract(&mut self, draft: &ContractDraft) -> Result<Contract> {
    let contract = Contract {
      contract_id:   self.id(),
      code:          draft.code.clone(),
      client_id:     draft.client_id,
      membership_id: draft.membership_id,
      start_date:    draft.start_date,
      end_date:      draft.end_date,
      price:         draft.price,
      status:        draft.status,
      renewed_from:  draft.renewed_from,
      created_at:    draft.now,
      updated_at:    draft.now,
      created_by:    draft.actor_id,
      updated_by:    draft.actor_id,
    };
    self.contracts.insert(contract.contract_id, contract.clone());
    Ok(contract)
  }

  fn update_contract(&mut self, contract: &Contract) -> Result<()> {
    self.contracts.insert(contract.contract_id, contract.clone());
    Ok(())
  }

  fn append_history(&mut self, entry: &NewHistoryEntry) -> Result<()> {
    let history_id = self.id();
    self.history.push(HistoryEntry {
      history_id,
      contract_id: entry.contract_id,
      previous_status: entry.previous_status,
      new_status: entry.new_status,
      changed_at: entry.changed_at,
      actor_id: entry.actor_id,
      actor_name: None,
      reason: entry.reason.clone(),
    });
    Ok(())
  }

  fn history(&mut self, contract_id: i64) -> Result<Vec<HistoryEntry>> {
    let mut entries: Vec<HistoryEntry> = self
      .history
      .iter()
      .filter(|h| h.contract_id == contract_id)
      .map(|h| HistoryEntry {
        actor_name: h.actor_id.and_then(|a| self.accounts.get(&a)).map(Account::display_name),
        ..h.clone()
      })
      .collect();
    entries.sort_by(|a, b| {
      b.changed_at.cmp(&a.changed_at).then(b.history_id.cmp(&a.history_id))
    });
    Ok(entries)
  }

  fn has_active_contract(&mut self, client_id: i64, today: NaiveDate) -> Result<bool> {
    Ok(self.contracts.values().any(|c| {
      c.client_id == client_id && c.status == ContractStatus::Active && c.end_date >= today
    }))
  }

  fn session(&mut self, id: i64) -> Result<Option<TrainingSession>> {
    Ok(self.sessions.get(&id).cloned())
  }

  fn sessions_overlapping(
    &mut self,
    window: &Interval,
    trainer_id: Option<i64>,
    client_id: Option<i64>,
  ) -> Result<Vec<TrainingSession>> {
    let involved = |s: &TrainingSession| match (trainer_id, client_id) {
      (None, None) => true,
      _ => trainer_id == Some(s.trainer_id) || client_id == Some(s.client_id),
    };
    Ok(
      self
        .sessions
        .values()
        .filter(|s| s.status != SessionStatus::Cancelled)
        .filter(|s| s.start < window.end() && window.start() < s.end)
        .filter(|s| involved(s))
        .cloned()
        .collect(),
    )
  }

  fn insert_session(
    &mut self,
    input: &NewSession,
    now: DateTime<Utc>,
  ) -> Result<TrainingSession> {
    let session = TrainingSession {
      session_id:  self.id(),
      title:       input.title.clone(),
      description: input.description.clone(),
      start:       input.start,
      end:         input.end,
      trainer_id:  input.trainer_id,
      client_id:   input.client_id,
      status:      SessionStatus::Scheduled,
      notes:       input.notes.clone(),
      created_at:  now,
    };
    self.sessions.insert(session.session_id, session.clone());
    Ok(session)
  }

  fn update_session(&mut self, session: &TrainingSession) -> Result<()> {
    self.sessions.insert(session.session_id, session.clone());
    Ok(())
  }
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

pub fn now() -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

/// A 30-day contract interval starting today.
pub fn start_end() -> (NaiveDate, NaiveDate) {
  let start = now().date_naive();
  (start, start + chrono::Days::new(30))
}

pub fn new_account(email: &str, document: &str) -> NewAccount {
  NewAccount {
    first_name:      "Ana".into(),
    last_name:       "Gomez".into(),
    email:           email.into(),
    phone:           Some("3001234567".into()),
    address:         None,
    gender:          None,
    document_type:   None,
    document_number: document.into(),
    birth_date:      NaiveDate::from_ymd_opt(1990, 4, 2).unwrap(),
    role:            Role::Admin,
    password_hash:   "$argon2id$test".into(),
  }
}

pub fn new_membership(name: &str, price: Decimal) -> NewMembership {
  NewMembership {
    name: name.into(),
    description: None,
    access_days: 30,
    validity_days: 30,
    price,
    active: true,
  }
}

/// A client with a linked account named "Ana Gomez". On an empty unit the
/// account gets id 1.
pub fn seed_client(uow: &mut MemoryUnit) -> i64 {
  let n = uow.clients.len() + 1;
  let input = NewClient {
    account:            Some(new_account(&format!("client{n}@example.com"), &format!("5550{n:03}"))),
    holder_id:          None,
    relationship:       None,
    active:             true,
    emergency_contacts: vec![],
  };
  create_client(uow, &input, now()).unwrap().client_id
}

pub fn seed_trainer(uow: &mut MemoryUnit) -> i64 {
  let n = uow.accounts.len() + 1;
  let mut input = new_account(&format!("trainer{n}@example.com"), &format!("7770{n:03}"));
  input.role = Role::Trainer;
  create_account(uow, &input, now()).unwrap().account_id
}

pub fn seed_membership(uow: &mut MemoryUnit, price: Decimal) -> i64 {
  let n = uow.memberships.len() + 1;
  create_membership(uow, &new_membership(&format!("Plan {n}"), price), now())
    .unwrap()
    .membership_id
}

pub fn seed_contract(uow: &mut MemoryUnit, client_id: i64, status: ContractStatus) -> i64 {
  let membership_id = seed_membership(uow, Decimal::from(100));
  let (start_date, end_date) = start_end();
  let input = NewContract {
    client_id,
    membership_id,
    start_date,
    end_date,
    price: None,
    status: Some(status),
  };
  create_contract(uow, &input, None, now()).unwrap().contract.contract_id
}
