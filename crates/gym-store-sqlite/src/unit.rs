//! [`SqliteUnit`]: the SQLite implementation of [`UnitOfWork`].
//!
//! A unit borrows the connection of an open `IMMEDIATE` transaction. It never
//! commits or rolls back itself; [`crate::SqliteStore`] does that once the
//! engine operation returns.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension as _, params};

use gym_core::{
  account::{Account, NewAccount},
  client::{Client, ClientRecord, NewEmergencyContact},
  code::CodeSeries,
  contract::{Contract, ContractDraft, HistoryEntry, NewHistoryEntry},
  membership::{Membership, NewMembership},
  schedule::Interval,
  session::{NewSession, SessionStatus, TrainingSession},
  unit::UnitOfWork,
};

use crate::{
  Error, Result,
  encode::{encode_date, encode_decimal, encode_dt},
  query,
};

pub struct SqliteUnit<'a> {
  pub(crate) conn: &'a Connection,
}

/// Run a store-level operation and convert its error for the engines.
fn lift<T>(result: Result<T>) -> gym_core::Result<T> { result.map_err(gym_core::Error::from) }

fn code_table(series: CodeSeries) -> &'static str {
  match series {
    CodeSeries::Client => "clients",
    CodeSeries::Account => "accounts",
    CodeSeries::Membership => "memberships",
    CodeSeries::Contract => "contracts",
  }
}

impl SqliteUnit<'_> {
  /// Reload the row just inserted through `load`.
  fn inserted<T>(
    &self,
    entity: &'static str,
    load: fn(&Connection, i64) -> Result<Option<T>>,
  ) -> Result<T> {
    let id = self.conn.last_insert_rowid();
    load(self.conn, id)?.ok_or(Error::Core(gym_core::Error::not_found(entity, id)))
  }
}

impl UnitOfWork for SqliteUnit<'_> {
  fn max_code(&mut self, series: CodeSeries) -> gym_core::Result<Option<String>> {
    let sql = format!(
      "SELECT code FROM {} ORDER BY LENGTH(code) DESC, code DESC LIMIT 1",
      code_table(series)
    );
    lift(
      self
        .conn
        .query_row(&sql, [], |r| r.get::<_, String>(0))
        .optional()
        .map_err(Error::from),
    )
  }

  // ── Accounts ──────────────────────────────────────────────────────────

  fn account(&mut self, id: i64) -> gym_core::Result<Option<Account>> {
    lift(query::account(self.conn, id))
  }

  fn insert_account(
    &mut self,
    code: &str,
    input: &NewAccount,
    now: DateTime<Utc>,
  ) -> gym_core::Result<Account> {
    let at = encode_dt(now);
    let result = self
      .conn
      .execute(
        "INSERT INTO accounts (
           code, first_name, last_name, email, phone, address, gender, document_type,
           document_number, birth_date, role, password_hash, active, created_at, updated_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, 1, ?13, ?13)",
        params![
          code,
          input.first_name.trim(),
          input.last_name.trim(),
          input.email.trim(),
          input.phone,
          input.address,
          input.gender.map(|g| g.as_str()),
          input.document_type.map(|d| d.as_str()),
          input.document_number.trim(),
          encode_date(input.birth_date),
          input.role.as_str(),
          input.password_hash,
          at,
        ],
      )
      .map_err(Error::from)
      .and_then(|_| self.inserted("account", query::account));
    lift(result)
  }

  fn update_account(&mut self, account: &Account) -> gym_core::Result<()> {
    let result = self.conn.execute(
      "UPDATE accounts
          SET first_name = ?2, last_name = ?3, email = ?4, phone = ?5, address = ?6,
              gender = ?7, document_type = ?8, document_number = ?9, birth_date = ?10,
              active = ?11, updated_at = ?12
        WHERE account_id = ?1",
      params![
        account.account_id,
        account.first_name,
        account.last_name,
        account.email,
        account.phone,
        account.address,
        account.gender.map(|g| g.as_str()),
        account.document_type.map(|d| d.as_str()),
        account.document_number,
        encode_date(account.birth_date),
        account.active,
        encode_dt(account.updated_at),
      ],
    );
    lift(result.map(drop).map_err(Error::from))
  }

  // ── Clients ───────────────────────────────────────────────────────────

  fn client(&mut self, id: i64) -> gym_core::Result<Option<Client>> {
    lift(query::client(self.conn, id))
  }

  fn insert_client(&mut self, record: &ClientRecord) -> gym_core::Result<i64> {
    let at = encode_dt(record.registered_at);
    let result = self.conn.execute(
      "INSERT INTO clients (
         code, account_id, holder_id, relationship, active, registered_at, updated_at
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
      params![record.code, record.account_id, record.holder_id, record.relationship, record.active, at],
    );
    lift(result.map(|_| self.conn.last_insert_rowid()).map_err(Error::from))
  }

  fn update_client(&mut self, client: &Client) -> gym_core::Result<()> {
    let result = self.conn.execute(
      "UPDATE clients
          SET holder_id = ?2, relationship = ?3, active = ?4, updated_at = ?5
        WHERE client_id = ?1",
      params![
        client.client_id,
        client.holder_id,
        client.relationship,
        client.active,
        encode_dt(client.updated_at),
      ],
    );
    lift(result.map(drop).map_err(Error::from))
  }

  fn replace_emergency_contacts(
    &mut self,
    client_id: i64,
    contacts: &[NewEmergencyContact],
  ) -> gym_core::Result<()> {
    let result = (|| -> Result<()> {
      self
        .conn
        .execute("DELETE FROM emergency_contacts WHERE client_id = ?1", params![client_id])?;
      let mut stmt = self.conn.prepare_cached(
        "INSERT INTO emergency_contacts (client_id, name, phone, relationship, same_as_beneficiary)
         VALUES (?1, ?2, ?3, ?4, ?5)",
      )?;
      for c in contacts {
        stmt.execute(params![
          client_id,
          c.name.trim(),
          c.phone,
          c.relationship,
          c.same_as_beneficiary
        ])?;
      }
      Ok(())
    })();
    lift(result)
  }

  // ── Memberships ───────────────────────────────────────────────────────

  fn membership(&mut self, id: i64) -> gym_core::Result<Option<Membership>> {
    lift(query::membership(self.conn, id))
  }

  fn insert_membership(
    &mut self,
    code: &str,
    input: &NewMembership,
    now: DateTime<Utc>,
  ) -> gym_core::Result<Membership> {
    let result = self
      .conn
      .execute(
        "INSERT INTO memberships (
           code, name, description, access_days, validity_days, price, active, created_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
          code,
          input.name.trim(),
          input.description,
          input.access_days,
          input.validity_days,
          encode_decimal(input.price),
          input.active,
          encode_dt(now),
        ],
      )
      .map_err(Error::from)
      .and_then(|_| self.inserted("membership", query::membership));
    lift(result)
  }

  fn update_membership(&mut self, membership: &Membership) -> gym_core::Result<()> {
    let result = self.conn.execute(
      "UPDATE memberships
          SET name = ?2, description = ?3, access_days = ?4, validity_days = ?5,
              price = ?6, active = ?7
        WHERE membership_id = ?1",
      params![
        membership.membership_id,
        membership.name,
        membership.description,
        membership.access_days,
        membership.validity_days,
        encode_decimal(membership.price),
        membership.active,
      ],
    );
    lift(result.map(drop).map_err(Error::from))
  }

  // ── Contracts ─────────────────────────────────────────────────────────

  fn contract(&mut self, id: i64) -> gym_core::Result<Option<Contract>> {
    lift(query::contract(self.conn, id))
  }

  fn insert_contract(&mut self, draft: &ContractDraft) -> gym_core::Result<Contract> {
    let at = encode_dt(draft.now);
    let result = self
      .conn
      .execute(
        "INSERT INTO contracts (
           code, client_id, membership_id, start_date, end_date, price, status,
           renewed_from, created_at, updated_at, created_by, updated_by
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9, ?10, ?10)",
        params![
          draft.code,
          draft.client_id,
          draft.membership_id,
          encode_date(draft.start_date),
          encode_date(draft.end_date),
          encode_decimal(draft.price),
          draft.status.as_str(),
          draft.renewed_from,
          at,
          draft.actor_id,
        ],
      )
      .map_err(Error::from)
      .and_then(|_| self.inserted("contract", query::contract));
    lift(result)
  }

  fn update_contract(&mut self, contract: &Contract) -> gym_core::Result<()> {
    let result = self.conn.execute(
      "UPDATE contracts
          SET membership_id = ?2, start_date = ?3, end_date = ?4, price = ?5, status = ?6,
              updated_at = ?7, updated_by = ?8
        WHERE contract_id = ?1",
      params![
        contract.contract_id,
        contract.membership_id,
        encode_date(contract.start_date),
        encode_date(contract.end_date),
        encode_decimal(contract.price),
        contract.status.as_str(),
        encode_dt(contract.updated_at),
        contract.updated_by,
      ],
    );
    lift(result.map(drop).map_err(Error::from))
  }

  fn append_history(&mut self, entry: &NewHistoryEntry) -> gym_core::Result<()> {
    let result = self.conn.execute(
      "INSERT INTO contract_history (
         contract_id, previous_status, new_status, changed_at, actor_id, reason
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
      params![
        entry.contract_id,
        entry.previous_status.map(|s| s.as_str()),
        entry.new_status.as_str(),
        encode_dt(entry.changed_at),
        entry.actor_id,
        entry.reason,
      ],
    );
    lift(result.map(drop).map_err(Error::from))
  }

  fn history(&mut self, contract_id: i64) -> gym_core::Result<Vec<HistoryEntry>> {
    lift(query::history(self.conn, contract_id))
  }

  fn has_active_contract(&mut self, client_id: i64, today: NaiveDate) -> gym_core::Result<bool> {
    let result = self.conn.query_row(
      "SELECT EXISTS (
         SELECT 1 FROM contracts
          WHERE client_id = ?1 AND status = 'active' AND end_date >= ?2
       )",
      params![client_id, encode_date(today)],
      |r| r.get(0),
    );
    lift(result.map_err(Error::from))
  }

  // ── Training sessions ─────────────────────────────────────────────────

  fn session(&mut self, id: i64) -> gym_core::Result<Option<TrainingSession>> {
    lift(query::session(self.conn, id))
  }

  fn sessions_overlapping(
    &mut self,
    window: &Interval,
    trainer_id: Option<i64>,
    client_id: Option<i64>,
  ) -> gym_core::Result<Vec<TrainingSession>> {
    lift(query::sessions_overlapping(
      self.conn,
      window.start(),
      window.end(),
      trainer_id,
      client_id,
    ))
  }

  fn insert_session(
    &mut self,
    input: &NewSession,
    now: DateTime<Utc>,
  ) -> gym_core::Result<TrainingSession> {
    let result = self
      .conn
      .execute(
        "INSERT INTO training_sessions (
           title, description, start_at, end_at, trainer_id, client_id, status, notes, created_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
          input.title.trim(),
          input.description,
          encode_dt(input.start),
          encode_dt(input.end),
          input.trainer_id,
          input.client_id,
          SessionStatus::Scheduled.as_str(),
          input.notes,
          encode_dt(now),
        ],
      )
      .map_err(Error::from)
      .and_then(|_| self.inserted("session", query::session));
    lift(result)
  }

  fn update_session(&mut self, session: &TrainingSession) -> gym_core::Result<()> {
    let result = self.conn.execute(
      "UPDATE training_sessions
          SET title = ?2, description = ?3, start_at = ?4, end_at = ?5, trainer_id = ?6,
              client_id = ?7, status = ?8, notes = ?9
        WHERE session_id = ?1",
      params![
        session.session_id,
        session.title,
        session.description,
        encode_dt(session.start),
        encode_dt(session.end),
        session.trainer_id,
        session.client_id,
        session.status.as_str(),
        session.notes,
      ],
    );
    lift(result.map(drop).map_err(Error::from))
  }
}
