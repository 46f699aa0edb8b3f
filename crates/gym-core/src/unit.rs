//! The unit-of-work port the engines run against.
//!
//! A storage backend opens one transaction, wraps it in a [`UnitOfWork`],
//! hands it to an engine operation and then commits (on `Ok`) or rolls back
//! (on `Err`) exactly once. Every read made through the unit observes the
//! writes made earlier through the same unit.
//!
//! Methods are synchronous: backends dispatch the whole closure to their
//! storage thread, so no `.await` ever happens while a transaction is open.

use chrono::{DateTime, NaiveDate, Utc};

use crate::{
  Result,
  account::{Account, NewAccount},
  client::{Client, ClientRecord, NewEmergencyContact},
  code::CodeSeries,
  contract::{Contract, ContractDraft, HistoryEntry, NewHistoryEntry},
  membership::{Membership, NewMembership},
  schedule::Interval,
  session::{NewSession, TrainingSession},
};

pub trait UnitOfWork {
  /// The highest code currently allocated in `series` by numeric value
  /// (`P1000` ranks above `P999`), if any.
  fn max_code(&mut self, series: CodeSeries) -> Result<Option<String>>;

  // ── Accounts ──────────────────────────────────────────────────────────

  fn account(&mut self, id: i64) -> Result<Option<Account>>;

  /// Insert an account. A duplicate email or document number is a
  /// validation error; a duplicate code is [`crate::Error::DuplicateCode`].
  fn insert_account(
    &mut self,
    code: &str,
    input: &NewAccount,
    now: DateTime<Utc>,
  ) -> Result<Account>;

  fn update_account(&mut self, account: &Account) -> Result<()>;

  // ── Clients ───────────────────────────────────────────────────────────

  /// Load a client with its linked account and emergency contacts hydrated.
  fn client(&mut self, id: i64) -> Result<Option<Client>>;

  /// Insert the client row and return its id.
  fn insert_client(&mut self, record: &ClientRecord) -> Result<i64>;

  /// Persist holder, relationship, active flag and `updated_at`.
  fn update_client(&mut self, client: &Client) -> Result<()>;

  /// Delete every emergency contact of `client_id` and insert `contacts`.
  fn replace_emergency_contacts(
    &mut self,
    client_id: i64,
    contacts: &[NewEmergencyContact],
  ) -> Result<()>;

  // ── Memberships ───────────────────────────────────────────────────────

  fn membership(&mut self, id: i64) -> Result<Option<Membership>>;

  fn insert_membership(
    &mut self,
    code: &str,
    input: &NewMembership,
    now: DateTime<Utc>,
  ) -> Result<Membership>;

  fn update_membership(&mut self, membership: &Membership) -> Result<()>;

  // ── Contracts ─────────────────────────────────────────────────────────

  fn contract(&mut self, id: i64) -> Result<Option<Contract>>;

  fn insert_contract(&mut self, draft: &ContractDraft) -> Result<Contract>;

  /// Persist every mutable column of `contract`.
  fn update_contract(&mut self, contract: &Contract) -> Result<()>;

  /// Append one audit row. History rows are never updated or deleted.
  fn append_history(&mut self, entry: &NewHistoryEntry) -> Result<()>;

  /// History of `contract_id`, most recent first, ties broken newest-insert
  /// first. Unknown contracts yield an empty list.
  fn history(&mut self, contract_id: i64) -> Result<Vec<HistoryEntry>>;

  /// Whether `client_id` holds an `Active` contract ending on or after
  /// `today`.
  fn has_active_contract(&mut self, client_id: i64, today: NaiveDate) -> Result<bool>;

  // ── Training sessions ─────────────────────────────────────────────────

  fn session(&mut self, id: i64) -> Result<Option<TrainingSession>>;

  /// Non-cancelled sessions overlapping `window` that involve `trainer_id`
  /// or `client_id`. With neither given, every trainer and client matches.
  fn sessions_overlapping(
    &mut self,
    window: &Interval,
    trainer_id: Option<i64>,
    client_id: Option<i64>,
  ) -> Result<Vec<TrainingSession>>;

  fn insert_session(
    &mut self,
    input: &NewSession,
    now: DateTime<Utc>,
  ) -> Result<TrainingSession>;

  fn update_session(&mut self, session: &TrainingSession) -> Result<()>;
}
