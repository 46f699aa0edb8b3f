//! [`SqliteStore`]: the SQLite implementation of [`GymStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::TransactionBehavior;

use gym_core::{
  account::{self, Account, Credentials, NewAccount},
  client::{self, Client, ClientPatch, NewClient},
  contract::{
    Contract, ContractPatch, ContractView, FreezeContract, HistoryEntry, NewContract,
    RenewContract,
  },
  lifecycle,
  membership::{self, Membership, MembershipPatch, NewMembership},
  query::{ClientQuery, ContractQuery, MembershipQuery, Page, SessionQuery},
  schedule::{self, Availability, AvailabilityQuery},
  session::{NewSession, SessionPatch, TrainingSession},
  store::GymStore,
};

use crate::{
  Error, Result,
  query::{self, Party},
  schema::SCHEMA,
  unit::SqliteUnit,
};

/// How many times a unit of work is attempted when a generated code
/// collides with an existing one.
const MAX_ATTEMPTS: u32 = 3;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A gym store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `op` inside one `IMMEDIATE` transaction.
  ///
  /// The transaction commits only when `op` succeeds. A `DuplicateCode`
  /// failure rolls back and reruns `op` with a fresh transaction, up to
  /// [`MAX_ATTEMPTS`] times.
  async fn unit_of_work<T, F>(&self, op: F) -> Result<T>
  where
    T: Send + 'static,
    F: Fn(&mut SqliteUnit<'_>, DateTime<Utc>) -> gym_core::Result<T> + Send + 'static,
  {
    let outcome = self
      .conn
      .call(move |conn| {
        let mut attempt = 1;
        loop {
          let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
          let result = op(&mut SqliteUnit { conn: &tx }, Utc::now());
          match result {
            Ok(value) => {
              tx.commit()?;
              return Ok(Ok(value));
            }
            Err(gym_core::Error::DuplicateCode(column)) if attempt < MAX_ATTEMPTS => {
              tracing::warn!(%column, attempt, "generated code collided, retrying");
              attempt += 1;
            }
            Err(e) => return Ok(Err(e)),
          }
        }
      })
      .await?;
    Ok(outcome?)
  }

  /// Run a read outside any explicit transaction.
  async fn read<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&rusqlite::Connection) -> Result<T> + Send + 'static,
  {
    self.conn.call(move |conn| Ok(f(conn))).await?
  }
}

// ─── GymStore impl ───────────────────────────────────────────────────────────

impl GymStore for SqliteStore {
  type Error = Error;

  // ── Accounts ──────────────────────────────────────────────────────────

  async fn create_account(&self, input: NewAccount) -> Result<Account> {
    let account = self
      .unit_of_work(move |uow, now| account::create_account(uow, &input, now))
      .await?;
    tracing::info!(
      account_id = account.account_id,
      code = %account.code,
      role = %account.role,
      "account created"
    );
    Ok(account)
  }

  async fn get_account(&self, id: i64) -> Result<Option<Account>> {
    self.read(move |conn| query::account(conn, id)).await
  }

  async fn find_credentials(&self, email: String) -> Result<Option<Credentials>> {
    self.read(move |conn| query::credentials(conn, email.trim())).await
  }

  // ── Clients ───────────────────────────────────────────────────────────

  async fn list_clients(&self, query: ClientQuery) -> Result<Page<Client>> {
    self.read(move |conn| query::list_clients(conn, &query)).await
  }

  async fn get_client(&self, id: i64) -> Result<Option<Client>> {
    self.read(move |conn| query::client(conn, id)).await
  }

  async fn create_client(&self, input: NewClient) -> Result<Client> {
    let client = self
      .unit_of_work(move |uow, now| client::create_client(uow, &input, now))
      .await?;
    tracing::info!(client_id = client.client_id, code = %client.code, "client created");
    Ok(client)
  }

  async fn update_client(&self, id: i64, patch: ClientPatch) -> Result<Client> {
    self
      .unit_of_work(move |uow, now| client::update_client(uow, id, patch.clone(), now))
      .await
  }

  async fn deactivate_client(&self, id: i64) -> Result<Client> {
    let client = self
      .unit_of_work(move |uow, now| client::deactivate_client(uow, id, now))
      .await?;
    tracing::info!(client_id = id, "client deactivated");
    Ok(client)
  }

  async fn beneficiaries(&self, id: i64) -> Result<Vec<Client>> {
    self.read(move |conn| query::beneficiaries(conn, id)).await
  }

  // ── Memberships ───────────────────────────────────────────────────────

  async fn list_memberships(&self, query: MembershipQuery) -> Result<Page<Membership>> {
    self.read(move |conn| query::list_memberships(conn, &query)).await
  }

  async fn get_membership(&self, id: i64) -> Result<Option<Membership>> {
    self.read(move |conn| query::membership(conn, id)).await
  }

  async fn create_membership(&self, input: NewMembership) -> Result<Membership> {
    let membership = self
      .unit_of_work(move |uow, now| membership::create_membership(uow, &input, now))
      .await?;
    tracing::info!(
      membership_id = membership.membership_id,
      code = %membership.code,
      "membership created"
    );
    Ok(membership)
  }

  async fn update_membership(&self, id: i64, patch: MembershipPatch) -> Result<Membership> {
    self
      .unit_of_work(move |uow, _| membership::update_membership(uow, id, patch.clone()))
      .await
  }

  async fn deactivate_membership(&self, id: i64) -> Result<Membership> {
    self.unit_of_work(move |uow, _| membership::deactivate_membership(uow, id)).await
  }

  // ── Contracts ─────────────────────────────────────────────────────────

  async fn list_contracts(&self, query: ContractQuery) -> Result<Page<Contract>> {
    self.read(move |conn| query::list_contracts(conn, &query)).await
  }

  async fn get_contract(&self, id: i64) -> Result<Option<ContractView>> {
    self
      .read(move |conn| Ok(lifecycle::load_contract(&mut SqliteUnit { conn }, id)?))
      .await
  }

  async fn create_contract(&self, input: NewContract, actor: Option<i64>) -> Result<ContractView> {
    let view = self
      .unit_of_work(move |uow, now| lifecycle::create_contract(uow, &input, actor, now))
      .await?;
    log_transition("contract created", &view);
    Ok(view)
  }

  async fn update_contract(
    &self,
    id: i64,
    patch: ContractPatch,
    actor: Option<i64>,
  ) -> Result<ContractView> {
    let view = self
      .unit_of_work(move |uow, now| lifecycle::update_contract(uow, id, patch.clone(), actor, now))
      .await?;
    log_transition("contract updated", &view);
    Ok(view)
  }

  async fn cancel_contract(&self, id: i64, actor: Option<i64>) -> Result<ContractView> {
    let view = self
      .unit_of_work(move |uow, now| lifecycle::cancel_contract(uow, id, actor, now))
      .await?;
    log_transition("contract cancelled", &view);
    Ok(view)
  }

  async fn renew_contract(&self, input: RenewContract, actor: Option<i64>) -> Result<ContractView> {
    let source = input.contract_id;
    let view = self
      .unit_of_work(move |uow, now| lifecycle::renew_contract(uow, &input, actor, now))
      .await?;
    tracing::info!(
      renewed_from = source,
      contract_id = view.contract.contract_id,
      code = %view.contract.code,
      "contract renewed"
    );
    Ok(view)
  }

  async fn freeze_contract(&self, input: FreezeContract, actor: Option<i64>) -> Result<ContractView> {
    let view = self
      .unit_of_work(move |uow, now| lifecycle::freeze_contract(uow, &input, actor, now))
      .await?;
    log_transition("contract frozen", &view);
    Ok(view)
  }

  async fn contract_history(&self, id: i64) -> Result<Vec<HistoryEntry>> {
    self.read(move |conn| query::history(conn, id)).await
  }

  // ── Training sessions ─────────────────────────────────────────────────

  async fn list_sessions(&self, query: SessionQuery) -> Result<Page<TrainingSession>> {
    self.read(move |conn| query::list_sessions(conn, &query)).await
  }

  async fn get_session(&self, id: i64) -> Result<Option<TrainingSession>> {
    self.read(move |conn| query::session(conn, id)).await
  }

  async fn create_session(&self, input: NewSession) -> Result<TrainingSession> {
    let session = self
      .unit_of_work(move |uow, now| schedule::create_session(uow, &input, now))
      .await?;
    tracing::info!(
      session_id = session.session_id,
      trainer_id = session.trainer_id,
      client_id = session.client_id,
      "session scheduled"
    );
    Ok(session)
  }

  async fn update_session(&self, id: i64, patch: SessionPatch) -> Result<TrainingSession> {
    self
      .unit_of_work(move |uow, _| schedule::update_session(uow, id, patch.clone()))
      .await
  }

  async fn cancel_session(&self, id: i64) -> Result<TrainingSession> {
    let session = self.unit_of_work(move |uow, _| schedule::cancel_session(uow, id)).await?;
    tracing::info!(session_id = id, "session cancelled");
    Ok(session)
  }

  async fn check_availability(&self, query: AvailabilityQuery) -> Result<Availability> {
    self
      .read(move |conn| Ok(schedule::check_availability(&mut SqliteUnit { conn }, &query)?))
      .await
  }

  async fn client_schedule(&self, client_id: i64) -> Result<Vec<TrainingSession>> {
    self
      .read(move |conn| query::upcoming_sessions(conn, Party::Client, client_id, Utc::now()))
      .await
  }

  async fn trainer_schedule(&self, trainer_id: i64) -> Result<Vec<TrainingSession>> {
    self
      .read(move |conn| query::upcoming_sessions(conn, Party::Trainer, trainer_id, Utc::now()))
      .await
  }
}

fn log_transition(message: &'static str, view: &ContractView) {
  tracing::info!(
    contract_id = view.contract.contract_id,
    code = %view.contract.code,
    status = %view.contract.status,
    history = view.history.len(),
    "{message}"
  );
}

#[cfg(test)]
impl SqliteStore {
  /// Run a raw statement, bypassing the engines.
  pub(crate) async fn execute_raw(&self, sql: &'static str) -> Result<usize> {
    Ok(self.conn.call(move |conn| Ok(conn.execute(sql, [])?)).await?)
  }
}
