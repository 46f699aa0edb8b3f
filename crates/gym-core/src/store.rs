//! The `GymStore` trait: the async surface the HTTP layer depends on.
//!
//! Implemented by storage backends (e.g. `gym-store-sqlite`). Every write
//! runs one engine operation inside a single storage transaction; reads may
//! bypass the engines and query the backend directly.

use std::future::Future;

use crate::{
  account::{Account, Credentials, NewAccount},
  client::{Client, ClientPatch, NewClient},
  contract::{
    Contract, ContractPatch, ContractView, FreezeContract, HistoryEntry, NewContract,
    RenewContract,
  },
  membership::{Membership, MembershipPatch, NewMembership},
  query::{ClientQuery, ContractQuery, MembershipQuery, Page, SessionQuery},
  schedule::{Availability, AvailabilityQuery},
  session::{NewSession, SessionPatch, TrainingSession},
};

/// Abstraction over a gym store backend.
///
/// `actor` arguments identify the authenticated account performing a
/// contract operation; it is recorded in the contract's history.
///
/// All methods return `Send` futures so the trait can be used from axum
/// handlers on a multi-threaded runtime.
pub trait GymStore: Send + Sync {
  type Error: std::error::Error + Into<crate::Error> + Send + Sync + 'static;

  // ── Accounts ──────────────────────────────────────────────────────────

  /// Create an account. `input.password_hash` must already be set.
  fn create_account(
    &self,
    input: NewAccount,
  ) -> impl Future<Output = Result<Account, Self::Error>> + Send + '_;

  fn get_account(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + '_;

  /// Look up an account and its password hash by email, for login.
  fn find_credentials(
    &self,
    email: String,
  ) -> impl Future<Output = Result<Option<Credentials>, Self::Error>> + Send + '_;

  // ── Clients ───────────────────────────────────────────────────────────

  fn list_clients(
    &self,
    query: ClientQuery,
  ) -> impl Future<Output = Result<Page<Client>, Self::Error>> + Send + '_;

  fn get_client(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Client>, Self::Error>> + Send + '_;

  fn create_client(
    &self,
    input: NewClient,
  ) -> impl Future<Output = Result<Client, Self::Error>> + Send + '_;

  fn update_client(
    &self,
    id: i64,
    patch: ClientPatch,
  ) -> impl Future<Output = Result<Client, Self::Error>> + Send + '_;

  /// Soft delete.
  fn deactivate_client(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Client, Self::Error>> + Send + '_;

  /// Active clients whose holder is `id`.
  fn beneficiaries(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Vec<Client>, Self::Error>> + Send + '_;

  // ── Memberships ───────────────────────────────────────────────────────

  fn list_memberships(
    &self,
    query: MembershipQuery,
  ) -> impl Future<Output = Result<Page<Membership>, Self::Error>> + Send + '_;

  fn get_membership(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Membership>, Self::Error>> + Send + '_;

  fn create_membership(
    &self,
    input: NewMembership,
  ) -> impl Future<Output = Result<Membership, Self::Error>> + Send + '_;

  fn update_membership(
    &self,
    id: i64,
    patch: MembershipPatch,
  ) -> impl Future<Output = Result<Membership, Self::Error>> + Send + '_;

  /// Soft delete.
  fn deactivate_membership(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Membership, Self::Error>> + Send + '_;

  // ── Contracts ─────────────────────────────────────────────────────────

  fn list_contracts(
    &self,
    query: ContractQuery,
  ) -> impl Future<Output = Result<Page<Contract>, Self::Error>> + Send + '_;

  /// The contract with its history, or `None` if it does not exist.
  fn get_contract(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<ContractView>, Self::Error>> + Send + '_;

  fn create_contract(
    &self,
    input: NewContract,
    actor: Option<i64>,
  ) -> impl Future<Output = Result<ContractView, Self::Error>> + Send + '_;

  fn update_contract(
    &self,
    id: i64,
    patch: ContractPatch,
    actor: Option<i64>,
  ) -> impl Future<Output = Result<ContractView, Self::Error>> + Send + '_;

  fn cancel_contract(
    &self,
    id: i64,
    actor: Option<i64>,
  ) -> impl Future<Output = Result<ContractView, Self::Error>> + Send + '_;

  /// Returns the newly created successor contract.
  fn renew_contract(
    &self,
    input: RenewContract,
    actor: Option<i64>,
  ) -> impl Future<Output = Result<ContractView, Self::Error>> + Send + '_;

  fn freeze_contract(
    &self,
    input: FreezeContract,
    actor: Option<i64>,
  ) -> impl Future<Output = Result<ContractView, Self::Error>> + Send + '_;

  /// Most recent first. Empty for unknown contracts.
  fn contract_history(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Vec<HistoryEntry>, Self::Error>> + Send + '_;

  // ── Training sessions ─────────────────────────────────────────────────

  fn list_sessions(
    &self,
    query: SessionQuery,
  ) -> impl Future<Output = Result<Page<TrainingSession>, Self::Error>> + Send + '_;

  fn get_session(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<TrainingSession>, Self::Error>> + Send + '_;

  fn create_session(
    &self,
    input: NewSession,
  ) -> impl Future<Output = Result<TrainingSession, Self::Error>> + Send + '_;

  fn update_session(
    &self,
    id: i64,
    patch: SessionPatch,
  ) -> impl Future<Output = Result<TrainingSession, Self::Error>> + Send + '_;

  fn cancel_session(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<TrainingSession, Self::Error>> + Send + '_;

  fn check_availability(
    &self,
    query: AvailabilityQuery,
  ) -> impl Future<Output = Result<Availability, Self::Error>> + Send + '_;

  /// Upcoming non-cancelled sessions of a client, earliest first.
  fn client_schedule(
    &self,
    client_id: i64,
  ) -> impl Future<Output = Result<Vec<TrainingSession>, Self::Error>> + Send + '_;

  /// Upcoming non-cancelled sessions of a trainer, earliest first.
  fn trainer_schedule(
    &self,
    trainer_id: i64,
  ) -> impl Future<Output = Result<Vec<TrainingSession>, Self::Error>> + Send + '_;
}
