//! Contract lifecycle engine.
//!
//! Every status change a contract can undergo is decided by [`transition`],
//! a single table keyed by the current status and the requested operation.
//! The engine functions below load the contract through a [`UnitOfWork`],
//! consult the table, persist the new status and append exactly one history
//! entry per actual transition.

use chrono::{DateTime, Utc};

use crate::{
  Error, Result,
  code::CodeSeries,
  contract::{
    Contract, ContractDraft, ContractPatch, ContractStatus, ContractView, FreezeContract,
    HistoryEntry, NewContract, NewHistoryEntry, RenewContract, check_dates,
  },
  membership::check_price,
  unit::UnitOfWork,
};

pub const REASON_CREATED: &str = "contract creation";
pub const REASON_RENEWAL_CREATED: &str = "creation via renewal";
pub const REASON_UPDATED: &str = "contract update";
pub const REASON_CANCELLED: &str = "contract cancellation";
pub const REASON_RENEWED: &str = "renewal";

// ─── Transition table ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractOperation {
  Create { initial: ContractStatus },
  CreateByRenewal,
  Update { target: ContractStatus, reason: Option<String> },
  Cancel,
  /// Applied to the source contract of a renewal.
  Renew,
  Freeze { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
  /// Status stays as it is and no history is written.
  Unchanged,
  Move { from: Option<ContractStatus>, to: ContractStatus, reason: String },
}

/// Decide the outcome of applying `op` to a contract whose status is
/// `current` (`None` for a contract that does not exist yet).
pub fn transition(current: Option<ContractStatus>, op: &ContractOperation) -> Result<Transition> {
  use ContractOperation as Op;
  use ContractStatus as S;

  let moved = |to: ContractStatus, reason: &str| Transition::Move {
    from: current,
    to,
    reason: reason.to_owned(),
  };

  match (current, op) {
    (None, Op::Create { initial }) => Ok(moved(*initial, REASON_CREATED)),
    (None, Op::CreateByRenewal) => Ok(moved(S::Active, REASON_RENEWAL_CREATED)),
    (Some(_), Op::Create { .. } | Op::CreateByRenewal) => {
      Err(Error::InvalidState("contract already exists".into()))
    }
    (None, _) => Err(Error::InvalidState("contract does not exist yet".into())),

    (Some(s), Op::Update { target, .. }) if s == *target => Ok(Transition::Unchanged),
    (Some(_), Op::Update { target, reason }) => Ok(moved(
      *target,
      reason.as_deref().filter(|r| !r.trim().is_empty()).unwrap_or(REASON_UPDATED),
    )),

    (Some(_), Op::Cancel) => Ok(moved(S::Cancelled, REASON_CANCELLED)),

    (Some(S::Expired), Op::Renew) => Ok(Transition::Unchanged),
    (Some(_), Op::Renew) => Ok(moved(S::Expired, REASON_RENEWED)),

    (Some(S::Active), Op::Freeze { reason }) => Ok(moved(S::Frozen, reason.as_str())),
    (Some(_), Op::Freeze { .. }) => {
      Err(Error::InvalidState("only active contracts may be frozen".into()))
    }
  }
}

// ─── Engine ──────────────────────────────────────────────────────────────────

fn record<U: UnitOfWork + ?Sized>(
  uow: &mut U,
  contract_id: i64,
  transition: Transition,
  actor_id: Option<i64>,
  now: DateTime<Utc>,
) -> Result<()> {
  match transition {
    Transition::Unchanged => Ok(()),
    Transition::Move { from, to, reason } => uow.append_history(&NewHistoryEntry {
      contract_id,
      previous_status: from,
      new_status: to,
      changed_at: now,
      actor_id,
      reason,
    }),
  }
}

fn require<U: UnitOfWork + ?Sized>(uow: &mut U, contract_id: i64) -> Result<Contract> {
  uow.contract(contract_id)?.ok_or_else(|| Error::not_found("contract", contract_id))
}

fn view<U: UnitOfWork + ?Sized>(uow: &mut U, contract: Contract) -> Result<ContractView> {
  let history = uow.history(contract.contract_id)?;
  Ok(ContractView { contract, history })
}

/// Apply `op` to an existing contract and persist it.
fn apply<U: UnitOfWork + ?Sized>(
  uow: &mut U,
  contract: &mut Contract,
  op: &ContractOperation,
  actor_id: Option<i64>,
  now: DateTime<Utc>,
) -> Result<()> {
  let transition = transition(Some(contract.status), op)?;
  if let Transition::Move { to, .. } = &transition {
    contract.status = *to;
  }
  contract.updated_by = actor_id;
  contract.updated_at = now;
  uow.update_contract(contract)?;
  record(uow, contract.contract_id, transition, actor_id, now)
}

fn insert<U: UnitOfWork + ?Sized>(
  uow: &mut U,
  mut draft: ContractDraft,
  op: &ContractOperation,
) -> Result<Contract> {
  let transition = transition(None, op)?;
  if let Transition::Move { to, .. } = &transition {
    draft.status = *to;
  }
  let highest = uow.max_code(CodeSeries::Contract)?;
  draft.code = CodeSeries::Contract.next_after(highest.as_deref())?;
  let contract = uow.insert_contract(&draft)?;
  record(uow, contract.contract_id, transition, draft.actor_id, draft.now)?;
  Ok(contract)
}

pub fn create_contract<U: UnitOfWork + ?Sized>(
  uow: &mut U,
  input: &NewContract,
  actor_id: Option<i64>,
  now: DateTime<Utc>,
) -> Result<ContractView> {
  input.validate()?;
  if uow.client(input.client_id)?.is_none() {
    return Err(Error::not_found("client", input.client_id));
  }
  let membership = uow
    .membership(input.membership_id)?
    .ok_or_else(|| Error::not_found("membership", input.membership_id))?;

  let initial = input.status.unwrap_or(ContractStatus::Active);
  let draft = ContractDraft {
    code: String::new(),
    client_id: input.client_id,
    membership_id: input.membership_id,
    start_date: input.start_date,
    end_date: input.end_date,
    price: input.price.unwrap_or(membership.price),
    status: initial,
    renewed_from: None,
    actor_id,
    now,
  };
  let contract = insert(uow, draft, &ContractOperation::Create { initial })?;
  view(uow, contract)
}

pub fn update_contract<U: UnitOfWork + ?Sized>(
  uow: &mut U,
  contract_id: i64,
  patch: ContractPatch,
  actor_id: Option<i64>,
  now: DateTime<Utc>,
) -> Result<ContractView> {
  let mut contract = require(uow, contract_id)?;
  if let Some(membership_id) = patch.membership_id {
    if uow.membership(membership_id)?.is_none() {
      return Err(Error::not_found("membership", membership_id));
    }
    contract.membership_id = membership_id;
  }
  if let Some(start) = patch.start_date {
    contract.start_date = start;
  }
  if let Some(end) = patch.end_date {
    contract.end_date = end;
  }
  if let Some(price) = patch.price {
    contract.price = price;
  }
  check_dates(contract.start_date, contract.end_date)?;
  check_price(contract.price)?;

  let op = ContractOperation::Update {
    target: patch.status.unwrap_or(contract.status),
    reason: patch.reason,
  };
  apply(uow, &mut contract, &op, actor_id, now)?;
  view(uow, contract)
}

/// Force `Cancelled`. Always recorded, even for an already-cancelled contract.
pub fn cancel_contract<U: UnitOfWork + ?Sized>(
  uow: &mut U,
  contract_id: i64,
  actor_id: Option<i64>,
  now: DateTime<Utc>,
) -> Result<ContractView> {
  let mut contract = require(uow, contract_id)?;
  apply(uow, &mut contract, &ContractOperation::Cancel, actor_id, now)?;
  view(uow, contract)
}

/// Expire the source contract (unless it already is) and create its
/// successor for the same client. Returns the successor.
pub fn renew_contract<U: UnitOfWork + ?Sized>(
  uow: &mut U,
  input: &RenewContract,
  actor_id: Option<i64>,
  now: DateTime<Utc>,
) -> Result<ContractView> {
  input.validate()?;
  let mut source = require(uow, input.contract_id)?;
  let membership = uow
    .membership(input.membership_id)?
    .ok_or_else(|| Error::not_found("membership", input.membership_id))?;

  if let Transition::Move { .. } = transition(Some(source.status), &ContractOperation::Renew)? {
    apply(uow, &mut source, &ContractOperation::Renew, actor_id, now)?;
  }

  let draft = ContractDraft {
    code: String::new(),
    client_id: source.client_id,
    membership_id: membership.membership_id,
    start_date: input.start_date,
    end_date: input.end_date,
    price: input.price.unwrap_or(membership.price),
    status: ContractStatus::Active,
    renewed_from: Some(source.contract_id),
    actor_id,
    now,
  };
  let renewed = insert(uow, draft, &ContractOperation::CreateByRenewal)?;
  view(uow, renewed)
}

pub fn freeze_contract<U: UnitOfWork + ?Sized>(
  uow: &mut U,
  input: &FreezeContract,
  actor_id: Option<i64>,
  now: DateTime<Utc>,
) -> Result<ContractView> {
  let mut contract = require(uow, input.contract_id)?;
  let reason = input.reason.trim();
  if reason.is_empty() {
    return Err(Error::validation("a reason is required to freeze a contract"));
  }
  let op = ContractOperation::Freeze { reason: reason.to_owned() };
  apply(uow, &mut contract, &op, actor_id, now)?;
  view(uow, contract)
}

pub fn contract_history<U: UnitOfWork + ?Sized>(
  uow: &mut U,
  contract_id: i64,
) -> Result<Vec<HistoryEntry>> {
  uow.history(contract_id)
}

pub fn load_contract<U: UnitOfWork + ?Sized>(
  uow: &mut U,
  contract_id: i64,
) -> Result<Option<ContractView>> {
  match uow.contract(contract_id)? {
    Some(contract) => view(uow, contract).map(Some),
    None => Ok(None),
  }
}
