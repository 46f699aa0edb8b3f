//! Scheduling conflict detector.
//!
//! Two bookings conflict when their half-open intervals overlap:
//! `[a_start, a_end)` and `[b_start, b_end)` overlap iff
//! `a_start < b_end && b_start < a_end`. Back-to-back sessions therefore do
//! not conflict, and cancelled sessions never do.

use chrono::{DateTime, SubsecRound as _, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  session::{NewSession, SessionPatch, SessionStatus, TrainingSession, check_title},
  unit::UnitOfWork,
};

// ─── Intervals ───────────────────────────────────────────────────────────────

/// A non-empty half-open time interval. Bounds are kept at microsecond
/// precision, the resolution sessions are stored at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
  start: DateTime<Utc>,
  end:   DateTime<Utc>,
}

impl Interval {
  pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
    let (start, end) = (start.trunc_subsecs(6), end.trunc_subsecs(6));
    if end <= start {
      return Err(Error::validation("end must be after start"));
    }
    Ok(Self { start, end })
  }

  pub fn start(&self) -> DateTime<Utc> { self.start }

  pub fn end(&self) -> DateTime<Utc> { self.end }

  pub fn overlaps(&self, other: &Interval) -> bool {
    self.start < other.end && other.start < self.end
  }
}

/// Ids of the sessions in `existing` that block `candidate`. Cancelled
/// sessions and the session `exclude` (the one being rescheduled) are
/// ignored.
pub fn find_conflicts(
  candidate: &Interval,
  existing: &[TrainingSession],
  exclude: Option<i64>,
) -> Vec<i64> {
  existing
    .iter()
    .filter(|s| s.status != SessionStatus::Cancelled)
    .filter(|s| Some(s.session_id) != exclude)
    .filter(|s| {
      // Rows whose own interval is malformed cannot block anything.
      Interval::new(s.start, s.end).is_ok_and(|other| candidate.overlaps(&other))
    })
    .map(|s| s.session_id)
    .collect()
}

// ─── Availability ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityQuery {
  pub start:      DateTime<Utc>,
  pub end:        DateTime<Utc>,
  /// Without a trainer, sessions of every trainer are considered.
  #[serde(default)]
  pub trainer_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
  pub available: bool,
  pub conflicts: Vec<i64>,
}

impl Availability {
  fn from_conflicts(conflicts: Vec<i64>) -> Self {
    Self { available: conflicts.is_empty(), conflicts }
  }
}

pub fn check_availability<U: UnitOfWork + ?Sized>(
  uow: &mut U,
  query: &AvailabilityQuery,
) -> Result<Availability> {
  let window = Interval::new(query.start, query.end)?;
  let existing = uow.sessions_overlapping(&window, query.trainer_id, None)?;
  Ok(Availability::from_conflicts(find_conflicts(&window, &existing, None)))
}

fn ensure_free<U: UnitOfWork + ?Sized>(
  uow: &mut U,
  window: &Interval,
  trainer_id: i64,
  client_id: i64,
  exclude: Option<i64>,
) -> Result<()> {
  let existing = uow.sessions_overlapping(window, Some(trainer_id), Some(client_id))?;
  let conflicts = find_conflicts(window, &existing, exclude);
  if !conflicts.is_empty() {
    return Err(Error::Conflict { conflicts });
  }
  Ok(())
}

// ─── Operations ──────────────────────────────────────────────────────────────

/// Book a session. Preconditions are checked in order: interval, trainer,
/// client, the client's active contract, then overlaps.
pub fn create_session<U: UnitOfWork + ?Sized>(
  uow: &mut U,
  input: &NewSession,
  now: DateTime<Utc>,
) -> Result<TrainingSession> {
  let window = Interval::new(input.start, input.end)?;
  check_title(&input.title)?;
  if uow.account(input.trainer_id)?.is_none() {
    return Err(Error::not_found("trainer", input.trainer_id));
  }
  if uow.client(input.client_id)?.is_none() {
    return Err(Error::not_found("client", input.client_id));
  }
  if !uow.has_active_contract(input.client_id, now.date_naive())? {
    return Err(Error::InvalidState("client has no active contract".into()));
  }
  ensure_free(uow, &window, input.trainer_id, input.client_id, None)?;
  uow.insert_session(input, now)
}

pub fn update_session<U: UnitOfWork + ?Sized>(
  uow: &mut U,
  session_id: i64,
  patch: SessionPatch,
) -> Result<TrainingSession> {
  let mut session =
    uow.session(session_id)?.ok_or_else(|| Error::not_found("session", session_id))?;
  if let Some(title) = &patch.title {
    check_title(title)?;
  }
  if let Some(trainer_id) = patch.trainer_id
    && uow.account(trainer_id)?.is_none()
  {
    return Err(Error::not_found("trainer", trainer_id));
  }
  if let Some(client_id) = patch.client_id
    && uow.client(client_id)?.is_none()
  {
    return Err(Error::not_found("client", client_id));
  }

  let start = patch.start.unwrap_or(session.start);
  let end = patch.end.unwrap_or(session.end);
  let trainer_id = patch.trainer_id.unwrap_or(session.trainer_id);
  let client_id = patch.client_id.unwrap_or(session.client_id);
  let status = patch.status.unwrap_or(session.status);
  let window = Interval::new(start, end)?;

  let rescheduled = (patch.start.is_some() && patch.end.is_some())
    || start != session.start
    || end != session.end
    || trainer_id != session.trainer_id
    || client_id != session.client_id;
  let revived = session.status == SessionStatus::Cancelled;
  if (rescheduled || revived) && status != SessionStatus::Cancelled {
    ensure_free(uow, &window, trainer_id, client_id, Some(session_id))?;
  }

  session.start = window.start();
  session.end = window.end();
  session.trainer_id = trainer_id;
  session.client_id = client_id;
  session.status = status;
  if let Some(title) = patch.title {
    session.title = title;
  }
  if let Some(description) = patch.description {
    session.description = Some(description);
  }
  if let Some(notes) = patch.notes {
    session.notes = Some(notes);
  }
  uow.update_session(&session)?;
  Ok(session)
}

pub fn cancel_session<U: UnitOfWork + ?Sized>(
  uow: &mut U,
  session_id: i64,
) -> Result<TrainingSession> {
  let mut session =
    uow.session(session_id)?.ok_or_else(|| Error::not_found("session", session_id))?;
  session.status = SessionStatus::Cancelled;
  uow.update_session(&session)?;
  Ok(session)
}
