//! Row loaders and list queries shared by the unit of work and the read
//! paths of [`crate::SqliteStore`].
//!
//! Every function takes a plain connection so it can run either inside an
//! open transaction or on its own.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension as _, params};

use gym_core::{
  account::{Account, Credentials},
  client::{Client, EmergencyContact},
  contract::{Contract, HistoryEntry},
  membership::Membership,
  query::{
    ClientQuery, ContractQuery, MembershipQuery, Page, PageRequest, SessionQuery, like_pattern,
  },
  session::{SessionStatus, TrainingSession},
};

use crate::{
  Result,
  encode::{
    ACCOUNT_COLUMNS, CLIENT_COLUMNS, CONTRACT_COLUMNS, MEMBERSHIP_COLUMNS, RawAccount,
    RawClient, RawContract, RawHistoryEntry, RawMembership, RawSession, SESSION_COLUMNS,
    decode_dt, encode_date, encode_dt,
  },
};

fn limit_offset(page: PageRequest) -> (i64, i64) {
  let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);
  (i64::from(page.limit), offset)
}

fn total(n: i64) -> u64 { u64::try_from(n).unwrap_or(0) }

// ─── Accounts ────────────────────────────────────────────────────────────────

pub fn account(conn: &Connection, id: i64) -> Result<Option<Account>> {
  let raw = conn
    .prepare_cached(&format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE account_id = ?1"))?
    .query_row(params![id], RawAccount::from_row)
    .optional()?;
  raw.map(RawAccount::into_account).transpose()
}

pub fn credentials(conn: &Connection, email: &str) -> Result<Option<Credentials>> {
  let raw = conn
    .prepare_cached(&format!(
      "SELECT {ACCOUNT_COLUMNS}, password_hash FROM accounts WHERE email = ?1"
    ))?
    .query_row(params![email], |row| {
      Ok((RawAccount::from_row(row)?, row.get::<_, String>(15)?))
    })
    .optional()?;
  raw
    .map(|(raw, password_hash)| -> Result<Credentials> {
      Ok(Credentials { account: raw.into_account()?, password_hash })
    })
    .transpose()
}

// ─── Clients ─────────────────────────────────────────────────────────────────

fn emergency_contacts(conn: &Connection, client_id: i64) -> Result<Vec<EmergencyContact>> {
  let mut stmt = conn.prepare_cached(
    "SELECT contact_id, name, phone, relationship, same_as_beneficiary
       FROM emergency_contacts
      WHERE client_id = ?1
      ORDER BY contact_id",
  )?;
  let contacts = stmt
    .query_map(params![client_id], |row| {
      Ok(EmergencyContact {
        contact_id:          row.get(0)?,
        name:                row.get(1)?,
        phone:               row.get(2)?,
        relationship:        row.get(3)?,
        same_as_beneficiary: row.get(4)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(contacts)
}

/// Load a client with its account and emergency contacts hydrated.
pub fn client(conn: &Connection, id: i64) -> Result<Option<Client>> {
  let raw = conn
    .prepare_cached(&format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE client_id = ?1"))?
    .query_row(params![id], RawClient::from_row)
    .optional()?;
  let Some(raw) = raw else {
    return Ok(None);
  };

  let account = match raw.account_id {
    Some(account_id) => account(conn, account_id)?,
    None => None,
  };
  Ok(Some(Client {
    client_id: raw.client_id,
    code: raw.code,
    account,
    holder_id: raw.holder_id,
    relationship: raw.relationship,
    active: raw.active,
    registered_at: decode_dt(&raw.registered_at)?,
    updated_at: decode_dt(&raw.updated_at)?,
    emergency_contacts: emergency_contacts(conn, raw.client_id)?,
  }))
}

fn clients_by_id(conn: &Connection, ids: Vec<i64>) -> Result<Vec<Client>> {
  let mut clients = Vec::with_capacity(ids.len());
  for id in ids {
    if let Some(c) = client(conn, id)? {
      clients.push(c);
    }
  }
  Ok(clients)
}

const CLIENT_FILTER: &str = "
  FROM clients c
  LEFT JOIN accounts a ON a.account_id = c.account_id
 WHERE (?1 IS NULL OR c.active = ?1)
   AND (?2 IS NULL OR c.holder_id = ?2)
   AND (?3 IS NULL
        OR c.code LIKE ?3
        OR a.first_name LIKE ?3
        OR a.last_name LIKE ?3
        OR a.email LIKE ?3
        OR a.document_number LIKE ?3)";

/// Newest registrations first.
pub fn list_clients(conn: &Connection, query: &ClientQuery) -> Result<Page<Client>> {
  let search = like_pattern(query.search.as_deref());
  let count: i64 = conn
    .prepare_cached(&format!("SELECT COUNT(*) {CLIENT_FILTER}"))?
    .query_row(params![query.active, query.holder_id, search], |r| r.get(0))?;

  let (limit, offset) = limit_offset(query.page);
  let ids = conn
    .prepare_cached(&format!(
      "SELECT c.client_id {CLIENT_FILTER}
       ORDER BY c.registered_at DESC, c.client_id DESC
       LIMIT ?4 OFFSET ?5"
    ))?
    .query_map(params![query.active, query.holder_id, search, limit, offset], |r| r.get(0))?
    .collect::<rusqlite::Result<Vec<i64>>>()?;

  Ok(Page::new(clients_by_id(conn, ids)?, total(count), query.page))
}

/// Active clients whose holder is `holder_id`.
pub fn beneficiaries(conn: &Connection, holder_id: i64) -> Result<Vec<Client>> {
  let ids = conn
    .prepare_cached(
      "SELECT client_id FROM clients WHERE holder_id = ?1 AND active = 1 ORDER BY client_id",
    )?
    .query_map(params![holder_id], |r| r.get(0))?
    .collect::<rusqlite::Result<Vec<i64>>>()?;
  clients_by_id(conn, ids)
}

// ─── Memberships ─────────────────────────────────────────────────────────────

pub fn membership(conn: &Connection, id: i64) -> Result<Option<Membership>> {
  let raw = conn
    .prepare_cached(&format!(
      "SELECT {MEMBERSHIP_COLUMNS} FROM memberships WHERE membership_id = ?1"
    ))?
    .query_row(params![id], RawMembership::from_row)
    .optional()?;
  raw.map(RawMembership::into_membership).transpose()
}

const MEMBERSHIP_FILTER: &str = "
  FROM memberships
 WHERE (?1 IS NULL OR active = ?1)
   AND (?2 IS NULL OR name LIKE ?2 OR code LIKE ?2)";

pub fn list_memberships(conn: &Connection, query: &MembershipQuery) -> Result<Page<Membership>> {
  let search = like_pattern(query.search.as_deref());
  let count: i64 = conn
    .prepare_cached(&format!("SELECT COUNT(*) {MEMBERSHIP_FILTER}"))?
    .query_row(params![query.active, search], |r| r.get(0))?;

  let (limit, offset) = limit_offset(query.page);
  let data = conn
    .prepare_cached(&format!(
      "SELECT {MEMBERSHIP_COLUMNS} {MEMBERSHIP_FILTER} ORDER BY code LIMIT ?3 OFFSET ?4"
    ))?
    .query_map(params![query.active, search, limit, offset], RawMembership::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?
    .into_iter()
    .map(RawMembership::into_membership)
    .collect::<Result<Vec<_>>>()?;

  Ok(Page::new(data, total(count), query.page))
}

// ─── Contracts ───────────────────────────────────────────────────────────────

pub fn contract(conn: &Connection, id: i64) -> Result<Option<Contract>> {
  let raw = conn
    .prepare_cached(&format!("SELECT {CONTRACT_COLUMNS} FROM contracts WHERE contract_id = ?1"))?
    .query_row(params![id], RawContract::from_row)
    .optional()?;
  raw.map(RawContract::into_contract).transpose()
}

/// Most recent first; ties on `changed_at` resolve newest insert first.
pub fn history(conn: &Connection, contract_id: i64) -> Result<Vec<HistoryEntry>> {
  conn
    .prepare_cached(
      "SELECT h.history_id, h.contract_id, h.previous_status, h.new_status, h.changed_at,
              h.actor_id, a.first_name || ' ' || a.last_name, h.reason
         FROM contract_history h
         LEFT JOIN accounts a ON a.account_id = h.actor_id
        WHERE h.contract_id = ?1
        ORDER BY h.changed_at DESC, h.history_id DESC",
    )?
    .query_map(params![contract_id], RawHistoryEntry::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?
    .into_iter()
    .map(RawHistoryEntry::into_entry)
    .collect()
}

const CONTRACT_FILTER: &str = "
  FROM contracts
 WHERE (?1 IS NULL OR status = ?1)
   AND (?2 IS NULL OR client_id = ?2)
   AND (?3 IS NULL OR start_date >= ?3)
   AND (?4 IS NULL OR end_date <= ?4)
   AND (?5 IS NULL OR code LIKE ?5)";

/// Newest contracts first.
pub fn list_contracts(conn: &Connection, query: &ContractQuery) -> Result<Page<Contract>> {
  let status = query.status.map(|s| s.as_str());
  let start_from = query.start_from.map(encode_date);
  let end_until = query.end_until.map(encode_date);
  let search = like_pattern(query.search.as_deref());

  let count: i64 = conn
    .prepare_cached(&format!("SELECT COUNT(*) {CONTRACT_FILTER}"))?
    .query_row(params![status, query.client_id, start_from, end_until, search], |r| r.get(0))?;

  let (limit, offset) = limit_offset(query.page);
  let data = conn
    .prepare_cached(&format!(
      "SELECT {CONTRACT_COLUMNS} {CONTRACT_FILTER}
       ORDER BY created_at DESC, contract_id DESC
       LIMIT ?6 OFFSET ?7"
    ))?
    .query_map(
      params![status, query.client_id, start_from, end_until, search, limit, offset],
      RawContract::from_row,
    )?
    .collect::<rusqlite::Result<Vec<_>>>()?
    .into_iter()
    .map(RawContract::into_contract)
    .collect::<Result<Vec<_>>>()?;

  Ok(Page::new(data, total(count), query.page))
}

// ─── Training sessions ───────────────────────────────────────────────────────

pub fn session(conn: &Connection, id: i64) -> Result<Option<TrainingSession>> {
  let raw = conn
    .prepare_cached(&format!(
      "SELECT {SESSION_COLUMNS} FROM training_sessions WHERE session_id = ?1"
    ))?
    .query_row(params![id], RawSession::from_row)
    .optional()?;
  raw.map(RawSession::into_session).transpose()
}

fn sessions(
  conn: &Connection,
  sql: &str,
  params: impl rusqlite::Params,
) -> Result<Vec<TrainingSession>> {
  conn
    .prepare_cached(sql)?
    .query_map(params, RawSession::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?
    .into_iter()
    .map(RawSession::into_session)
    .collect()
}

/// Non-cancelled sessions overlapping `[start, end)` that involve the given
/// trainer or client; every session when neither is given.
pub fn sessions_overlapping(
  conn: &Connection,
  start: DateTime<Utc>,
  end: DateTime<Utc>,
  trainer_id: Option<i64>,
  client_id: Option<i64>,
) -> Result<Vec<TrainingSession>> {
  sessions(
    conn,
    &format!(
      "SELECT {SESSION_COLUMNS} FROM training_sessions
        WHERE status != 'cancelled'
          AND start_at < ?1 AND end_at > ?2
          AND ((?3 IS NULL AND ?4 IS NULL) OR trainer_id = ?3 OR client_id = ?4)
        ORDER BY start_at, session_id"
    ),
    params![encode_dt(end), encode_dt(start), trainer_id, client_id],
  )
}

const SESSION_FILTER: &str = "
  FROM training_sessions
 WHERE (?1 IS NULL OR status = ?1)
   AND (?2 IS NULL OR trainer_id = ?2)
   AND (?3 IS NULL OR client_id = ?3)
   AND (?4 IS NULL OR start_at >= ?4)
   AND (?5 IS NULL OR end_at <= ?5)
   AND (?6 IS NULL OR title LIKE ?6)";

/// Earliest sessions first.
pub fn list_sessions(conn: &Connection, query: &SessionQuery) -> Result<Page<TrainingSession>> {
  let status = query.status.map(SessionStatus::as_str);
  let start_from = query.start_from.map(encode_dt);
  let end_until = query.end_until.map(encode_dt);
  let search = like_pattern(query.search.as_deref());

  let count: i64 = conn.prepare_cached(&format!("SELECT COUNT(*) {SESSION_FILTER}"))?.query_row(
    params![status, query.trainer_id, query.client_id, start_from, end_until, search],
    |r| r.get(0),
  )?;

  let (limit, offset) = limit_offset(query.page);
  let data = sessions(
    conn,
    &format!(
      "SELECT {SESSION_COLUMNS} {SESSION_FILTER}
       ORDER BY start_at, session_id
       LIMIT ?7 OFFSET ?8"
    ),
    params![
      status,
      query.trainer_id,
      query.client_id,
      start_from,
      end_until,
      search,
      limit,
      offset
    ],
  )?;

  Ok(Page::new(data, total(count), query.page))
}

/// Which side of a booking an upcoming-schedule query is for.
#[derive(Debug, Clone, Copy)]
pub enum Party {
  Client,
  Trainer,
}

/// Non-cancelled sessions starting at or after `now`, earliest first.
pub fn upcoming_sessions(
  conn: &Connection,
  party: Party,
  id: i64,
  now: DateTime<Utc>,
) -> Result<Vec<TrainingSession>> {
  let column = match party {
    Party::Client => "client_id",
    Party::Trainer => "trainer_id",
  };
  sessions(
    conn,
    &format!(
      "SELECT {SESSION_COLUMNS} FROM training_sessions
        WHERE {column} = ?1 AND status != 'cancelled' AND start_at >= ?2
        ORDER BY start_at, session_id"
    ),
    params![id, encode_dt(now)],
  )
}
