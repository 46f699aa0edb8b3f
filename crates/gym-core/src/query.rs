//! Pagination and list filters shared by every `find_all` operation.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, contract::ContractStatus, session::SessionStatus};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;

// ─── Paging ──────────────────────────────────────────────────────────────────

/// A 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
  pub page:  u32,
  pub limit: u32,
}

impl Default for PageRequest {
  fn default() -> Self { Self { page: DEFAULT_PAGE, limit: DEFAULT_LIMIT } }
}

impl PageRequest {
  /// Build a request from optional raw values, applying the defaults.
  pub fn new(page: Option<u32>, limit: Option<u32>) -> Result<Self> {
    let request = Self {
      page:  page.unwrap_or(DEFAULT_PAGE),
      limit: limit.unwrap_or(DEFAULT_LIMIT),
    };
    if request.page < 1 {
      return Err(Error::validation("page must be at least 1"));
    }
    if request.limit < 1 {
      return Err(Error::validation("limit must be at least 1"));
    }
    Ok(request)
  }

  pub fn offset(&self) -> u64 { u64::from(self.page.saturating_sub(1)) * u64::from(self.limit) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
  pub total:       u64,
  pub page:        u32,
  pub limit:       u32,
  pub total_pages: u64,
}

impl Pagination {
  pub fn new(total: u64, request: PageRequest) -> Self {
    Self {
      total,
      page: request.page,
      limit: request.limit,
      total_pages: total.div_ceil(u64::from(request.limit.max(1))),
    }
  }
}

/// One page of results plus the metadata needed to fetch the rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
  pub data:       Vec<T>,
  pub pagination: Pagination,
}

impl<T> Page<T> {
  pub fn new(data: Vec<T>, total: u64, request: PageRequest) -> Self {
    Self { data, pagination: Pagination::new(total, request) }
  }
}

// ─── Filters ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct ClientQuery {
  pub page:      PageRequest,
  /// Matched against the linked account's names, email and document number,
  /// and the client code.
  pub search:    Option<String>,
  pub active:    Option<bool>,
  pub holder_id: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct MembershipQuery {
  pub page:   PageRequest,
  /// Matched against name and code.
  pub search: Option<String>,
  pub active: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct ContractQuery {
  pub page:       PageRequest,
  /// Matched against the contract code.
  pub search:     Option<String>,
  pub status:     Option<ContractStatus>,
  pub client_id:  Option<i64>,
  /// Only contracts starting on or after this date.
  pub start_from: Option<NaiveDate>,
  /// Only contracts ending on or before this date.
  pub end_until:  Option<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
pub struct SessionQuery {
  pub page:       PageRequest,
  /// Matched against the session title.
  pub search:     Option<String>,
  pub status:     Option<SessionStatus>,
  pub trainer_id: Option<i64>,
  pub client_id:  Option<i64>,
  pub start_from: Option<DateTime<Utc>>,
  pub end_until:  Option<DateTime<Utc>>,
}

/// Wrap a free-text search term for a SQL `LIKE` comparison.
pub fn like_pattern(search: Option<&str>) -> Option<String> {
  search
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(|s| format!("%{s}%"))
}
