//! Memberships: the purchasable plans a contract binds a client to.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Error, Result, code::CodeSeries, unit::UnitOfWork, validate};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Membership {
  pub membership_id: i64,
  pub code:          String,
  pub name:          String,
  pub description:   Option<String>,
  pub access_days:   u32,
  pub validity_days: u32,
  pub price:         Decimal,
  pub active:        bool,
  pub created_at:    DateTime<Utc>,
}

fn default_true() -> bool { true }

#[derive(Debug, Clone, Deserialize)]
pub struct NewMembership {
  pub name:          String,
  #[serde(default)]
  pub description:   Option<String>,
  pub access_days:   u32,
  pub validity_days: u32,
  pub price:         Decimal,
  #[serde(default = "default_true")]
  pub active:        bool,
}

impl NewMembership {
  pub fn validate(&self) -> Result<()> {
    validate::length("name", &self.name, 3, 100)?;
    check_days("access_days", self.access_days)?;
    check_days("validity_days", self.validity_days)?;
    check_price(self.price)
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MembershipPatch {
  pub name:          Option<String>,
  pub description:   Option<String>,
  pub access_days:   Option<u32>,
  pub validity_days: Option<u32>,
  pub price:         Option<Decimal>,
  pub active:        Option<bool>,
}

impl MembershipPatch {
  pub fn validate(&self) -> Result<()> {
    if let Some(name) = &self.name {
      validate::length("name", name, 3, 100)?;
    }
    if let Some(days) = self.access_days {
      check_days("access_days", days)?;
    }
    if let Some(days) = self.validity_days {
      check_days("validity_days", days)?;
    }
    if let Some(price) = self.price {
      check_price(price)?;
    }
    Ok(())
  }
}

fn check_days(field: &str, days: u32) -> Result<()> {
  if days < 1 {
    return Err(Error::validation(format!("{field} must be at least 1")));
  }
  Ok(())
}

/// Prices are non-negative amounts with at most two decimal places.
pub fn check_price(price: Decimal) -> Result<()> {
  if price < Decimal::ZERO {
    return Err(Error::validation("price cannot be negative"));
  }
  if price.normalize().scale() > 2 {
    return Err(Error::validation("price must have at most two decimal places"));
  }
  Ok(())
}

// ─── Operations ──────────────────────────────────────────────────────────────

pub fn create_membership<U: UnitOfWork + ?Sized>(
  uow: &mut U,
  input: &NewMembership,
  now: DateTime<Utc>,
) -> Result<Membership> {
  input.validate()?;
  let highest = uow.max_code(CodeSeries::Membership)?;
  let code = CodeSeries::Membership.next_after(highest.as_deref())?;
  uow.insert_membership(&code, input, now)
}

pub fn update_membership<U: UnitOfWork + ?Sized>(
  uow: &mut U,
  membership_id: i64,
  patch: MembershipPatch,
) -> Result<Membership> {
  let mut membership = uow
    .membership(membership_id)?
    .ok_or_else(|| Error::not_found("membership", membership_id))?;
  patch.validate()?;

  if let Some(v) = patch.name {
    membership.name = v;
  }
  if let Some(v) = patch.description {
    membership.description = Some(v);
  }
  if let Some(v) = patch.access_days {
    membership.access_days = v;
  }
  if let Some(v) = patch.validity_days {
    membership.validity_days = v;
  }
  if let Some(v) = patch.price {
    membership.price = v;
  }
  if let Some(v) = patch.active {
    membership.active = v;
  }
  uow.update_membership(&membership)?;
  Ok(membership)
}

/// Soft delete: the plan stays referenced by its contracts.
pub fn deactivate_membership<U: UnitOfWork + ?Sized>(
  uow: &mut U,
  membership_id: i64,
) -> Result<Membership> {
  update_membership(uow, membership_id, MembershipPatch {
    active: Some(false),
    ..Default::default()
  })
}
