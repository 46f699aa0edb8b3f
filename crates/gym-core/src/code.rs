//! Human-readable entity codes (`P001`, `U001`, `M001`, `C0001`).
//!
//! Each series is a one-letter prefix followed by a number zero-padded to a
//! minimum width. The next code is derived from the highest existing code in
//! the series; callers must read that maximum inside the same unit of work
//! as the insert that uses the result.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeSeries {
  Client,
  Account,
  Membership,
  Contract,
}

impl CodeSeries {
  pub fn prefix(self) -> char {
    match self {
      Self::Client => 'P',
      Self::Account => 'U',
      Self::Membership => 'M',
      Self::Contract => 'C',
    }
  }

  /// Minimum number of digits after the prefix. Numbers past the width
  /// keep growing (`P999` is followed by `P1000`).
  pub fn width(self) -> usize {
    match self {
      Self::Contract => 4,
      Self::Client | Self::Account | Self::Membership => 3,
    }
  }

  /// Parse the numeric part of `code`, or `None` if it is not in this series.
  pub fn number_of(self, code: &str) -> Option<u32> {
    let digits = code.strip_prefix(self.prefix())?;
    if digits.len() < self.width() || !digits.bytes().all(|b| b.is_ascii_digit()) {
      return None;
    }
    digits.parse().ok()
  }

  pub fn format(self, number: u32) -> String {
    format!("{}{:0width$}", self.prefix(), number, width = self.width())
  }

  /// The code following `highest`, or the first code of the series.
  ///
  /// A `highest` value that does not belong to the series is treated as
  /// corrupt data and rejected rather than silently restarting at 1.
  pub fn next_after(self, highest: Option<&str>) -> Result<String> {
    let current = match highest {
      None => 0,
      Some(code) => self.number_of(code).ok_or_else(|| {
        Error::validation(format!("{code:?} is not a valid {} code", self.prefix()))
      })?,
    };
    let next = current.checked_add(1).ok_or_else(|| {
      Error::validation(format!("code series {} is exhausted", self.prefix()))
    })?;
    Ok(self.format(next))
  }
}

/// Orders codes of one series by their numeric value. A longer code is
/// greater; codes of equal length compare as strings.
pub fn numeric_order(a: &str, b: &str) -> std::cmp::Ordering {
  a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
