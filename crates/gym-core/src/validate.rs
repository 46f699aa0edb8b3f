//! Field-level checks shared by the input types.

use crate::{Error, Result};

pub(crate) fn length(field: &str, value: &str, min: usize, max: usize) -> Result<()> {
  let len = value.trim().chars().count();
  if len < min || len > max {
    return Err(Error::validation(format!(
      "{field} must be between {min} and {max} characters"
    )));
  }
  Ok(())
}

pub(crate) fn max_length(field: &str, value: Option<&str>, max: usize) -> Result<()> {
  match value {
    Some(v) if v.chars().count() > max => Err(Error::validation(format!(
      "{field} must be at most {max} characters"
    ))),
    _ => Ok(()),
  }
}

/// Phone numbers are 7 to 15 ASCII digits.
pub(crate) fn phone(field: &str, value: &str) -> Result<()> {
  let ok = (7..=15).contains(&value.len()) && value.bytes().all(|b| b.is_ascii_digit());
  if !ok {
    return Err(Error::validation(format!("{field} must be 7 to 15 digits")));
  }
  Ok(())
}

pub(crate) fn email(value: &str) -> Result<()> {
  let ok = match value.split_once('@') {
    Some((local, domain)) => {
      !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !value.contains(char::is_whitespace)
    }
    None => false,
  };
  if !ok {
    return Err(Error::validation(format!("invalid email address: {value:?}")));
  }
  Ok(())
}
