//! Bearer-token authentication: password hashing, JWT issue/verify, the
//! [`Authenticated`] extractor and the login handler.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/login` | Body: `{"email":"…","password":"…"}`; returns `{token, account}` |

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  extract::{FromRequestParts, State},
  http::{HeaderMap, header, request::Parts},
  response::IntoResponse,
};
use chrono::{DateTime, Duration, Utc};
use gym_core::{
  account::{Account, Role},
  store::GymStore,
};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};

use crate::{
  ApiState,
  envelope::{self, Body},
  error::ApiError,
};

/// Signing settings for bearer tokens.
#[derive(Clone)]
pub struct TokenConfig {
  pub secret: String,
  pub ttl:    Duration,
}

/// JWT claims. `sub` is the account id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
  pub sub:  String,
  pub role: Role,
  pub iat:  i64,
  pub exp:  i64,
}

// ─── Passwords ───────────────────────────────────────────────────────────────

/// Produce an argon2 PHC string for `password`.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| ApiError::Internal(e.to_string()))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(hash) else {
    return false;
  };
  Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
}

// ─── Tokens ──────────────────────────────────────────────────────────────────

pub fn issue_token(
  config: &TokenConfig,
  account: &Account,
  now: DateTime<Utc>,
) -> Result<String, ApiError> {
  let claims = Claims {
    sub:  account.account_id.to_string(),
    role: account.role,
    iat:  now.timestamp(),
    exp:  (now + config.ttl).timestamp(),
  };
  jsonwebtoken::encode(
    &Header::new(Algorithm::HS256),
    &claims,
    &EncodingKey::from_secret(config.secret.as_bytes()),
  )
  .map_err(|e| ApiError::Internal(e.to_string()))
}

/// Verify signature and expiry.
pub fn decode_token(config: &TokenConfig, token: &str) -> Result<Claims, ApiError> {
  jsonwebtoken::decode::<Claims>(
    token,
    &DecodingKey::from_secret(config.secret.as_bytes()),
    &Validation::new(Algorithm::HS256),
  )
  .map(|data| data.claims)
  .map_err(|_| ApiError::Unauthorized)
}

fn bearer(headers: &HeaderMap) -> Result<&str, ApiError> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .ok_or(ApiError::Unauthorized)
}

// ─── Extractor ───────────────────────────────────────────────────────────────

/// The account a request was made by, taken from a valid bearer token.
#[derive(Debug, Clone, Copy)]
pub struct Authenticated {
  pub account_id: i64,
  pub role:       Role,
}

impl<S> FromRequestParts<ApiState<S>> for Authenticated
where
  S: GymStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &ApiState<S>,
  ) -> Result<Self, Self::Rejection> {
    let claims = decode_token(&state.tokens, bearer(&parts.headers)?)?;
    let account_id = claims.sub.parse().map_err(|_| ApiError::Unauthorized)?;
    Ok(Authenticated { account_id, role: claims.role })
  }
}

// ─── Login ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
  pub token:   String,
  pub account: Account,
}

/// `POST /auth/login`
pub async fn login<S>(
  State(state): State<ApiState<S>>,
  Body(body): Body<LoginBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GymStore + 'static,
{
  let credentials = state
    .store
    .find_credentials(body.email)
    .await
    .map_err(ApiError::store)?
    .filter(|c| c.account.active)
    .ok_or(ApiError::Unauthorized)?;

  if !verify_password(&body.password, &credentials.password_hash) {
    tracing::info!(account_id = credentials.account.account_id, "login rejected");
    return Err(ApiError::Unauthorized);
  }

  let token = issue_token(&state.tokens, &credentials.account, Utc::now())?;
  tracing::info!(account_id = credentials.account.account_id, "login");
  Ok(envelope::ok("login successful", LoginResponse { token, account: credentials.account }))
}

#[cfg(test)]
mod tests {
  use chrono::{NaiveDate, TimeZone};

  use super::*;

  fn config() -> TokenConfig {
    TokenConfig { secret: "test-secret".into(), ttl: Duration::minutes(60) }
  }

  fn account() -> Account {
    let at = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
    Account {
      account_id:      42,
      code:            "U042".into(),
      first_name:      "Ana".into(),
      last_name:       "Gomez".into(),
      email:           "ana@example.com".into(),
      phone:           None,
      address:         None,
      gender:          None,
      document_type:   None,
      document_number: "1000001".into(),
      birth_date:      NaiveDate::from_ymd_opt(1990, 4, 2).unwrap(),
      role:            Role::Trainer,
      active:          true,
      created_at:      at,
      updated_at:      at,
    }
  }

  #[test]
  fn password_round_trip() {
    let hash = hash_password("hunter22").unwrap();
    assert!(hash.starts_with("$argon2"));
    assert!(verify_password("hunter22", &hash));
    assert!(!verify_password("hunter23", &hash));
    assert!(!verify_password("hunter22", "not a phc string"));
  }

  #[test]
  fn issued_tokens_decode() {
    let token = issue_token(&config(), &account(), Utc::now()).unwrap();
    let claims = decode_token(&config(), &token).unwrap();
    assert_eq!(claims.sub, "42");
    assert_eq!(claims.role, Role::Trainer);
  }

  #[test]
  fn expired_tokens_are_rejected() {
    let issued = Utc::now() - Duration::hours(3);
    let token = issue_token(&config(), &account(), issued).unwrap();
    assert!(matches!(decode_token(&config(), &token), Err(ApiError::Unauthorized)));
  }

  #[test]
  fn foreign_signatures_are_rejected() {
    let other = TokenConfig { secret: "other".into(), ttl: Duration::minutes(60) };
    let token = issue_token(&other, &account(), Utc::now()).unwrap();
    assert!(matches!(decode_token(&config(), &token), Err(ApiError::Unauthorized)));
  }

  #[test]
  fn bearer_header_parsing() {
    let mut headers = HeaderMap::new();
    assert!(bearer(&headers).is_err());
    headers.insert(header::AUTHORIZATION, "Basic abc".parse().unwrap());
    assert!(bearer(&headers).is_err());
    headers.insert(header::AUTHORIZATION, "Bearer abc.def".parse().unwrap());
    assert_eq!(bearer(&headers).unwrap(), "abc.def");
  }
}
