//! HTTP server wiring for the gym backend: configuration, the top-level
//! router and the startup admin bootstrap.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::Router;
use chrono::{Duration, NaiveDate};
use gym_api::{ApiState, TokenConfig};
use gym_core::{
  account::{Account, NewAccount, Role},
  store::GymStore,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ───────────────────────────────────────────────────────────

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 3000 }

fn default_store_path() -> PathBuf { PathBuf::from("gym.db") }

fn default_token_ttl() -> i64 { 1440 }

/// Runtime server configuration, deserialised from `config.toml` and
/// `GYM_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                String,
  #[serde(default = "default_port")]
  pub port:                u16,
  #[serde(default = "default_store_path")]
  pub store_path:          PathBuf,
  pub jwt_secret:          String,
  #[serde(default = "default_token_ttl")]
  pub token_ttl_minutes:   i64,
  /// Bootstrap admin, created at startup when no account has this email.
  #[serde(default)]
  pub admin_email:         Option<String>,
  #[serde(default)]
  pub admin_password_hash: Option<String>,
}

impl ServerConfig {
  /// `store_path` with a leading `~/` replaced by `home`. Without a home
  /// directory the path is used as written.
  pub fn resolved_store_path(&self, home: Option<&str>) -> PathBuf {
    match (self.store_path.strip_prefix("~"), home) {
      (Ok(rest), Some(home)) => Path::new(home).join(rest),
      _ => self.store_path.clone(),
    }
  }

  pub fn token_config(&self) -> TokenConfig {
    TokenConfig {
      secret: self.jwt_secret.clone(),
      ttl:    Duration::minutes(self.token_ttl_minutes),
    }
  }
}

// ─── Application ─────────────────────────────────────────────────────────────

/// The full application: the API under `/api`, wrapped in request tracing.
pub fn build_app<S>(store: Arc<S>, config: &ServerConfig) -> Router
where
  S: GymStore + 'static,
{
  let state = ApiState { store, tokens: Arc::new(config.token_config()) };
  Router::new()
    .nest("/api", gym_api::api_router(state))
    .layer(TraceLayer::new_for_http())
}

/// Create the configured admin account unless its email is already taken.
///
/// Returns the account when one was created.
pub async fn ensure_admin<S>(
  store: &S,
  config: &ServerConfig,
) -> Result<Option<Account>, gym_core::Error>
where
  S: GymStore,
{
  let (Some(email), Some(password_hash)) = (&config.admin_email, &config.admin_password_hash)
  else {
    return Ok(None);
  };
  let existing = store
    .find_credentials(email.clone())
    .await
    .map_err(Into::<gym_core::Error>::into)?;
  if existing.is_some() {
    return Ok(None);
  }

  let account = store
    .create_account(NewAccount {
      first_name:      "System".into(),
      last_name:       "Administrator".into(),
      email:           email.clone(),
      phone:           None,
      address:         None,
      gender:          None,
      document_type:   None,
      document_number: "0000000".into(),
      birth_date:      NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default(),
      role:            Role::Admin,
      password_hash:   password_hash.clone(),
    })
    .await
    .map_err(Into::<gym_core::Error>::into)?;
  tracing::info!(
    account_id = account.account_id,
    email = %account.email,
    "bootstrap admin created"
  );
  Ok(Some(account))
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use gym_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  fn config() -> ServerConfig {
    ServerConfig {
      host:                default_host(),
      port:                default_port(),
      store_path:          PathBuf::from(":memory:"),
      jwt_secret:          "test-secret".into(),
      token_ttl_minutes:   60,
      admin_email:         Some("root@example.com".into()),
      admin_password_hash: Some("$argon2id$test".into()),
    }
  }

  #[test]
  fn config_defaults_fill_missing_keys() {
    let settings = config::Config::builder()
      .add_source(config::File::from_str("jwt_secret = \"abc\"", config::FileFormat::Toml))
      .build()
      .unwrap();
    let cfg: ServerConfig = settings.try_deserialize().unwrap();
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.port, 3000);
    assert_eq!(cfg.token_ttl_minutes, 1440);
    assert!(cfg.admin_email.is_none());
  }

  #[test]
  fn store_path_expands_home() {
    let mut cfg = config();
    cfg.store_path = PathBuf::from("~/gym/gym.db");
    assert_eq!(cfg.resolved_store_path(Some("/home/ana")), PathBuf::from("/home/ana/gym/gym.db"));
    assert_eq!(cfg.resolved_store_path(None), PathBuf::from("~/gym/gym.db"));

    cfg.store_path = PathBuf::from("/var/lib/gym.db");
    assert_eq!(cfg.resolved_store_path(Some("/home/ana")), PathBuf::from("/var/lib/gym.db"));
  }

  #[tokio::test]
  async fn admin_is_created_once() {
    let store = SqliteStore::open_in_memory().await.expect("in-memory store");
    let cfg = config();

    let created = ensure_admin(&store, &cfg).await.unwrap().expect("admin created");
    assert_eq!(created.role, Role::Admin);
    assert!(ensure_admin(&store, &cfg).await.unwrap().is_none());

    let unset = ServerConfig { admin_email: None, ..cfg };
    assert!(ensure_admin(&store, &unset).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn api_is_nested_and_protected() {
    let store = Arc::new(SqliteStore::open_in_memory().await.expect("in-memory store"));
    let app = build_app(store, &config());

    let resp = app
      .clone()
      .oneshot(Request::get("/api/clients").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app.oneshot(Request::get("/clients").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }
}
