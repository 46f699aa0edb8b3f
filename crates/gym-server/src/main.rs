//! gym-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) layered under
//! `GYM_*` environment variables, opens the SQLite store, creates the
//! bootstrap admin if configured, and serves the JSON API under `/api`.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for `admin_password_hash`:
//!
//! ```text
//! cargo run -p gym-server -- --hash-password
//! ```

use std::{
  io::{self, BufRead as _, Write as _},
  path::PathBuf,
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use gym_server::{ServerConfig, build_app, ensure_admin};
use gym_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Gym membership API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  if cli.hash_password {
    let password = read_password()?;
    let hash = gym_api::auth::hash_password(&password)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?;
    println!("{hash}");
    return Ok(());
  }

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("GYM"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = server_cfg.resolved_store_path(std::env::var("HOME").ok().as_deref());
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  ensure_admin(&store, &server_cfg)
    .await
    .context("failed to create the bootstrap admin")?;

  let app = build_app(Arc::new(store), &server_cfg);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Prompt on stderr so stdout carries only the hash.
fn read_password() -> anyhow::Result<String> {
  eprint!("Password: ");
  io::stderr().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line).context("failed to read stdin")?;
  let password = line.trim_end_matches(['\n', '\r']);
  anyhow::ensure!(!password.is_empty(), "password must not be empty");
  Ok(password.to_owned())
}
