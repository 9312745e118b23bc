//! haul server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! store and serves the JSON API over HTTP.
//!
//! # Development tokens
//!
//! With `auth.secret` configured, print a bearer token for a user and exit:
//!
//! ```text
//! cargo run -p haul-server -- --mint-token 6f1c2a4e-8a51-4c1e-9d55-3f0b2b7c9a10
//! ```

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use haul_api::ApiState;
use haul_server::{
  ServerConfig,
  seed::{self, Fixtures},
  settings::expand_tilde,
};
use haul_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about = "haul API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Load users, profiles, zones and carriers from a JSON file before serving.
  #[arg(long, value_name = "FILE")]
  seed: Option<PathBuf>,

  /// Print an HS256 token for this user id and exit.
  #[arg(long, value_name = "USER_ID")]
  mint_token: Option<Uuid>,

  /// Lifetime of a minted token, in hours.
  #[arg(long, default_value_t = 24)]
  token_hours: i64,
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
  let config = ServerConfig::load(&cli.config)?;

  // Helper mode: mint a token and exit.
  if let Some(subject) = cli.mint_token {
    let ttl = chrono::Duration::try_hours(cli.token_hours)
      .context("--token-hours is out of range")?;
    println!("{}", config.auth.mint_token(subject, ttl)?);
    return Ok(());
  }

  let verifier = config.auth.verifier()?;

  let store_path = expand_tilde(&config.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  if let Some(path) = &cli.seed {
    let fixtures = Fixtures::from_path(path)?;
    seed::load(&store, fixtures).await?;
  }

  let state = ApiState {
    store: Arc::new(store),
    verifier,
    policy: config.default_flag_policy,
  };
  let app = haul_server::app(state, &config);
  let address = config.listen_address();

  tracing::info!(
    %address,
    auth_mode = ?config.auth.mode,
    policy = ?config.default_flag_policy,
    "listening"
  );
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(error = %e, "failed to listen for ctrl-c");
    std::future::pending::<()>().await;
  }
  tracing::info!("shutting down");
}
