//! Runtime configuration and the choice of token verifier.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::{Context as _, bail};
use chrono::Duration;
use haul_core::{
  default_flag::DefaultFlagPolicy,
  identity::{Hs256Verifier, TokenVerifier, UnverifiedDecoder, issue_token},
};
use serde::Deserialize;
use uuid::Uuid;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Server configuration, deserialised from `config.toml` layered with
/// `HAUL_*` environment variables (`HAUL_AUTH__SECRET` sets `auth.secret`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                String,
  pub port:                u16,
  pub store_path:          PathBuf,
  /// Answer CORS preflights for any origin.
  pub cors_allow_any:      bool,
  pub default_flag_policy: DefaultFlagPolicy,
  pub auth:                AuthConfig,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                "127.0.0.1".to_owned(),
      port:                3000,
      store_path:          PathBuf::from("haul.db"),
      cors_allow_any:      true,
      default_flag_policy: DefaultFlagPolicy::default(),
      auth:                AuthConfig::default(),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
  /// Check HS256 signatures against `auth.secret`.
  #[default]
  Hs256,
  /// Trust the token payload without any signature check.
  Unverified,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
  pub mode:             AuthMode,
  pub secret:           Option<String>,
  /// Required `aud` claim, if any.
  pub audience:         Option<String>,
  pub leeway_secs:      u64,
  /// Only consulted in `unverified` mode; HS256 always checks `exp`.
  pub enforce_expiry:   bool,
  /// Must be set for `unverified` mode to start at all.
  pub allow_unverified: bool,
}

impl Default for AuthConfig {
  fn default() -> Self {
    Self {
      mode:             AuthMode::default(),
      secret:           None,
      audience:         None,
      leeway_secs:      60,
      enforce_expiry:   true,
      allow_unverified: false,
    }
  }
}

impl ServerConfig {
  /// Read `path` (missing file is fine) and overlay the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    Self::from_sources(
      config::File::from(path).required(false),
      Self::environment(),
    )
  }

  /// `HAUL_PORT` sets `port`; `__` separates nested keys.
  fn environment() -> config::Environment {
    config::Environment::with_prefix("HAUL")
      .prefix_separator("_")
      .separator("__")
      .try_parsing(true)
  }

  fn from_sources<T>(file: T, env: config::Environment) -> anyhow::Result<Self>
  where
    T: config::Source + Send + Sync + 'static,
  {
    let settings = config::Config::builder()
      .add_source(file)
      .add_source(env)
      .build()
      .context("failed to read configuration")?;

    settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn listen_address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Verifier ────────────────────────────────────────────────────────────────

impl AuthConfig {
  fn secret(&self) -> anyhow::Result<&[u8]> {
    match self.secret.as_deref() {
      Some(s) if !s.is_empty() => Ok(s.as_bytes()),
      _ => bail!("auth.secret must be set for HS256 tokens"),
    }
  }

  /// Build the verifier this configuration asks for.
  ///
  /// `unverified` mode is refused unless `allow_unverified` is set, and logs
  /// a warning when it is.
  pub fn verifier(&self) -> anyhow::Result<Arc<dyn TokenVerifier>> {
    match self.mode {
      AuthMode::Hs256 => Ok(Arc::new(Hs256Verifier::new(
        self.secret()?,
        self.audience.as_deref(),
        self.leeway_secs,
      ))),
      AuthMode::Unverified => {
        if !self.allow_unverified {
          bail!(
            "auth.mode = \"unverified\" accepts forged tokens; \
             set auth.allow_unverified = true to run it anyway"
          );
        }
        tracing::warn!(
          enforce_expiry = self.enforce_expiry,
          "token signatures are NOT checked; do not expose this server"
        );
        Ok(Arc::new(UnverifiedDecoder::new(self.enforce_expiry, self.leeway_secs)))
      }
    }
  }

  /// Sign a token for `subject` with the configured secret.
  pub fn mint_token(&self, subject: Uuid, ttl: Duration) -> anyhow::Result<String> {
    issue_token(self.secret()?, subject, self.audience.as_deref(), ttl)
      .context("failed to sign token")
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
