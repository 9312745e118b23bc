//! Caller identity: turning an `Authorization` header into a [`CallerIdentity`].
//!
//! Resolution has two halves. [`resolve`] checks the `Bearer <token>` framing
//! and hands the token to a [`TokenVerifier`]. Two verifiers ship here:
//!
//! - [`Hs256Verifier`] checks the signature with a shared secret and is the
//!   one to run in production.
//! - [`UnverifiedDecoder`] reads the payload segment **without checking the
//!   signature**. Anyone can forge a token it accepts. It exists for local
//!   development against an identity provider whose keys are not at hand.

use base64::{Engine as _, engine::general_purpose::URL_SAFE};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
  Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ─── Identity ────────────────────────────────────────────────────────────────

/// Who is calling. Derived once per request and passed down by value; never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
  pub subject:    Uuid,
  pub issued_at:  Option<DateTime<Utc>>,
  pub expires_at: Option<DateTime<Utc>>,
  pub audience:   String,
}

/// Why a credential was refused. Every variant surfaces as HTTP 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
  #[error("no token provided")]
  NoCredential,

  #[error("invalid authorization header format")]
  BadSchemeOrFormat,

  #[error("token is not three dot-separated segments")]
  MalformedToken,

  #[error("token payload is not valid base64url JSON")]
  MalformedPayload,

  #[error("invalid user id in token")]
  MalformedSubject,

  #[error("token has expired")]
  Expired,

  #[error("token signature or audience was rejected")]
  Rejected,
}

/// Turns a bare token into an identity.
pub trait TokenVerifier: Send + Sync {
  fn verify(&self, token: &str) -> Result<CallerIdentity, AuthError>;
}

/// Resolve the raw `Authorization` header value into a caller identity.
///
/// The header must be exactly `"Bearer <token>"` with a single space.
pub fn resolve(
  credential: Option<&str>,
  verifier: &dyn TokenVerifier,
) -> Result<CallerIdentity, AuthError> {
  let token = bearer_token(credential)?;
  verifier.verify(token)
}

fn bearer_token(credential: Option<&str>) -> Result<&str, AuthError> {
  let header = match credential {
    Some(h) if !h.is_empty() => h,
    _ => return Err(AuthError::NoCredential),
  };

  let mut parts = header.split(' ');
  match (parts.next(), parts.next(), parts.next()) {
    (Some("Bearer"), Some(token), None) => Ok(token),
    _ => Err(AuthError::BadSchemeOrFormat),
  }
}

// ─── Claims ──────────────────────────────────────────────────────────────────

/// `aud` may be a single string or a list.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
enum Audience {
  One(String),
  Many(Vec<String>),
}

#[derive(Debug, Deserialize, Serialize)]
struct Claims {
  #[serde(default)]
  sub: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  aud: Option<Audience>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  iat: Option<i64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  exp: Option<i64>,
}

impl Claims {
  fn into_identity(self) -> Result<CallerIdentity, AuthError> {
    let subject =
      Uuid::parse_str(&self.sub).map_err(|_| AuthError::MalformedSubject)?;

    let audience = match self.aud {
      Some(Audience::One(a)) => a,
      Some(Audience::Many(list)) => list.into_iter().next().unwrap_or_default(),
      None => String::new(),
    };

    Ok(CallerIdentity {
      subject,
      issued_at: self.iat.map(timestamp).transpose()?,
      expires_at: self.exp.map(timestamp).transpose()?,
      audience,
    })
  }
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>, AuthError> {
  DateTime::from_timestamp(secs, 0).ok_or(AuthError::MalformedPayload)
}

// ─── Unverified decoder ──────────────────────────────────────────────────────

/// Development-only verifier: decodes the payload and trusts it.
///
/// The header and signature segments are ignored entirely.
#[derive(Debug, Clone)]
pub struct UnverifiedDecoder {
  enforce_expiry: bool,
  leeway:         Duration,
}

impl Default for UnverifiedDecoder {
  fn default() -> Self { Self::new(true, 60) }
}

impl UnverifiedDecoder {
  /// `enforce_expiry = false` accepts expired tokens, like the service this
  /// backend replaced.
  pub fn new(enforce_expiry: bool, leeway_secs: u64) -> Self {
    Self {
      enforce_expiry,
      leeway: i64::try_from(leeway_secs)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX),
    }
  }

  fn verify_at(
    &self,
    token: &str,
    now: DateTime<Utc>,
  ) -> Result<CallerIdentity, AuthError> {
    let segments: Vec<&str> = token.split('.').collect();
    let [_, payload, _] = segments.as_slice() else {
      return Err(AuthError::MalformedToken);
    };

    let bytes = decode_segment(payload)?;
    let claims: Claims =
      serde_json::from_slice(&bytes).map_err(|_| AuthError::MalformedPayload)?;
    let identity = claims.into_identity()?;

    if self.enforce_expiry
      && let Some(exp) = identity.expires_at
      && exp.checked_add_signed(self.leeway).is_some_and(|deadline| deadline < now)
    {
      return Err(AuthError::Expired);
    }

    Ok(identity)
  }
}

impl TokenVerifier for UnverifiedDecoder {
  fn verify(&self, token: &str) -> Result<CallerIdentity, AuthError> {
    self.verify_at(token, Utc::now())
  }
}

/// Decode a base64url segment, restoring any `=` padding the issuer dropped.
fn decode_segment(segment: &str) -> Result<Vec<u8>, AuthError> {
  let mut padded = segment.to_owned();
  let missing = (4 - padded.len() % 4) % 4;
  padded.extend(std::iter::repeat_n('=', missing));
  URL_SAFE
    .decode(padded.as_bytes())
    .map_err(|_| AuthError::MalformedPayload)
}

// ─── HS256 verifier ──────────────────────────────────────────────────────────

/// Verifies HS256-signed tokens against a shared secret.
pub struct Hs256Verifier {
  key:        DecodingKey,
  validation: Validation,
}

impl Hs256Verifier {
  /// When `audience` is set, tokens must carry it in `aud`.
  pub fn new(secret: &[u8], audience: Option<&str>, leeway_secs: u64) -> Self {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = leeway_secs;
    match audience {
      Some(aud) => validation.set_audience(&[aud]),
      None => validation.validate_aud = false,
    }
    Self { key: DecodingKey::from_secret(secret), validation }
  }
}

impl TokenVerifier for Hs256Verifier {
  fn verify(&self, token: &str) -> Result<CallerIdentity, AuthError> {
    let data = jsonwebtoken::decode::<Claims>(token, &self.key, &self.validation)
      .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::Expired,
        ErrorKind::InvalidToken => AuthError::MalformedToken,
        ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
          AuthError::MalformedPayload
        }
        _ => AuthError::Rejected,
      })?;
    data.claims.into_identity()
  }
}

/// Sign an HS256 token for `subject`, valid for `ttl`.
///
/// Used by the server's `--mint-token` helper and by tests.
pub fn issue_token(
  secret: &[u8],
  subject: Uuid,
  audience: Option<&str>,
  ttl: Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
  let now = Utc::now();
  let claims = Claims {
    sub: subject.to_string(),
    aud: audience.map(|a| Audience::One(a.to_owned())),
    iat: Some(now.timestamp()),
    exp: Some((now + ttl).timestamp()),
  };
  jsonwebtoken::encode(
    &Header::new(Algorithm::HS256),
    &claims,
    &EncodingKey::from_secret(secret),
  )
}
