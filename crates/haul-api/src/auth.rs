//! Bearer-token extractor.
//!
//! [`Caller`] runs the identity resolver against the request's
//! `Authorization` header. A handler that takes a `Caller` never runs for an
//! unauthenticated request; the rejection is a 401 with a JSON body.

use axum::{
  extract::FromRequestParts,
  http::{header, request::Parts},
};
use haul_core::identity::{self, AuthError, CallerIdentity};

use crate::{ApiState, error::ApiError};

/// The authenticated caller of the current request.
#[derive(Debug, Clone)]
pub struct Caller(pub CallerIdentity);

impl<S> FromRequestParts<ApiState<S>> for Caller
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &ApiState<S>,
  ) -> Result<Self, Self::Rejection> {
    let credential = match parts.headers.get(header::AUTHORIZATION) {
      None => None,
      Some(value) => Some(
        value
          .to_str()
          .map_err(|_| ApiError::Unauthorized(AuthError::BadSchemeOrFormat))?,
      ),
    };

    identity::resolve(credential, state.verifier.as_ref())
      .map(Caller)
      .map_err(|e| {
        tracing::debug!(reason = ?e, "credential refused");
        ApiError::Unauthorized(e)
      })
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use axum::{body::Body, http::Request};
  use chrono::Duration;
  use haul_core::{
    default_flag::DefaultFlagPolicy,
    identity::{Hs256Verifier, issue_token},
  };
  use haul_store_sqlite::SqliteStore;
  use uuid::Uuid;

  use super::*;

  const SECRET: &[u8] = b"extractor-secret";

  async fn state() -> ApiState<SqliteStore> {
    ApiState {
      store:    Arc::new(SqliteStore::open_in_memory().await.unwrap()),
      verifier: Arc::new(Hs256Verifier::new(SECRET, None, 0)),
      policy:   DefaultFlagPolicy::default(),
    }
  }

  async fn extract(auth: Option<&str>) -> Result<Caller, ApiError> {
    let mut builder = Request::builder();
    if let Some(v) = auth {
      builder = builder.header(header::AUTHORIZATION, v);
    }
    let (mut parts, _) = builder.body(Body::empty()).unwrap().into_parts();
    Caller::from_request_parts(&mut parts, &state().await).await
  }

  #[tokio::test]
  async fn valid_bearer_token() {
    let subject = Uuid::new_v4();
    let token = issue_token(SECRET, subject, None, Duration::minutes(5)).unwrap();
    let Caller(identity) = extract(Some(&format!("Bearer {token}"))).await.unwrap();
    assert_eq!(identity.subject, subject);
  }

  #[tokio::test]
  async fn missing_header() {
    assert!(matches!(
      extract(None).await,
      Err(ApiError::Unauthorized(AuthError::NoCredential))
    ));
  }

  #[tokio::test]
  async fn wrong_scheme() {
    assert!(matches!(
      extract(Some("Token a.b.c")).await,
      Err(ApiError::Unauthorized(AuthError::BadSchemeOrFormat))
    ));
  }

  #[tokio::test]
  async fn foreign_signature() {
    let token = issue_token(b"other", Uuid::new_v4(), None, Duration::minutes(5)).unwrap();
    assert!(matches!(
      extract(Some(&format!("Bearer {token}"))).await,
      Err(ApiError::Unauthorized(AuthError::Rejected))
    ));
  }
}
