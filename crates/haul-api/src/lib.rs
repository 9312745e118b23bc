//! JSON REST API for haul.
//!
//! Exposes an axum [`Router`] backed by any [`haul_core::store::Store`]. Every
//! route under `/api` resolves the caller through the [`Caller`] extractor
//! before the handler body runs; TLS and CORS are the embedding server's
//! concern.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = haul_api::router(ApiState { store, verifier, policy });
//! ```

pub mod addresses;
pub mod auth;
pub mod carriers;
pub mod error;
pub mod users;

use std::sync::Arc;

use axum::{
  Json, Router,
  routing::{get, put},
};
use haul_core::{default_flag::DefaultFlagPolicy, identity::TokenVerifier, store::Store};
use serde_json::{Value, json};

pub use auth::Caller;
pub use error::ApiError;

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct ApiState<S> {
  pub store:    Arc<S>,
  pub verifier: Arc<dyn TokenVerifier>,
  /// How demoting or deleting the default address is resolved.
  pub policy:   DefaultFlagPolicy,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      verifier: Arc::clone(&self.verifier),
      policy:   self.policy,
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the full router: a public `/health` probe plus the authenticated
/// resources nested under `/api`.
pub fn router<S>(state: ApiState<S>) -> Router
where
  S: Store + 'static,
{
  let api = Router::new()
    // Users
    .route("/users/me", get(users::me::<S>).put(users::update_me::<S>))
    .route("/users/{user_id}", get(users::get_one::<S>))
    // Addresses
    .route(
      "/users/me/addresses",
      get(addresses::list::<S>).post(addresses::create::<S>),
    )
    .route(
      "/users/me/addresses/{address_id}",
      put(addresses::update::<S>).delete(addresses::remove::<S>),
    )
    // Carriers
    .route("/carriers", get(carriers::list::<S>))
    .route("/carriers/{carrier_id}", get(carriers::get_one::<S>));

  Router::new()
    .route("/health", get(health))
    .nest("/api", api)
    .with_state(state)
}

/// `GET /health`
async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }
