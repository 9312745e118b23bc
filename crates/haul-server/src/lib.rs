//! Wiring for the haul HTTP server.
//!
//! The binary in `main.rs` is a thin shell over this crate: configuration
//! loading, verifier selection, fixture seeding and the final middleware stack
//! all live here so they can be tested without a socket.

pub mod seed;
pub mod settings;

use axum::{
  Router,
  http::{Method, header},
};
use haul_api::ApiState;
use haul_core::store::Store;
use tower_http::{
  cors::{Any, CorsLayer},
  trace::TraceLayer,
};

pub use settings::{AuthConfig, AuthMode, ServerConfig};

/// The API router wrapped in request tracing and CORS.
pub fn app<S>(state: ApiState<S>, config: &ServerConfig) -> Router
where
  S: Store + 'static,
{
  let cors = if config.cors_allow_any {
    CorsLayer::new()
      .allow_origin(Any)
      .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
      .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
  } else {
    CorsLayer::new()
  };

  haul_api::router(state)
    .layer(cors)
    .layer(TraceLayer::new_for_http())
}
