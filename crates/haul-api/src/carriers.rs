//! Handlers for `/carriers` endpoints. Any authenticated caller may list.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/carriers` | `?status=&city=&min_rating=&page=&page_size=` |
//! | `GET`  | `/carriers/{carrier_id}` | 404 if not found |

use axum::{
  Json,
  extract::{Path, Query, State, rejection::{PathRejection, QueryRejection}},
};
use haul_core::{
  carrier::{CarrierListing, CarrierPage, CarrierStatus},
  query::{CarrierFilters, compose},
  store::Store,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiState, Caller, error::ApiError};

// ─── List ────────────────────────────────────────────────────────────────────

/// Raw query string. Everything stays text so that a bad `page` or
/// `min_rating` falls back to its default instead of failing the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub status:     Option<String>,
  pub city:       Option<String>,
  pub min_rating: Option<String>,
  pub page:       Option<String>,
  pub page_size:  Option<String>,
}

/// `GET /carriers`
pub async fn list<S: Store>(
  State(state): State<ApiState<S>>,
  Caller(_caller): Caller,
  query: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<CarrierPage>, ApiError> {
  let Query(params) = query?;

  let status = params
    .status
    .as_deref()
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(CarrierStatus::parse)
    .transpose()?;

  let filters = CarrierFilters { status, city: params.city, min_rating: params.min_rating };
  let spec = compose(filters, params.page.as_deref(), params.page_size.as_deref());

  let page = state
    .store
    .query_carriers(&spec)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(page))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /carriers/{carrier_id}`
pub async fn get_one<S: Store>(
  State(state): State<ApiState<S>>,
  Caller(_caller): Caller,
  path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<CarrierListing>, ApiError> {
  let Path(carrier_id) = path?;
  let carrier = state
    .store
    .get_carrier(carrier_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::not_found("carrier"))?;
  Ok(Json(carrier))
}
