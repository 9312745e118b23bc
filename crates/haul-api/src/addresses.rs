//! Handlers for the caller's addresses.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/users/me/addresses` | Default first; 404 without a client profile |
//! | `POST`   | `/users/me/addresses` | 201; the first address is always default |
//! | `PUT`    | `/users/me/addresses/{address_id}` | Partial; `is_default` omitted keeps the flag |
//! | `DELETE` | `/users/me/addresses/{address_id}` | 204 |
//!
//! Addresses reach their owner only through the client profile, so every
//! handler resolves that chain and runs it through the ownership guard before
//! touching the row.

use axum::{
  Json,
  extract::{Path, State, rejection::{JsonRejection, PathRejection}},
  http::StatusCode,
};
use haul_core::{
  address::{Address, AddressPatch, NewAddress},
  identity::CallerIdentity,
  ownership::{Action, Target, authorize},
  store::Store,
  user::ClientProfile,
};
use uuid::Uuid;

use crate::{ApiState, Caller, error::ApiError};

/// The caller's own client profile, or 404.
async fn own_profile<S: Store>(
  state: &ApiState<S>,
  caller: &CallerIdentity,
  action: Action,
) -> Result<ClientProfile, ApiError> {
  let profile = state
    .store
    .profile_for_user(caller.subject)
    .await
    .map_err(ApiError::store)?;
  let decision = authorize(caller, action, Target::Chain { profile: profile.as_ref() });
  ApiError::check(decision, "client profile")?;
  profile.ok_or_else(|| ApiError::not_found("client profile"))
}

/// Load an address and check that it belongs to the caller.
async fn owned_address<S: Store>(
  state: &ApiState<S>,
  caller: &CallerIdentity,
  address_id: Uuid,
) -> Result<Address, ApiError> {
  let address = state
    .store
    .get_address(address_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::not_found("address"))?;

  let profile = state
    .store
    .get_profile(address.profile_id)
    .await
    .map_err(ApiError::store)?;
  let decision =
    authorize(caller, Action::WriteSelf, Target::Chain { profile: profile.as_ref() });
  tracing::debug!(caller = %caller.subject, %address_id, ?decision, "address access");
  ApiError::check(decision, "client profile")?;
  Ok(address)
}

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /users/me/addresses`
pub async fn list<S: Store>(
  State(state): State<ApiState<S>>,
  Caller(caller): Caller,
) -> Result<Json<Vec<Address>>, ApiError> {
  let profile = own_profile(&state, &caller, Action::ReadSelf).await?;
  let addresses = state
    .store
    .list_addresses(profile.profile_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(addresses))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /users/me/addresses`
pub async fn create<S: Store>(
  State(state): State<ApiState<S>>,
  Caller(caller): Caller,
  body: Result<Json<NewAddress>, JsonRejection>,
) -> Result<(StatusCode, Json<Address>), ApiError> {
  let Json(input) = body?;
  let input = input.validated()?;
  let profile = own_profile(&state, &caller, Action::WriteSelf).await?;

  let address = state
    .store
    .create_address(profile.profile_id, input)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::not_found("client profile"))?;

  tracing::info!(
    address_id = %address.address_id,
    profile_id = %profile.profile_id,
    is_default = address.is_default,
    "address created"
  );
  Ok((StatusCode::CREATED, Json(address)))
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// `PUT /users/me/addresses/{address_id}`
pub async fn update<S: Store>(
  State(state): State<ApiState<S>>,
  Caller(caller): Caller,
  path: Result<Path<Uuid>, PathRejection>,
  body: Result<Json<AddressPatch>, JsonRejection>,
) -> Result<Json<Address>, ApiError> {
  let Path(address_id) = path?;
  let Json(patch) = body?;
  let patch = patch.validated()?;
  owned_address(&state, &caller, address_id).await?;

  let address = state
    .store
    .update_address(address_id, patch, state.policy)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::not_found("address"))?;

  tracing::info!(%address_id, is_default = address.is_default, "address updated");
  Ok(Json(address))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /users/me/addresses/{address_id}`
pub async fn remove<S: Store>(
  State(state): State<ApiState<S>>,
  Caller(caller): Caller,
  path: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ApiError> {
  let Path(address_id) = path?;
  owned_address(&state, &caller, address_id).await?;

  let deleted = state
    .store
    .delete_address(address_id, state.policy)
    .await
    .map_err(ApiError::store)?;
  if !deleted {
    return Err(ApiError::not_found("address"));
  }

  tracing::info!(%address_id, "address deleted");
  Ok(StatusCode::NO_CONTENT)
}
