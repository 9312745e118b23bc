//! Handlers for `/users` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/users/me` | The caller's own record |
//! | `PUT`  | `/users/me` | Body: `{"name"?, "surname"?, "avatar_ref"?}`; blanks ignored |
//! | `GET`  | `/users/{user_id}` | Self, or any user for admins; 403 otherwise |

use axum::{
  Json,
  extract::{Path, State, rejection::{JsonRejection, PathRejection}},
};
use haul_core::{
  ownership::{Action, Target, authorize},
  store::Store,
  user::{User, UserPatch},
};
use uuid::Uuid;

use crate::{ApiState, Caller, error::ApiError};

// ─── Me ──────────────────────────────────────────────────────────────────────

/// `GET /users/me`
pub async fn me<S: Store>(
  State(state): State<ApiState<S>>,
  Caller(caller): Caller,
) -> Result<Json<User>, ApiError> {
  let target = Target::User { user_id: caller.subject, caller_record: None };
  ApiError::check(authorize(&caller, Action::ReadSelf, target), "user")?;

  let user = state
    .store
    .get_user(caller.subject)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::not_found("user"))?;
  Ok(Json(user))
}

/// `PUT /users/me`
pub async fn update_me<S: Store>(
  State(state): State<ApiState<S>>,
  Caller(caller): Caller,
  body: Result<Json<UserPatch>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
  let Json(patch) = body?;
  let target = Target::User { user_id: caller.subject, caller_record: None };
  ApiError::check(authorize(&caller, Action::WriteSelf, target), "user")?;

  let user = state
    .store
    .update_user(caller.subject, patch.normalized())
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::not_found("user"))?;

  tracing::info!(user_id = %user.id, "user updated");
  Ok(Json(user))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /users/{user_id}`
pub async fn get_one<S: Store>(
  State(state): State<ApiState<S>>,
  Caller(caller): Caller,
  path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<User>, ApiError> {
  let Path(user_id) = path?;

  let decision = if user_id == caller.subject {
    authorize(&caller, Action::ReadSelf, Target::User { user_id, caller_record: None })
  } else {
    // Any failure to load the caller's own record counts as "not an admin".
    let me = match state.store.get_user(caller.subject).await {
      Ok(me) => me,
      Err(e) => {
        tracing::warn!(caller = %caller.subject, error = %e, "caller record unavailable");
        None
      }
    };
    let target = Target::User { user_id, caller_record: me.as_ref() };
    authorize(&caller, Action::ReadOther, target)
  };
  tracing::debug!(caller = %caller.subject, %user_id, ?decision, "user read");
  ApiError::check(decision, "user")?;

  let user = state
    .store
    .get_user(user_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::not_found("user"))?;
  Ok(Json(user))
}
