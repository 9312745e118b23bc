//! Users and their client profiles.
//!
//! Users are mirrored from the identity provider; their `id` is the `sub`
//! claim of the caller's token. A client profile hangs off a user one-to-one
//! and owns that user's addresses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

/// What a user is allowed to be in the system.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
  #[default]
  Client,
  Carrier,
  Admin,
}

/// A user account, keyed by the identity provider's subject id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
  pub id:         Uuid,
  #[serde(default)]
  pub name:       String,
  #[serde(default)]
  pub surname:    String,
  #[serde(default)]
  pub role:       Role,
  #[serde(default)]
  pub avatar_ref: String,
  #[serde(default = "Utc::now")]
  pub created_at: DateTime<Utc>,
  #[serde(default = "Utc::now")]
  pub updated_at: DateTime<Utc>,
}

impl User {
  pub fn is_admin(&self) -> bool { self.role == Role::Admin }
}

/// Partial update applied by `PUT /users/me`.
///
/// Empty strings count as "not supplied", matching how the profile form
/// submits untouched fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
  pub name:       Option<String>,
  pub surname:    Option<String>,
  pub avatar_ref: Option<String>,
}

impl UserPatch {
  /// Drop blank fields so only real changes reach the store.
  pub fn normalized(self) -> Self {
    fn keep(v: Option<String>) -> Option<String> {
      v.filter(|s| !s.trim().is_empty())
    }
    Self {
      name:       keep(self.name),
      surname:    keep(self.surname),
      avatar_ref: keep(self.avatar_ref),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.name.is_none() && self.surname.is_none() && self.avatar_ref.is_none()
  }
}

/// The client-side extension of a user. Owns addresses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientProfile {
  pub profile_id:  Uuid,
  pub user_id:     Uuid,
  pub national_id: String,
  pub phone:       String,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

/// Input to [`crate::store::Store::add_profile`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewProfile {
  pub user_id:     Uuid,
  pub national_id: String,
  #[serde(default)]
  pub phone:       String,
}
