//! Rules for the per-profile default address.
//!
//! A profile has at most one default address, and its first address is always
//! the default. These functions only *plan* a transition; the store executes
//! the plan for one profile inside a single transaction, so no reader ever sees
//! two defaults or a half-applied change.
//!
//! Demoting or deleting the current default can leave a profile with no
//! default at all. [`DefaultFlagPolicy`] decides whether that gap is allowed
//! or whether another address is promoted to fill it.

use serde::{Deserialize, Serialize};

/// What to do when the default address is demoted or deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultFlagPolicy {
  /// Leave the profile without a default until the client picks one.
  #[default]
  AllowZeroDefault,
  /// Promote the oldest remaining address. A sole address cannot be demoted.
  PromoteOldest,
}

/// Plan for inserting a new address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatePlan {
  /// Clear the flag on every existing address of the profile first.
  pub clear_siblings: bool,
  /// Flag stored on the new address.
  pub is_default:     bool,
}

/// Plan the default flag for a new address, given how many the profile has.
pub fn plan_create(existing: u64, requested: bool) -> CreatePlan {
  if existing == 0 {
    return CreatePlan { clear_siblings: false, is_default: true };
  }
  CreatePlan { clear_siblings: requested, is_default: requested }
}

/// Plan for updating an existing address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePlan {
  /// Leave every flag as it is.
  Keep,
  /// Clear the flag on all siblings, then set it on this address.
  Claim,
  /// Clear this address's flag, optionally promoting the oldest sibling.
  Release { promote_sibling: bool },
}

/// Plan the flag change for an update.
///
/// `requested` is `None` when the update did not mention the flag at all;
/// that is never read as `false`.
pub fn plan_update(
  requested: Option<bool>,
  currently_default: bool,
  has_siblings: bool,
  policy: DefaultFlagPolicy,
) -> UpdatePlan {
  match requested {
    None => UpdatePlan::Keep,
    Some(true) => UpdatePlan::Claim,
    Some(false) if !currently_default => UpdatePlan::Keep,
    Some(false) => match policy {
      DefaultFlagPolicy::AllowZeroDefault => {
        UpdatePlan::Release { promote_sibling: false }
      }
      DefaultFlagPolicy::PromoteOldest if has_siblings => {
        UpdatePlan::Release { promote_sibling: true }
      }
      DefaultFlagPolicy::PromoteOldest => UpdatePlan::Keep,
    },
  }
}

/// Whether deleting an address should promote a replacement default.
pub fn promote_after_delete(was_default: bool, policy: DefaultFlagPolicy) -> bool {
  was_default && policy == DefaultFlagPolicy::PromoteOldest
}
