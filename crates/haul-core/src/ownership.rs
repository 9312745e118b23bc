//! The ownership guard: may this caller touch that resource?
//!
//! The guard is a pure decision over records the handler has already fetched.
//! It never loads anything itself, so it has no failure mode of its own; a
//! record that could not be loaded is passed in as `None`.

use uuid::Uuid;

use crate::{
  identity::CallerIdentity,
  user::{ClientProfile, User},
};

/// What the caller wants to do with the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
  ReadSelf,
  WriteSelf,
  ReadOther,
}

impl Action {
  fn is_read(self) -> bool { matches!(self, Self::ReadSelf | Self::ReadOther) }
}

/// The resource being accessed, described by its ownership chain.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
  /// A user record. `caller_record` is the caller's own user row, used for
  /// the admin escalation on cross-user reads.
  User {
    user_id:       Uuid,
    caller_record: Option<&'a User>,
  },
  /// A resource owned through a client profile (addresses). `profile` is the
  /// profile the resource points at, if it still exists.
  Chain { profile: Option<&'a ClientProfile> },
}

/// Outcome of [`authorize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
  Allow,
  Forbidden,
  /// The resource, or a link in its ownership chain, does not exist.
  NotFound,
}

impl Decision {
  pub fn is_allowed(self) -> bool { self == Self::Allow }
}

pub fn authorize(caller: &CallerIdentity, action: Action, target: Target<'_>) -> Decision {
  match target {
    Target::User { user_id, caller_record } => {
      if user_id == caller.subject {
        return Decision::Allow;
      }
      if !action.is_read() {
        return Decision::Forbidden;
      }
      // A caller whose own record cannot be loaded is refused, not 404'd, so
      // the response does not reveal whether the target exists.
      match caller_record {
        Some(me) if me.id == caller.subject && me.is_admin() => Decision::Allow,
        _ => Decision::Forbidden,
      }
    }
    Target::Chain { profile } => match profile {
      None => Decision::NotFound,
      Some(p) if p.user_id != caller.subject => Decision::Forbidden,
      Some(_) => Decision::Allow,
    },
  }
}
