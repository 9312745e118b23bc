//! Carriers and the zones they are assigned to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{Error, Result, user::User};

/// Lifecycle state of a carrier account.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CarrierStatus {
  /// Awaiting document verification.
  #[default]
  Pending,
  Active,
  Inactive,
  Suspended,
}

impl CarrierStatus {
  /// Statuses listed when the caller does not filter by status.
  pub const VISIBLE_BY_DEFAULT: [CarrierStatus; 2] =
    [CarrierStatus::Pending, CarrierStatus::Active];

  /// Parse a query-string value, mapping failures to a core error.
  pub fn parse(s: &str) -> Result<Self> {
    s.parse().map_err(|_| Error::UnknownStatus(s.to_owned()))
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Carrier {
  pub carrier_id:       Uuid,
  pub user_id:          Uuid,
  pub vehicle_type:     String,
  pub plate:            String,
  pub cargo_capacity:   f64,
  pub status:           CarrierStatus,
  pub assigned_zone_id: Option<Uuid>,
  pub average_rating:   f64,
  pub created_at:       DateTime<Utc>,
  pub updated_at:       DateTime<Utc>,
}

/// Input to [`crate::store::Store::add_carrier`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewCarrier {
  pub user_id:          Uuid,
  pub vehicle_type:     String,
  pub plate:            String,
  pub cargo_capacity:   f64,
  #[serde(default)]
  pub status:           CarrierStatus,
  #[serde(default)]
  pub assigned_zone_id: Option<Uuid>,
  #[serde(default)]
  pub average_rating:   f64,
}

impl NewCarrier {
  pub fn validated(self) -> Result<Self> {
    if self.plate.trim().is_empty() {
      return Err(Error::MissingField("plate"));
    }
    if !(self.cargo_capacity.is_finite() && self.cargo_capacity > 0.0) {
      return Err(Error::InvalidField {
        field:  "cargo_capacity",
        reason: "must be greater than zero".into(),
      });
    }
    if !(self.average_rating.is_finite() && self.average_rating >= 0.0) {
      return Err(Error::InvalidField {
        field:  "average_rating",
        reason: "must not be negative".into(),
      });
    }
    Ok(self)
  }
}

/// A service zone; the carrier list's `city` filter matches on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
  pub zone_id: Uuid,
  pub name:    String,
  pub city:    String,
}

/// Input to [`crate::store::Store::add_zone`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewZone {
  /// Caller-chosen id so fixtures can reference the zone from carriers.
  #[serde(default)]
  pub zone_id: Option<Uuid>,
  pub name:    String,
  pub city:    String,
}

/// A carrier together with the user account behind it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarrierListing {
  #[serde(flatten)]
  pub carrier: Carrier,
  pub user:    Option<User>,
}

/// One page of carriers plus the totals computed from the same predicate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarrierPage {
  pub data:        Vec<CarrierListing>,
  pub total:       u64,
  pub page:        u32,
  pub page_size:   u32,
  pub total_pages: u64,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn status_parse_rejects_unknown_values() {
    assert_eq!(CarrierStatus::parse("suspended").unwrap(), CarrierStatus::Suspended);
    assert!(matches!(
      CarrierStatus::parse("activo"),
      Err(Error::UnknownStatus(s)) if s == "activo"
    ));
  }

  #[test]
  fn zero_capacity_is_rejected() {
    let c = NewCarrier {
      user_id:          Uuid::new_v4(),
      vehicle_type:     "van".into(),
      plate:            "PBA-1234".into(),
      cargo_capacity:   0.0,
      status:           CarrierStatus::Active,
      assigned_zone_id: None,
      average_rating:   0.0,
    };
    assert!(matches!(
      c.validated(),
      Err(Error::InvalidField { field: "cargo_capacity", .. })
    ));
  }
}
