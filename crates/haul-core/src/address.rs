//! Delivery addresses owned by a client profile.
//!
//! Address writes never set `is_default` directly; the flag is decided by the
//! rules in [`crate::default_flag`] and applied atomically by the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Country recorded when the client leaves it out.
pub const DEFAULT_COUNTRY: &str = "Ecuador";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
  pub address_id: Uuid,
  pub profile_id: Uuid,
  pub street:     String,
  pub city:       String,
  pub notes:      String,
  pub country:    String,
  pub latitude:   f64,
  pub longitude:  f64,
  pub is_default: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Input to [`crate::store::Store::create_address`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewAddress {
  pub street:     String,
  pub city:       String,
  #[serde(default)]
  pub notes:      String,
  #[serde(default)]
  pub country:    Option<String>,
  pub latitude:   f64,
  pub longitude:  f64,
  /// Only a request; the first address of a profile is default regardless.
  #[serde(default)]
  pub is_default: bool,
}

impl NewAddress {
  /// Check required fields and coordinate ranges, filling in the country.
  pub fn validated(mut self) -> Result<Self> {
    require("street", &self.street)?;
    require("city", &self.city)?;
    check_coordinates(Some(self.latitude), Some(self.longitude))?;
    self.country = Some(
      self
        .country
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_COUNTRY.to_owned()),
    );
    Ok(self)
  }
}

/// Partial update for an address. Every field is optional.
///
/// `is_default` keeps the three states apart: `None` leaves the flag alone,
/// `Some(false)` is an explicit demotion, `Some(true)` claims the default.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressPatch {
  pub street:     Option<String>,
  pub city:       Option<String>,
  pub notes:      Option<String>,
  pub country:    Option<String>,
  pub latitude:   Option<f64>,
  pub longitude:  Option<f64>,
  pub is_default: Option<bool>,
}

impl AddressPatch {
  /// Reject blank required fields and out-of-range coordinates.
  pub fn validated(self) -> Result<Self> {
    if let Some(street) = &self.street {
      require("street", street)?;
    }
    if let Some(city) = &self.city {
      require("city", city)?;
    }
    if let Some(country) = &self.country {
      require("country", country)?;
    }
    check_coordinates(self.latitude, self.longitude)?;
    Ok(self)
  }
}

fn require(field: &'static str, value: &str) -> Result<()> {
  if value.trim().is_empty() {
    return Err(Error::MissingField(field));
  }
  Ok(())
}

fn check_coordinates(latitude: Option<f64>, longitude: Option<f64>) -> Result<()> {
  if let Some(lat) = latitude
    && !(lat.is_finite() && (-90.0..=90.0).contains(&lat))
  {
    return Err(Error::InvalidField {
      field:  "latitude",
      reason: format!("{lat} is outside [-90, 90]"),
    });
  }
  if let Some(lng) = longitude
    && !(lng.is_finite() && (-180.0..=180.0).contains(&lng))
  {
    return Err(Error::InvalidField {
      field:  "longitude",
      reason: format!("{lng} is outside [-180, 180]"),
    });
  }
  Ok(())
}
