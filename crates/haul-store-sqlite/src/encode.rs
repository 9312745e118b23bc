//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`)
//! so that text ordering matches time ordering. UUIDs are stored as hyphenated
//! lowercase strings; enums as their snake_case names.

use chrono::{DateTime, SecondsFormat, Utc};
use haul_core::{
  address::Address,
  carrier::{Carrier, CarrierListing, CarrierStatus, Zone},
  user::{ClientProfile, Role, User},
};
use rusqlite::Row;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn encode_role(r: Role) -> &'static str { r.into() }

pub fn decode_role(s: &str) -> Result<Role> {
  s.parse().map_err(|_| Error::Decode(format!("role {s:?}")))
}

pub fn encode_status(s: CarrierStatus) -> &'static str { s.into() }

pub fn decode_status(s: &str) -> Result<CarrierStatus> {
  s.parse().map_err(|_| Error::Decode(format!("carrier status {s:?}")))
}

// ─── Column lists ────────────────────────────────────────────────────────────

pub const USER_COLUMNS: &str =
  "id, name, surname, role, avatar_ref, created_at, updated_at";

pub const PROFILE_COLUMNS: &str =
  "profile_id, user_id, national_id, phone, created_at, updated_at";

pub const ADDRESS_COLUMNS: &str = "address_id, profile_id, street, city, notes, \
   country, latitude, longitude, is_default, created_at, updated_at";

pub const ZONE_COLUMNS: &str = "zone_id, name, city";

/// Carrier columns followed by the owning user's, for `carriers c LEFT JOIN
/// users u`.
pub const LISTING_COLUMNS: &str = "c.carrier_id, c.user_id, c.vehicle_type, \
   c.plate, c.cargo_capacity, c.status, c.assigned_zone_id, c.average_rating, \
   c.created_at, c.updated_at, u.id, u.name, u.surname, u.role, u.avatar_ref, \
   u.created_at, u.updated_at";

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub id:         String,
  pub name:       String,
  pub surname:    String,
  pub role:       String,
  pub avatar_ref: String,
  pub created_at: String,
  pub updated_at: String,
}

impl RawUser {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      name:       row.get(1)?,
      surname:    row.get(2)?,
      role:       row.get(3)?,
      avatar_ref: row.get(4)?,
      created_at: row.get(5)?,
      updated_at: row.get(6)?,
    })
  }

  /// Read a left-joined user starting at column `at`; `None` when the join
  /// found no row.
  fn from_joined(row: &Row<'_>, at: usize) -> rusqlite::Result<Option<Self>> {
    let Some(id) = row.get::<_, Option<String>>(at)? else {
      return Ok(None);
    };
    Ok(Some(Self {
      id,
      name:       row.get(at + 1)?,
      surname:    row.get(at + 2)?,
      role:       row.get(at + 3)?,
      avatar_ref: row.get(at + 4)?,
      created_at: row.get(at + 5)?,
      updated_at: row.get(at + 6)?,
    }))
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      id:         decode_uuid(&self.id)?,
      name:       self.name,
      surname:    self.surname,
      role:       decode_role(&self.role)?,
      avatar_ref: self.avatar_ref,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read directly from a `client_profiles` row.
pub struct RawProfile {
  pub profile_id:  String,
  pub user_id:     String,
  pub national_id: String,
  pub phone:       String,
  pub created_at:  String,
  pub updated_at:  String,
}

impl RawProfile {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      profile_id:  row.get(0)?,
      user_id:     row.get(1)?,
      national_id: row.get(2)?,
      phone:       row.get(3)?,
      created_at:  row.get(4)?,
      updated_at:  row.get(5)?,
    })
  }

  pub fn into_profile(self) -> Result<ClientProfile> {
    Ok(ClientProfile {
      profile_id:  decode_uuid(&self.profile_id)?,
      user_id:     decode_uuid(&self.user_id)?,
      national_id: self.national_id,
      phone:       self.phone,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read directly from an `addresses` row.
pub struct RawAddress {
  pub address_id: String,
  pub profile_id: String,
  pub street:     String,
  pub city:       String,
  pub notes:      String,
  pub country:    String,
  pub latitude:   f64,
  pub longitude:  f64,
  pub is_default: bool,
  pub created_at: String,
  pub updated_at: String,
}

impl RawAddress {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      address_id: row.get(0)?,
      profile_id: row.get(1)?,
      street:     row.get(2)?,
      city:       row.get(3)?,
      notes:      row.get(4)?,
      country:    row.get(5)?,
      latitude:   row.get(6)?,
      longitude:  row.get(7)?,
      is_default: row.get(8)?,
      created_at: row.get(9)?,
      updated_at: row.get(10)?,
    })
  }

  pub fn into_address(self) -> Result<Address> {
    Ok(Address {
      address_id: decode_uuid(&self.address_id)?,
      profile_id: decode_uuid(&self.profile_id)?,
      street:     self.street,
      city:       self.city,
      notes:      self.notes,
      country:    self.country,
      latitude:   self.latitude,
      longitude:  self.longitude,
      is_default: self.is_default,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read directly from a `zones` row.
pub struct RawZone {
  pub zone_id: String,
  pub name:    String,
  pub city:    String,
}

impl RawZone {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self { zone_id: row.get(0)?, name: row.get(1)?, city: row.get(2)? })
  }

  pub fn into_zone(self) -> Result<Zone> {
    Ok(Zone {
      zone_id: decode_uuid(&self.zone_id)?,
      name:    self.name,
      city:    self.city,
    })
  }
}

/// Raw values of a `carriers` row joined with its user, in
/// [`LISTING_COLUMNS`] order.
pub struct RawListing {
  pub carrier_id:       String,
  pub user_id:          String,
  pub vehicle_type:     String,
  pub plate:            String,
  pub cargo_capacity:   f64,
  pub status:           String,
  pub assigned_zone_id: Option<String>,
  pub average_rating:   f64,
  pub created_at:       String,
  pub updated_at:       String,
  pub user:             Option<RawUser>,
}

impl RawListing {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      carrier_id:       row.get(0)?,
      user_id:          row.get(1)?,
      vehicle_type:     row.get(2)?,
      plate:            row.get(3)?,
      cargo_capacity:   row.get(4)?,
      status:           row.get(5)?,
      assigned_zone_id: row.get(6)?,
      average_rating:   row.get(7)?,
      created_at:       row.get(8)?,
      updated_at:       row.get(9)?,
      user:             RawUser::from_joined(row, 10)?,
    })
  }

  pub fn into_listing(self) -> Result<CarrierListing> {
    let carrier = Carrier {
      carrier_id:       decode_uuid(&self.carrier_id)?,
      user_id:          decode_uuid(&self.user_id)?,
      vehicle_type:     self.vehicle_type,
      plate:            self.plate,
      cargo_capacity:   self.cargo_capacity,
      status:           decode_status(&self.status)?,
      assigned_zone_id: self
        .assigned_zone_id
        .as_deref()
        .map(decode_uuid)
        .transpose()?,
      average_rating:   self.average_rating,
      created_at:       decode_dt(&self.created_at)?,
      updated_at:       decode_dt(&self.updated_at)?,
    };
    let user = self.user.map(RawUser::into_user).transpose()?;
    Ok(CarrierListing { carrier, user })
  }
}
