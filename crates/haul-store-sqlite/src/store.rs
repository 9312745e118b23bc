//! [`SqliteStore`], the SQLite implementation of [`Store`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{OptionalExtension as _, TransactionBehavior, params, params_from_iter};
use uuid::Uuid;

use haul_core::{
  address::{Address, AddressPatch, DEFAULT_COUNTRY, NewAddress},
  carrier::{Carrier, CarrierListing, CarrierPage, NewCarrier, NewZone, Zone},
  default_flag::{DefaultFlagPolicy, UpdatePlan, plan_create, plan_update, promote_after_delete},
  query::QuerySpec,
  store::Store,
  user::{ClientProfile, NewProfile, User, UserPatch},
};

use crate::{
  Result,
  encode::{
    ADDRESS_COLUMNS, LISTING_COLUMNS, PROFILE_COLUMNS, RawAddress, RawListing,
    RawProfile, RawUser, RawZone, USER_COLUMNS, ZONE_COLUMNS, encode_dt, encode_role,
    encode_status, encode_uuid,
  },
  filter::carrier_where,
  schema::SCHEMA,
};

/// Carriers joined with their zone; the `city` filter reads `z.city`.
const CARRIERS_FROM: &str =
  "FROM carriers c LEFT JOIN zones z ON z.zone_id = c.assigned_zone_id";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A haul store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All calls are
/// serialised onto one connection thread, and each address write is one
/// `BEGIN IMMEDIATE` transaction on it.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store; useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

/// Hand the default flag to the oldest address of `profile_id` other than
/// `except`. A no-op when there is none.
fn promote_oldest(
  conn: &rusqlite::Connection,
  profile_id: &str,
  except: &str,
  now: &str,
) -> rusqlite::Result<usize> {
  conn.execute(
    "UPDATE addresses SET is_default = 1, updated_at = ?3
     WHERE address_id = (
       SELECT address_id FROM addresses
       WHERE profile_id = ?1 AND address_id != ?2
       ORDER BY created_at, rowid
       LIMIT 1
     )",
    params![profile_id, except, now],
  )
}

// ─── Store impl ──────────────────────────────────────────────────────────────

impl Store for SqliteStore {
  type Error = crate::Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn upsert_user(&self, user: User) -> Result<User> {
    let id_str      = encode_uuid(user.id);
    let role_str    = encode_role(user.role);
    let created_str = encode_dt(user.created_at);
    let updated_str = encode_dt(user.updated_at);

    let raw: RawUser = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (
             id, name, surname, role, avatar_ref, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
           ON CONFLICT(id) DO UPDATE SET
             name       = excluded.name,
             surname    = excluded.surname,
             role       = excluded.role,
             avatar_ref = excluded.avatar_ref,
             updated_at = excluded.updated_at",
          params![
            id_str,
            user.name,
            user.surname,
            role_str,
            user.avatar_ref,
            created_str,
            updated_str,
          ],
        )?;
        let raw = conn.query_row(
          &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
          params![id_str],
          RawUser::from_row,
        )?;
        Ok(raw)
      })
      .await?;

    raw.into_user()
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id_str],
            RawUser::from_row,
          )
          .optional()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn update_user(&self, id: Uuid, patch: UserPatch) -> Result<Option<User>> {
    let patch = patch.normalized();
    if patch.is_empty() {
      return self.get_user(id).await;
    }

    let id_str  = encode_uuid(id);
    let now_str = encode_dt(Utc::now());

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE users SET
             name       = COALESCE(?2, name),
             surname    = COALESCE(?3, surname),
             avatar_ref = COALESCE(?4, avatar_ref),
             updated_at = ?5
           WHERE id = ?1",
          params![id_str, patch.name, patch.surname, patch.avatar_ref, now_str],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        let raw = conn.query_row(
          &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
          params![id_str],
          RawUser::from_row,
        )?;
        Ok(Some(raw))
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  // ── Client profiles ───────────────────────────────────────────────────────

  async fn add_profile(&self, input: NewProfile) -> Result<ClientProfile> {
    let now = Utc::now();
    let profile = ClientProfile {
      profile_id:  Uuid::new_v4(),
      user_id:     input.user_id,
      national_id: input.national_id,
      phone:       input.phone,
      created_at:  now,
      updated_at:  now,
    };

    let profile_str = encode_uuid(profile.profile_id);
    let user_str    = encode_uuid(profile.user_id);
    let national_id = profile.national_id.clone();
    let phone       = profile.phone.clone();
    let now_str     = encode_dt(now);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO client_profiles (
             profile_id, user_id, national_id, phone, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
          params![profile_str, user_str, national_id, phone, now_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(profile)
  }

  async fn get_profile(&self, profile_id: Uuid) -> Result<Option<ClientProfile>> {
    let id_str = encode_uuid(profile_id);

    let raw: Option<RawProfile> = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            &format!("SELECT {PROFILE_COLUMNS} FROM client_profiles WHERE profile_id = ?1"),
            params![id_str],
            RawProfile::from_row,
          )
          .optional()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawProfile::into_profile).transpose()
  }

  async fn profile_for_user(&self, user_id: Uuid) -> Result<Option<ClientProfile>> {
    let id_str = encode_uuid(user_id);

    let raw: Option<RawProfile> = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            &format!("SELECT {PROFILE_COLUMNS} FROM client_profiles WHERE user_id = ?1"),
            params![id_str],
            RawProfile::from_row,
          )
          .optional()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawProfile::into_profile).transpose()
  }

  // ── Addresses ─────────────────────────────────────────────────────────────

  async fn get_address(&self, address_id: Uuid) -> Result<Option<Address>> {
    let id_str = encode_uuid(address_id);

    let raw: Option<RawAddress> = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            &format!("SELECT {ADDRESS_COLUMNS} FROM addresses WHERE address_id = ?1"),
            params![id_str],
            RawAddress::from_row,
          )
          .optional()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawAddress::into_address).transpose()
  }

  async fn list_addresses(&self, profile_id: Uuid) -> Result<Vec<Address>> {
    let id_str = encode_uuid(profile_id);

    let raws: Vec<RawAddress> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ADDRESS_COLUMNS} FROM addresses
           WHERE profile_id = ?1
           ORDER BY is_default DESC, created_at, rowid"
        ))?;
        let rows = stmt
          .query_map(params![id_str], RawAddress::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAddress::into_address).collect()
  }

  async fn create_address(
    &self,
    profile_id: Uuid,
    input: NewAddress,
  ) -> Result<Option<Address>> {
    let input = input.validated()?;
    let requested = input.is_default;
    let now = Utc::now();
    let mut address = Address {
      address_id: Uuid::new_v4(),
      profile_id,
      street:     input.street,
      city:       input.city,
      notes:      input.notes,
      country:    input.country.unwrap_or_else(|| DEFAULT_COUNTRY.to_owned()),
      latitude:   input.latitude,
      longitude:  input.longitude,
      is_default: false,
      created_at: now,
      updated_at: now,
    };

    let created = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let profile_str = encode_uuid(address.profile_id);
        let now_str = encode_dt(address.created_at);

        let profile_exists = tx
          .query_row(
            "SELECT 1 FROM client_profiles WHERE profile_id = ?1",
            params![profile_str],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if !profile_exists {
          return Ok(None);
        }

        let existing: i64 = tx.query_row(
          "SELECT COUNT(*) FROM addresses WHERE profile_id = ?1",
          params![profile_str],
          |r| r.get(0),
        )?;
        let plan = plan_create(u64::try_from(existing).unwrap_or_default(), requested);

        if plan.clear_siblings {
          tx.execute(
            "UPDATE addresses SET is_default = 0, updated_at = ?2
             WHERE profile_id = ?1 AND is_default = 1",
            params![profile_str, now_str],
          )?;
        }
        address.is_default = plan.is_default;

        tx.execute(
          "INSERT INTO addresses (
             address_id, profile_id, street, city, notes, country,
             latitude, longitude, is_default, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
          params![
            encode_uuid(address.address_id),
            profile_str,
            address.street,
            address.city,
            address.notes,
            address.country,
            address.latitude,
            address.longitude,
            address.is_default,
            now_str,
          ],
        )?;
        tx.commit()?;

        tracing::debug!(
          address_id = %address.address_id,
          is_default = address.is_default,
          cleared_siblings = plan.clear_siblings,
          "address created"
        );
        Ok(Some(address))
      })
      .await?;

    Ok(created)
  }

  async fn update_address(
    &self,
    address_id: Uuid,
    patch: AddressPatch,
    policy: DefaultFlagPolicy,
  ) -> Result<Option<Address>> {
    let id_str  = encode_uuid(address_id);
    let now_str = encode_dt(Utc::now());

    let raw: Option<RawAddress> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current: Option<(String, bool)> = tx
          .query_row(
            "SELECT profile_id, is_default FROM addresses WHERE address_id = ?1",
            params![id_str],
            |r| Ok((r.get(0)?, r.get(1)?)),
          )
          .optional()?;
        let Some((profile_str, currently_default)) = current else {
          return Ok(None);
        };

        let has_siblings: bool = tx.query_row(
          "SELECT EXISTS (
             SELECT 1 FROM addresses WHERE profile_id = ?1 AND address_id != ?2
           )",
          params![profile_str, id_str],
          |r| r.get(0),
        )?;

        let plan = plan_update(patch.is_default, currently_default, has_siblings, policy);
        let is_default = match plan {
          UpdatePlan::Keep => currently_default,
          UpdatePlan::Claim => true,
          UpdatePlan::Release { .. } => false,
        };

        // Clear before set: the partial unique index is checked per statement.
        if plan == UpdatePlan::Claim {
          tx.execute(
            "UPDATE addresses SET is_default = 0, updated_at = ?3
             WHERE profile_id = ?1 AND address_id != ?2 AND is_default = 1",
            params![profile_str, id_str, now_str],
          )?;
        }

        tx.execute(
          "UPDATE addresses SET
             street     = COALESCE(?2, street),
             city       = COALESCE(?3, city),
             notes      = COALESCE(?4, notes),
             country    = COALESCE(?5, country),
             latitude   = COALESCE(?6, latitude),
             longitude  = COALESCE(?7, longitude),
             is_default = ?8,
             updated_at = ?9
           WHERE address_id = ?1",
          params![
            id_str,
            patch.street,
            patch.city,
            patch.notes,
            patch.country,
            patch.latitude,
            patch.longitude,
            is_default,
            now_str,
          ],
        )?;

        if plan == (UpdatePlan::Release { promote_sibling: true }) {
          promote_oldest(&tx, &profile_str, &id_str, &now_str)?;
        }

        let raw = tx.query_row(
          &format!("SELECT {ADDRESS_COLUMNS} FROM addresses WHERE address_id = ?1"),
          params![id_str],
          RawAddress::from_row,
        )?;
        tx.commit()?;

        tracing::debug!(address_id = %id_str, ?plan, "address updated");
        Ok(Some(raw))
      })
      .await?;

    raw.map(RawAddress::into_address).transpose()
  }

  async fn delete_address(
    &self,
    address_id: Uuid,
    policy: DefaultFlagPolicy,
  ) -> Result<bool> {
    let id_str  = encode_uuid(address_id);
    let now_str = encode_dt(Utc::now());

    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current: Option<(String, bool)> = tx
          .query_row(
            "SELECT profile_id, is_default FROM addresses WHERE address_id = ?1",
            params![id_str],
            |r| Ok((r.get(0)?, r.get(1)?)),
          )
          .optional()?;
        let Some((profile_str, was_default)) = current else {
          return Ok(false);
        };

        tx.execute("DELETE FROM addresses WHERE address_id = ?1", params![id_str])?;
        let promoted = promote_after_delete(was_default, policy)
          && promote_oldest(&tx, &profile_str, &id_str, &now_str)? > 0;
        tx.commit()?;

        tracing::debug!(address_id = %id_str, was_default, promoted, "address deleted");
        Ok(true)
      })
      .await?;

    Ok(deleted)
  }

  // ── Zones & carriers ──────────────────────────────────────────────────────

  async fn add_zone(&self, input: NewZone) -> Result<Zone> {
    let zone_str = encode_uuid(input.zone_id.unwrap_or_else(Uuid::new_v4));

    let raw: RawZone = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO zones (zone_id, name, city) VALUES (?1, ?2, ?3)",
          params![zone_str, input.name, input.city],
        )?;
        let raw = conn.query_row(
          &format!("SELECT {ZONE_COLUMNS} FROM zones WHERE zone_id = ?1"),
          params![zone_str],
          RawZone::from_row,
        )?;
        Ok(raw)
      })
      .await?;

    raw.into_zone()
  }

  async fn add_carrier(&self, input: NewCarrier) -> Result<Carrier> {
    let input = input.validated()?;
    let now = Utc::now();
    let carrier = Carrier {
      carrier_id:       Uuid::new_v4(),
      user_id:          input.user_id,
      vehicle_type:     input.vehicle_type,
      plate:            input.plate,
      cargo_capacity:   input.cargo_capacity,
      status:           input.status,
      assigned_zone_id: input.assigned_zone_id,
      average_rating:   input.average_rating,
      created_at:       now,
      updated_at:       now,
    };

    let carrier_str  = encode_uuid(carrier.carrier_id);
    let user_str     = encode_uuid(carrier.user_id);
    let vehicle_type = carrier.vehicle_type.clone();
    let plate        = carrier.plate.clone();
    let capacity     = carrier.cargo_capacity;
    let status_str   = encode_status(carrier.status);
    let zone_str     = carrier.assigned_zone_id.map(encode_uuid);
    let rating       = carrier.average_rating;
    let now_str      = encode_dt(now);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO carriers (
             carrier_id, user_id, vehicle_type, plate, cargo_capacity, status,
             assigned_zone_id, average_rating, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
          params![
            carrier_str,
            user_str,
            vehicle_type,
            plate,
            capacity,
            status_str,
            zone_str,
            rating,
            now_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(carrier)
  }

  async fn get_carrier(&self, carrier_id: Uuid) -> Result<Option<CarrierListing>> {
    let id_str = encode_uuid(carrier_id);

    let raw: Option<RawListing> = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            &format!(
              "SELECT {LISTING_COLUMNS}
               FROM carriers c LEFT JOIN users u ON u.id = c.user_id
               WHERE c.carrier_id = ?1"
            ),
            params![id_str],
            RawListing::from_row,
          )
          .optional()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawListing::into_listing).transpose()
  }

  async fn query_carriers<'a>(&'a self, query: &'a QuerySpec) -> Result<CarrierPage> {
    let mut clause = carrier_where(query);
    let filter_len = clause.params.len();
    let count_sql = format!("SELECT COUNT(*) {CARRIERS_FROM} {}", clause.sql);
    let paging = clause.paging(query);
    let page_sql = format!(
      "SELECT {LISTING_COLUMNS} {CARRIERS_FROM}
       LEFT JOIN users u ON u.id = c.user_id
       {}
       ORDER BY c.created_at, c.rowid
       {paging}",
      clause.sql
    );
    let values = clause.params;

    let (total, raws): (i64, Vec<RawListing>) = self
      .conn
      .call(move |conn| {
        let total: i64 = conn.query_row(
          &count_sql,
          params_from_iter(values[..filter_len].iter()),
          |r| r.get(0),
        )?;
        let mut stmt = conn.prepare(&page_sql)?;
        let rows = stmt
          .query_map(params_from_iter(values.iter()), RawListing::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok((total, rows))
      })
      .await?;

    let total = u64::try_from(total).unwrap_or_default();
    let data = raws
      .into_iter()
      .map(RawListing::into_listing)
      .collect::<Result<Vec<_>>>()?;

    Ok(CarrierPage {
      data,
      total,
      page: query.page,
      page_size: query.page_size,
      total_pages: query.total_pages(total),
    })
  }
}
