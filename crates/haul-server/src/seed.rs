//! JSON fixture loader behind `--seed`.
//!
//! Users normally arrive from the identity provider; in a local setup this
//! file stands in for that sync. Fixtures are applied in dependency order
//! (users, profiles, zones, carriers) so later sections can reference ids
//! from earlier ones.
//!
//! ```json
//! {
//!   "users":    [{ "id": "…", "name": "Ana", "role": "admin" }],
//!   "profiles": [{ "user_id": "…", "national_id": "1712345678" }],
//!   "zones":    [{ "zone_id": "…", "name": "Norte", "city": "Quito" }],
//!   "carriers": [{ "user_id": "…", "vehicle_type": "van", "plate": "PBA-1234",
//!                  "cargo_capacity": 1200, "assigned_zone_id": "…" }]
//! }
//! ```

use std::path::Path;

use anyhow::Context as _;
use haul_core::{
  carrier::{NewCarrier, NewZone},
  store::Store,
  user::{NewProfile, User},
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Fixtures {
  pub users:    Vec<User>,
  pub profiles: Vec<NewProfile>,
  pub zones:    Vec<NewZone>,
  pub carriers: Vec<NewCarrier>,
}

impl Fixtures {
  pub fn from_path(path: &Path) -> anyhow::Result<Self> {
    let text = std::fs::read_to_string(path)
      .with_context(|| format!("failed to read fixtures at {path:?}"))?;
    serde_json::from_str(&text)
      .with_context(|| format!("failed to parse fixtures at {path:?}"))
  }
}

/// How many records of each kind were written.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
  pub users:    usize,
  pub profiles: usize,
  pub zones:    usize,
  pub carriers: usize,
}

/// Write every fixture into `store`.
///
/// Users are upserted, so re-running against the same store refreshes them.
/// A user that already has a client profile is skipped. Zones and carriers
/// are plain inserts and fail on duplicates.
pub async fn load<S: Store>(store: &S, fixtures: Fixtures) -> anyhow::Result<SeedReport> {
  let mut report = SeedReport::default();

  for user in fixtures.users {
    let id = user.id;
    store
      .upsert_user(user)
      .await
      .with_context(|| format!("failed to seed user {id}"))?;
    report.users += 1;
  }

  for profile in fixtures.profiles {
    let user_id = profile.user_id;
    let existing = store
      .profile_for_user(user_id)
      .await
      .with_context(|| format!("failed to look up profile of {user_id}"))?;
    if existing.is_some() {
      tracing::debug!(%user_id, "client profile already present");
      continue;
    }
    store
      .add_profile(profile)
      .await
      .with_context(|| format!("failed to seed profile of {user_id}"))?;
    report.profiles += 1;
  }

  for zone in fixtures.zones {
    let name = zone.name.clone();
    store
      .add_zone(zone)
      .await
      .with_context(|| format!("failed to seed zone {name:?}"))?;
    report.zones += 1;
  }

  for carrier in fixtures.carriers {
    let plate = carrier.plate.clone();
    store
      .add_carrier(carrier)
      .await
      .with_context(|| format!("failed to seed carrier {plate:?}"))?;
    report.carriers += 1;
  }

  tracing::info!(
    users = report.users,
    profiles = report.profiles,
    zones = report.zones,
    carriers = report.carriers,
    "fixtures loaded"
  );
  Ok(report)
}
