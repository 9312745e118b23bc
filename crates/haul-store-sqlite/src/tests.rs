//! Integration tests for `SqliteStore`, mostly against an in-memory database.

use chrono::Utc;
use haul_core::{
  address::{AddressPatch, NewAddress},
  carrier::{CarrierStatus, NewCarrier, NewZone},
  default_flag::DefaultFlagPolicy,
  query::{CarrierFilters, compose},
  store::Store,
  user::{ClientProfile, NewProfile, Role, User, UserPatch},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn user(s: &SqliteStore, role: Role) -> User {
  s.upsert_user(User {
    id: Uuid::new_v4(),
    name: "Ana".into(),
    surname: "Vera".into(),
    role,
    avatar_ref: String::new(),
    created_at: Utc::now(),
    updated_at: Utc::now(),
  })
  .await
  .unwrap()
}

async fn profile(s: &SqliteStore) -> ClientProfile {
  let owner = user(s, Role::Client).await;
  s.add_profile(NewProfile {
    user_id:     owner.id,
    national_id: Uuid::new_v4().simple().to_string(),
    phone:       "0990000000".into(),
  })
  .await
  .unwrap()
}

fn address(street: &str, is_default: bool) -> NewAddress {
  NewAddress {
    street: street.into(),
    city: "Quito".into(),
    notes: String::new(),
    country: None,
    latitude: -0.18,
    longitude: -78.48,
    is_default,
  }
}

fn flag(is_default: bool) -> AddressPatch {
  AddressPatch { is_default: Some(is_default), ..Default::default() }
}

async fn defaults(s: &SqliteStore, profile_id: Uuid) -> Vec<String> {
  s.list_addresses(profile_id)
    .await
    .unwrap()
    .into_iter()
    .filter(|a| a.is_default)
    .map(|a| a.street)
    .collect()
}

// ─── Users & profiles ────────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_user_keeps_creation_time() {
  let s = store().await;
  let mut u = user(&s, Role::Client).await;
  let created = u.created_at;

  u.role = Role::Admin;
  u.created_at = Utc::now() + chrono::Duration::days(1);
  let again = s.upsert_user(u).await.unwrap();

  assert_eq!(again.role, Role::Admin);
  assert_eq!(again.created_at, s.get_user(again.id).await.unwrap().unwrap().created_at);
  assert!(again.created_at <= created + chrono::Duration::seconds(1));
}

#[tokio::test]
async fn update_user_ignores_blank_fields() {
  let s = store().await;
  let u = user(&s, Role::Client).await;

  let patch = UserPatch {
    name:       Some("Lucía".into()),
    surname:    Some("  ".into()),
    avatar_ref: None,
  };
  let updated = s.update_user(u.id, patch).await.unwrap().unwrap();
  assert_eq!(updated.name, "Lucía");
  assert_eq!(updated.surname, "Vera");
}

#[tokio::test]
async fn update_missing_user_returns_none() {
  let s = store().await;
  let patch = UserPatch { name: Some("x".into()), ..Default::default() };
  assert!(s.update_user(Uuid::new_v4(), patch).await.unwrap().is_none());
}

#[tokio::test]
async fn profile_is_found_by_user() {
  let s = store().await;
  let p = profile(&s).await;
  let found = s.profile_for_user(p.user_id).await.unwrap().unwrap();
  assert_eq!(found.profile_id, p.profile_id);
  assert_eq!(s.get_profile(p.profile_id).await.unwrap().unwrap(), found);
  assert!(s.profile_for_user(Uuid::new_v4()).await.unwrap().is_none());
}

// ─── Default address: create ─────────────────────────────────────────────────

#[tokio::test]
async fn first_address_becomes_default() {
  let s = store().await;
  let p = profile(&s).await;

  let a = s.create_address(p.profile_id, address("A", false)).await.unwrap().unwrap();
  assert!(a.is_default);
  assert_eq!(a.country, "Ecuador");
}

#[tokio::test]
async fn new_default_replaces_old_one() {
  let s = store().await;
  let p = profile(&s).await;

  s.create_address(p.profile_id, address("A", false)).await.unwrap();
  let b = s.create_address(p.profile_id, address("B", false)).await.unwrap().unwrap();
  assert!(!b.is_default);
  s.create_address(p.profile_id, address("C", true)).await.unwrap();

  assert_eq!(defaults(&s, p.profile_id).await, vec!["C"]);
}

#[tokio::test]
async fn create_for_missing_profile_returns_none() {
  let s = store().await;
  let created = s.create_address(Uuid::new_v4(), address("A", true)).await.unwrap();
  assert!(created.is_none());
}

#[tokio::test]
async fn list_puts_default_first_then_oldest() {
  let s = store().await;
  let p = profile(&s).await;

  s.create_address(p.profile_id, address("A", false)).await.unwrap();
  s.create_address(p.profile_id, address("B", false)).await.unwrap();
  s.create_address(p.profile_id, address("C", true)).await.unwrap();

  let streets: Vec<String> = s
    .list_addresses(p.profile_id)
    .await
    .unwrap()
    .into_iter()
    .map(|a| a.street)
    .collect();
  assert_eq!(streets, vec!["C", "A", "B"]);
}

#[tokio::test]
async fn concurrent_default_claims_leave_one_default() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("haul.db");
  let first = SqliteStore::open(&path).await.unwrap();
  let second = SqliteStore::open(&path).await.unwrap();
  let p = profile(&first).await;

  let mut tasks = tokio::task::JoinSet::new();
  for i in 0..40 {
    let s = if i % 2 == 0 { first.clone() } else { second.clone() };
    let profile_id = p.profile_id;
    tasks.spawn(async move {
      s.create_address(profile_id, address(&format!("street {i}"), true)).await
    });
  }
  while let Some(res) = tasks.join_next().await {
    res.unwrap().unwrap();
  }

  assert_eq!(second.list_addresses(p.profile_id).await.unwrap().len(), 40);
  assert_eq!(defaults(&first, p.profile_id).await.len(), 1);
  assert_eq!(defaults(&second, p.profile_id).await.len(), 1);
}

// ─── Default address: update ─────────────────────────────────────────────────

#[tokio::test]
async fn claiming_default_moves_the_flag() {
  let s = store().await;
  let p = profile(&s).await;

  s.create_address(p.profile_id, address("A", false)).await.unwrap();
  let b = s.create_address(p.profile_id, address("B", false)).await.unwrap().unwrap();

  let b = s
    .update_address(b.address_id, flag(true), DefaultFlagPolicy::AllowZeroDefault)
    .await
    .unwrap()
    .unwrap();
  assert!(b.is_default);
  assert_eq!(defaults(&s, p.profile_id).await, vec!["B"]);
}

#[tokio::test]
async fn omitted_flag_leaves_default_alone() {
  let s = store().await;
  let p = profile(&s).await;
  let a = s.create_address(p.profile_id, address("A", false)).await.unwrap().unwrap();

  let patch = AddressPatch {
    street: Some("A2".into()),
    notes: Some("ring twice".into()),
    ..Default::default()
  };
  let a = s
    .update_address(a.address_id, patch, DefaultFlagPolicy::AllowZeroDefault)
    .await
    .unwrap()
    .unwrap();
  assert!(a.is_default);
  assert_eq!(a.street, "A2");
  assert_eq!(a.notes, "ring twice");
  assert_eq!(a.city, "Quito");
}

#[tokio::test]
async fn demotion_can_leave_zero_defaults() {
  let s = store().await;
  let p = profile(&s).await;
  let a = s.create_address(p.profile_id, address("A", false)).await.unwrap().unwrap();
  s.create_address(p.profile_id, address("B", false)).await.unwrap();

  s.update_address(a.address_id, flag(false), DefaultFlagPolicy::AllowZeroDefault)
    .await
    .unwrap();
  assert!(defaults(&s, p.profile_id).await.is_empty());
}

#[tokio::test]
async fn demotion_promotes_oldest_sibling_under_strict_policy() {
  let s = store().await;
  let p = profile(&s).await;
  let a = s.create_address(p.profile_id, address("A", false)).await.unwrap().unwrap();
  s.create_address(p.profile_id, address("B", false)).await.unwrap();
  s.create_address(p.profile_id, address("C", false)).await.unwrap();

  let a = s
    .update_address(a.address_id, flag(false), DefaultFlagPolicy::PromoteOldest)
    .await
    .unwrap()
    .unwrap();
  assert!(!a.is_default);
  assert_eq!(defaults(&s, p.profile_id).await, vec!["B"]);
}

#[tokio::test]
async fn sole_address_stays_default_under_strict_policy() {
  let s = store().await;
  let p = profile(&s).await;
  let a = s.create_address(p.profile_id, address("A", false)).await.unwrap().unwrap();

  let a = s
    .update_address(a.address_id, flag(false), DefaultFlagPolicy::PromoteOldest)
    .await
    .unwrap()
    .unwrap();
  assert!(a.is_default);
}

#[tokio::test]
async fn failed_claim_rolls_back_sibling_clear() {
  let s = store().await;
  let p = profile(&s).await;
  s.create_address(p.profile_id, address("A", false)).await.unwrap();
  let b = s.create_address(p.profile_id, address("B", false)).await.unwrap().unwrap();

  // The coordinate CHECK fails after the siblings were already cleared.
  let patch = AddressPatch {
    latitude: Some(999.0),
    is_default: Some(true),
    ..Default::default()
  };
  let res = s
    .update_address(b.address_id, patch, DefaultFlagPolicy::AllowZeroDefault)
    .await;
  assert!(res.is_err());

  assert_eq!(defaults(&s, p.profile_id).await, vec!["A"]);
  let b = s.get_address(b.address_id).await.unwrap().unwrap();
  assert_eq!(b.latitude, -0.18);
}

#[tokio::test]
async fn update_missing_address_returns_none() {
  let s = store().await;
  let res = s
    .update_address(Uuid::new_v4(), flag(true), DefaultFlagPolicy::AllowZeroDefault)
    .await
    .unwrap();
  assert!(res.is_none());
}

// ─── Default address: delete ─────────────────────────────────────────────────

#[tokio::test]
async fn deleting_default_follows_policy() {
  let s = store().await;
  let p = profile(&s).await;
  let a = s.create_address(p.profile_id, address("A", false)).await.unwrap().unwrap();
  s.create_address(p.profile_id, address("B", false)).await.unwrap();

  assert!(s.delete_address(a.address_id, DefaultFlagPolicy::AllowZeroDefault).await.unwrap());
  assert!(defaults(&s, p.profile_id).await.is_empty());

  let q = profile(&s).await;
  let c = s.create_address(q.profile_id, address("C", false)).await.unwrap().unwrap();
  s.create_address(q.profile_id, address("D", false)).await.unwrap();
  s.delete_address(c.address_id, DefaultFlagPolicy::PromoteOldest).await.unwrap();
  assert_eq!(defaults(&s, q.profile_id).await, vec!["D"]);
}

#[tokio::test]
async fn delete_missing_address_returns_false() {
  let s = store().await;
  let deleted = s
    .delete_address(Uuid::new_v4(), DefaultFlagPolicy::PromoteOldest)
    .await
    .unwrap();
  assert!(!deleted);
}

// ─── Carriers ────────────────────────────────────────────────────────────────

async fn carrier(
  s: &SqliteStore,
  plate: &str,
  status: CarrierStatus,
  zone: Option<Uuid>,
  rating: f64,
) {
  let owner = user(s, Role::Carrier).await;
  s.add_carrier(NewCarrier {
    user_id:          owner.id,
    vehicle_type:     "van".into(),
    plate:            plate.into(),
    cargo_capacity:   1200.0,
    status,
    assigned_zone_id: zone,
    average_rating:   rating,
  })
  .await
  .unwrap();
}

/// Quito: P1 pending 4.8, A1 active 3.0, S1 suspended 5.0.
/// Guayaquil: A2 active 4.6. No zone: I1 inactive 4.9.
async fn fleet(s: &SqliteStore) {
  let quito = s
    .add_zone(NewZone { zone_id: None, name: "Norte".into(), city: "Quito".into() })
    .await
    .unwrap();
  let gye = s
    .add_zone(NewZone { zone_id: None, name: "Centro".into(), city: "Guayaquil".into() })
    .await
    .unwrap();

  carrier(s, "P1", CarrierStatus::Pending, Some(quito.zone_id), 4.8).await;
  carrier(s, "A1", CarrierStatus::Active, Some(quito.zone_id), 3.0).await;
  carrier(s, "S1", CarrierStatus::Suspended, Some(quito.zone_id), 5.0).await;
  carrier(s, "A2", CarrierStatus::Active, Some(gye.zone_id), 4.6).await;
  carrier(s, "I1", CarrierStatus::Inactive, None, 4.9).await;
}

fn plates(page: &haul_core::carrier::CarrierPage) -> Vec<&str> {
  page.data.iter().map(|l| l.carrier.plate.as_str()).collect()
}

#[tokio::test]
async fn default_listing_hides_inactive_and_suspended() {
  let s = store().await;
  fleet(&s).await;

  let q = compose(CarrierFilters::default(), None, None);
  let page = s.query_carriers(&q).await.unwrap();
  assert_eq!(plates(&page), vec!["P1", "A1", "A2"]);
  assert_eq!(page.total, 3);
  assert_eq!(page.total_pages, 1);
  assert!(page.data.iter().all(|l| l.user.is_some()));
}

#[tokio::test]
async fn filters_combine_conjunctively() {
  let s = store().await;
  fleet(&s).await;

  let filters = CarrierFilters {
    status:     Some(CarrierStatus::Active),
    city:       Some("Quito".into()),
    min_rating: None,
  };
  let page = s.query_carriers(&compose(filters, None, None)).await.unwrap();
  assert_eq!(plates(&page), vec!["A1"]);

  let filters = CarrierFilters {
    min_rating: Some("4.5".into()),
    ..Default::default()
  };
  let page = s.query_carriers(&compose(filters, None, None)).await.unwrap();
  assert_eq!(plates(&page), vec!["P1", "A2"]);

  let filters = CarrierFilters {
    status: Some(CarrierStatus::Suspended),
    ..Default::default()
  };
  let page = s.query_carriers(&compose(filters, None, None)).await.unwrap();
  assert_eq!(plates(&page), vec!["S1"]);
}

#[tokio::test]
async fn total_counts_all_pages() {
  let s = store().await;
  fleet(&s).await;

  let q = compose(CarrierFilters::default(), Some("2"), Some("2"));
  let page = s.query_carriers(&q).await.unwrap();
  assert_eq!(plates(&page), vec!["A2"]);
  assert_eq!(page.total, 3);
  assert_eq!(page.total_pages, 2);
  assert_eq!((page.page, page.page_size), (2, 2));

  let q = compose(CarrierFilters::default(), Some("9"), Some("2"));
  let page = s.query_carriers(&q).await.unwrap();
  assert!(page.data.is_empty());
  assert_eq!(page.total, 3);
}

#[tokio::test]
async fn hostile_city_matches_nothing() {
  let s = store().await;
  fleet(&s).await;

  let filters = CarrierFilters {
    city: Some("Quito' OR '1'='1".into()),
    ..Default::default()
  };
  let page = s.query_carriers(&compose(filters, None, None)).await.unwrap();
  assert_eq!(page.total, 0);
  assert!(page.data.is_empty());
}

#[tokio::test]
async fn get_carrier_embeds_user() {
  let s = store().await;
  let owner = user(&s, Role::Carrier).await;
  let c = s
    .add_carrier(NewCarrier {
      user_id:          owner.id,
      vehicle_type:     "truck".into(),
      plate:            "GYE-9".into(),
      cargo_capacity:   8000.0,
      status:           CarrierStatus::Active,
      assigned_zone_id: None,
      average_rating:   0.0,
    })
    .await
    .unwrap();

  let listing = s.get_carrier(c.carrier_id).await.unwrap().unwrap();
  assert_eq!(listing.carrier.carrier_id, c.carrier_id);
  assert_eq!(listing.carrier.status, CarrierStatus::Active);
  assert_eq!(listing.user.unwrap().id, owner.id);
  assert!(s.get_carrier(Uuid::new_v4()).await.unwrap().is_none());
}
