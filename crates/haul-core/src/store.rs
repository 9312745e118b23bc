//! The `Store` trait: everything the HTTP layer needs from persistence.
//!
//! The trait is implemented by storage backends (e.g. `haul-store-sqlite`).
//! `haul-api` depends on this abstraction, not on any concrete backend.
//!
//! Not-found conditions are reported as `None` / `false`, so callers never
//! have to inspect a backend error to tell "missing" from "broken".

use std::future::Future;

use uuid::Uuid;

use crate::{
  address::{Address, AddressPatch, NewAddress},
  carrier::{Carrier, CarrierListing, CarrierPage, NewCarrier, NewZone, Zone},
  default_flag::DefaultFlagPolicy,
  query::QuerySpec,
  user::{ClientProfile, NewProfile, User, UserPatch},
};

/// Abstraction over a haul persistence backend.
///
/// The three address writes (`create_address`, `update_address`,
/// `delete_address`) must each run as one atomic unit: either the whole
/// default-flag transition is applied or none of it is.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait Store: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Insert or replace a user mirrored from the identity provider.
  fn upsert_user(
    &self,
    user: User,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Apply a partial update. Returns `None` if the user does not exist.
  fn update_user(
    &self,
    id: Uuid,
    patch: UserPatch,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  // ── Client profiles ───────────────────────────────────────────────────

  fn add_profile(
    &self,
    input: NewProfile,
  ) -> impl Future<Output = Result<ClientProfile, Self::Error>> + Send + '_;

  fn get_profile(
    &self,
    profile_id: Uuid,
  ) -> impl Future<Output = Result<Option<ClientProfile>, Self::Error>> + Send + '_;

  fn profile_for_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<ClientProfile>, Self::Error>> + Send + '_;

  // ── Addresses ─────────────────────────────────────────────────────────

  fn get_address(
    &self,
    address_id: Uuid,
  ) -> impl Future<Output = Result<Option<Address>, Self::Error>> + Send + '_;

  /// All addresses of a profile, default first, then oldest first.
  fn list_addresses(
    &self,
    profile_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Address>, Self::Error>> + Send + '_;

  /// Insert an address, deciding its default flag atomically.
  /// Returns `None` if the profile does not exist.
  fn create_address(
    &self,
    profile_id: Uuid,
    input: NewAddress,
  ) -> impl Future<Output = Result<Option<Address>, Self::Error>> + Send + '_;

  /// Patch an address, applying any default-flag change atomically.
  /// Returns `None` if the address does not exist.
  fn update_address(
    &self,
    address_id: Uuid,
    patch: AddressPatch,
    policy: DefaultFlagPolicy,
  ) -> impl Future<Output = Result<Option<Address>, Self::Error>> + Send + '_;

  /// Delete an address. Returns `false` if it did not exist.
  fn delete_address(
    &self,
    address_id: Uuid,
    policy: DefaultFlagPolicy,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Zones & carriers ──────────────────────────────────────────────────

  fn add_zone(
    &self,
    input: NewZone,
  ) -> impl Future<Output = Result<Zone, Self::Error>> + Send + '_;

  fn add_carrier(
    &self,
    input: NewCarrier,
  ) -> impl Future<Output = Result<Carrier, Self::Error>> + Send + '_;

  fn get_carrier(
    &self,
    carrier_id: Uuid,
  ) -> impl Future<Output = Result<Option<CarrierListing>, Self::Error>> + Send + '_;

  /// Run a composed carrier query: one page plus the unpaginated total.
  fn query_carriers<'a>(
    &'a self,
    query: &'a QuerySpec,
  ) -> impl Future<Output = Result<CarrierPage, Self::Error>> + Send + 'a;
}
