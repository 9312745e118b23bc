//! Carrier list query composition.
//!
//! Turns untrusted query-string values into a [`QuerySpec`]: a closed list of
//! typed predicates plus normalised paging. Storage backends render the
//! predicates into their own query language; nothing here concatenates
//! caller-supplied text into a query.

use crate::carrier::CarrierStatus;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Filters accepted by `GET /carriers`, as received.
///
/// `status` is already typed: an unknown status is a client error the HTTP
/// layer reports before composition. `min_rating` stays raw because an
/// unparsable rating is ignored rather than refused.
#[derive(Debug, Clone, Default)]
pub struct CarrierFilters {
  pub status:     Option<CarrierStatus>,
  pub city:       Option<String>,
  pub min_rating: Option<String>,
}

/// One conjunct of the carrier filter.
#[derive(Debug, Clone, PartialEq)]
pub enum CarrierPredicate {
  StatusIs(CarrierStatus),
  StatusIn(Vec<CarrierStatus>),
  /// The city of the carrier's assigned zone equals this value.
  ZoneCity(String),
  /// Average rating is at least this value (inclusive).
  MinRating(f64),
}

/// A bounded, filtered carrier query. All predicates must hold.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
  pub predicates: Vec<CarrierPredicate>,
  pub page:       u32,
  pub page_size:  u32,
  pub offset:     u64,
}

impl QuerySpec {
  /// `ceil(total / page_size)`.
  pub fn total_pages(&self, total: u64) -> u64 {
    total.div_ceil(u64::from(self.page_size))
  }
}

pub fn compose(
  filters: CarrierFilters,
  page: Option<&str>,
  page_size: Option<&str>,
) -> QuerySpec {
  let page = page
    .and_then(|p| p.trim().parse::<i64>().ok())
    .filter(|p| *p >= 1)
    .map_or(DEFAULT_PAGE, |p| u32::try_from(p).unwrap_or(u32::MAX));

  let page_size = page_size
    .and_then(|s| s.trim().parse::<i64>().ok())
    .filter(|s| (1..=i64::from(MAX_PAGE_SIZE)).contains(s))
    .map_or(DEFAULT_PAGE_SIZE, |s| s as u32);

  let offset = u64::from(page - 1) * u64::from(page_size);

  let mut predicates = Vec::new();
  match filters.status {
    Some(status) => predicates.push(CarrierPredicate::StatusIs(status)),
    None => predicates.push(CarrierPredicate::StatusIn(
      CarrierStatus::VISIBLE_BY_DEFAULT.to_vec(),
    )),
  }
  if let Some(city) = filters.city.filter(|c| !c.trim().is_empty()) {
    predicates.push(CarrierPredicate::ZoneCity(city));
  }
  if let Some(min) = filters
    .min_rating
    .and_then(|r| r.trim().parse::<f64>().ok())
    .filter(|r| r.is_finite())
  {
    predicates.push(CarrierPredicate::MinRating(min));
  }

  QuerySpec { predicates, page, page_size, offset }
}
