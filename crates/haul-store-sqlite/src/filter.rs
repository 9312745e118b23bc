//! Renders a [`QuerySpec`] into a parameterised SQL `WHERE` clause.
//!
//! Every caller-supplied value travels as a bound parameter; the only text
//! spliced into the statement is fixed column names and `?N` placeholders.

use haul_core::query::{CarrierPredicate, QuerySpec};
use rusqlite::types::Value;

use crate::encode::encode_status;

/// A `WHERE` clause (possibly empty) and the values for its placeholders.
#[derive(Debug, PartialEq)]
pub struct WhereClause {
  pub sql:    String,
  pub params: Vec<Value>,
}

impl WhereClause {
  /// Append a value and return its `?N` placeholder.
  fn bind(&mut self, value: Value) -> String {
    self.params.push(value);
    format!("?{}", self.params.len())
  }

  /// Placeholders for `LIMIT ? OFFSET ?`, appended after the filter values.
  pub fn paging(&mut self, query: &QuerySpec) -> String {
    let limit = self.bind(Value::Integer(i64::from(query.page_size)));
    let offset = self.bind(Value::Integer(
      i64::try_from(query.offset).unwrap_or(i64::MAX),
    ));
    format!("LIMIT {limit} OFFSET {offset}")
  }
}

/// Expects the statement to alias `carriers` as `c` and the joined zone as `z`.
pub fn carrier_where(query: &QuerySpec) -> WhereClause {
  let mut clause = WhereClause { sql: String::new(), params: Vec::new() };
  let mut conjuncts = Vec::with_capacity(query.predicates.len());

  for predicate in &query.predicates {
    let sql = match predicate {
      CarrierPredicate::StatusIs(status) => {
        let p = clause.bind(Value::Text(encode_status(*status).to_owned()));
        format!("c.status = {p}")
      }
      CarrierPredicate::StatusIn(statuses) if statuses.is_empty() => "0".to_owned(),
      CarrierPredicate::StatusIn(statuses) => {
        let ps: Vec<String> = statuses
          .iter()
          .map(|s| clause.bind(Value::Text(encode_status(*s).to_owned())))
          .collect();
        format!("c.status IN ({})", ps.join(", "))
      }
      CarrierPredicate::ZoneCity(city) => {
        let p = clause.bind(Value::Text(city.clone()));
        format!("z.city = {p}")
      }
      CarrierPredicate::MinRating(min) => {
        let p = clause.bind(Value::Real(*min));
        format!("c.average_rating >= {p}")
      }
    };
    conjuncts.push(sql);
  }

  if !conjuncts.is_empty() {
    clause.sql = format!("WHERE {}", conjuncts.join(" AND "));
  }
  clause
}

#[cfg(test)]
mod tests {
  use haul_core::{
    carrier::CarrierStatus,
    query::{CarrierFilters, compose},
  };

  use super::*;

  #[test]
  fn default_visibility_renders_as_in_list() {
    let q = compose(CarrierFilters::default(), None, None);
    let w = carrier_where(&q);
    assert_eq!(w.sql, "WHERE c.status IN (?1, ?2)");
    assert_eq!(
      w.params,
      vec![Value::Text("pending".into()), Value::Text("active".into())]
    );
  }

  #[test]
  fn hostile_city_stays_a_parameter() {
    let filters = CarrierFilters {
      status: Some(CarrierStatus::Active),
      city: Some("Quito' OR 1=1 --".into()),
      min_rating: Some("4".into()),
    };
    let q = compose(filters, Some("2"), Some("5"));
    let mut w = carrier_where(&q);
    assert_eq!(
      w.sql,
      "WHERE c.status = ?1 AND z.city = ?2 AND c.average_rating >= ?3"
    );
    assert!(!w.sql.contains("Quito"));

    assert_eq!(w.paging(&q), "LIMIT ?4 OFFSET ?5");
    assert_eq!(w.params[3..], [Value::Integer(5), Value::Integer(5)]);
  }

  #[test]
  fn empty_status_set_matches_nothing() {
    let q = QuerySpec {
      predicates: vec![CarrierPredicate::StatusIn(Vec::new())],
      page:       1,
      page_size:  10,
      offset:     0,
    };
    assert_eq!(carrier_where(&q).sql, "WHERE 0");
  }
}
