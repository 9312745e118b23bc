//! Error types for `haul-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A required field was empty or missing.
  #[error("missing required field: {0}")]
  MissingField(&'static str),

  /// A field was present but outside its allowed range.
  #[error("invalid value for {field}: {reason}")]
  InvalidField {
    field:  &'static str,
    reason: String,
  },

  #[error("unknown carrier status: {0:?}")]
  UnknownStatus(String),

  #[error("unknown role: {0:?}")]
  UnknownRole(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
