//! Error type for `biblio-store-postgres`.
//!
//! Raw driver errors are classified on the way in: serialization failures
//! and unique violations get their own variants because callers make
//! control-flow decisions on them (surface to the client vs. swallow a
//! dedupe conflict).

use thiserror::Error;
use tokio_postgres::error::SqlState;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Postgres(#[source] tokio_postgres::Error),

  #[error("connection pool error: {0}")]
  Pool(String),

  /// SQLSTATE 40001/40P01. The enclosing transaction lost a serialization
  /// contest; the client retries.
  #[error("serialization failure: {0}")]
  Serialization(#[source] tokio_postgres::Error),

  /// SQLSTATE 23505 on a statement that did not route the conflict through
  /// `ON CONFLICT`. Carries the violated constraint when the server names
  /// one.
  #[error("unique violation on {}", .constraint.as_deref().unwrap_or("<unknown>"))]
  UniqueViolation {
    constraint: Option<String>,
    #[source]
    source:     tokio_postgres::Error,
  },

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("row decode error: {0}")]
  Decode(String),

  /// The singleton wallet row is missing; schema init has not run.
  #[error("wallet row not found")]
  WalletMissing,
}

impl From<tokio_postgres::Error> for Error {
  fn from(e: tokio_postgres::Error) -> Self {
    match e.code() {
      Some(c)
        if *c == SqlState::T_R_SERIALIZATION_FAILURE
          || *c == SqlState::T_R_DEADLOCK_DETECTED =>
      {
        Self::Serialization(e)
      }
      Some(c) if *c == SqlState::UNIQUE_VIOLATION => {
        let constraint = e
          .as_db_error()
          .and_then(|db| db.constraint())
          .map(str::to_owned);
        Self::UniqueViolation { constraint, source: e }
      }
      _ => Self::Postgres(e),
    }
  }
}

impl Error {
  pub fn is_serialization_failure(&self) -> bool {
    matches!(self, Self::Serialization(_))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
