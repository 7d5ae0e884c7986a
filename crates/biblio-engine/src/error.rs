//! Error type for `biblio-engine`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A business-rule rejection with a stable machine code; maps to 4xx.
  #[error(transparent)]
  Domain(#[from] biblio_core::Error),

  /// Persistence failure, including serialization contests; maps to 5xx.
  #[error(transparent)]
  Store(#[from] biblio_store_postgres::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),
}

impl Error {
  /// Whether this is a lost serialization contest the client should retry.
  pub fn is_serialization_failure(&self) -> bool {
    matches!(self, Self::Store(e) if e.is_serialization_failure())
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
