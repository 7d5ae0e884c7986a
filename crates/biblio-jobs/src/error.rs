//! Error type for `biblio-jobs`.

use biblio_core::job::JobType;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Store(#[from] biblio_store_postgres::Error),

  #[error("payload decode error: {0}")]
  Json(#[from] serde_json::Error),

  /// No handler registered for this job type; the job fails terminally.
  #[error("no handler registered for job type {0:?}")]
  NoHandler(JobType),

  /// The handler exceeded its transaction budget; the lease will expire and
  /// the job will be reclaimed.
  #[error("handler timed out after {0}s")]
  Timeout(u64),

  /// The wallet cannot cover a restock; retried with backoff until funds
  /// arrive or attempts run out.
  #[error("insufficient funds: need {needed_cents} cents, have {balance_cents}")]
  InsufficientFunds {
    needed_cents:  i64,
    balance_cents: i64,
  },
}

impl Error {
  /// Errors that should fail the job immediately instead of consuming the
  /// remaining retry budget.
  pub fn is_terminal(&self) -> bool {
    matches!(self, Self::NoHandler(_))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
