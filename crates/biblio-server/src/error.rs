//! Server error type and the `{"error":{"code":…,"message":…}}` response
//! contract.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use biblio_core::Error as Domain;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Business-rule rejection with a stable code; maps to 4xx.
  #[error(transparent)]
  Domain(#[from] Domain),

  /// A lost serialization contest; surfaced as 500 and retried by clients.
  #[error("conflicting concurrent update")]
  Serialization,

  #[error("internal error")]
  Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<biblio_engine::Error> for Error {
  fn from(e: biblio_engine::Error) -> Self {
    match e {
      biblio_engine::Error::Domain(d) => Self::Domain(d),
      biblio_engine::Error::Store(s) if s.is_serialization_failure() => {
        Self::Serialization
      }
      other => Self::Internal(Box::new(other)),
    }
  }
}

impl From<biblio_store_postgres::Error> for Error {
  fn from(e: biblio_store_postgres::Error) -> Self {
    if e.is_serialization_failure() {
      Self::Serialization
    } else {
      Self::Internal(Box::new(e))
    }
  }
}

/// HTTP status for a domain rejection, per the code-to-status table.
pub fn domain_status(e: &Domain) -> StatusCode {
  match e {
    Domain::BookNotFound(_)
    | Domain::BorrowNotFound
    | Domain::PurchaseNotFound(_)
    | Domain::UserNotFound(_) => StatusCode::NOT_FOUND,
    Domain::NoCopiesAvailable(_)
    | Domain::BorrowLimitExceeded(_)
    | Domain::BookBuyLimitExceeded(_)
    | Domain::TotalBuyLimitExceeded(_) => StatusCode::CONFLICT,
    Domain::CancellationWindowExpired(_)
    | Domain::UserEmailRequired
    | Domain::IdempotencyKeyRequired
    | Domain::InvalidEmail(_) => StatusCode::BAD_REQUEST,
    Domain::Forbidden => StatusCode::FORBIDDEN,
  }
}

/// The error body every non-2xx response carries.
pub fn error_body(code: &str, message: &str) -> serde_json::Value {
  json!({ "error": { "code": code, "message": message } })
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let (status, code, message) = match &self {
      Error::Domain(d) => (domain_status(d), d.code(), d.to_string()),
      Error::Serialization => (
        StatusCode::INTERNAL_SERVER_ERROR,
        "SERIALIZATION_FAILURE",
        self.to_string(),
      ),
      Error::Internal(e) => {
        tracing::error!(error = %e, "request failed");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          "INTERNAL_ERROR",
          "internal error".to_string(),
        )
      }
    };
    (status, Json(error_body(code, &message))).into_response()
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
