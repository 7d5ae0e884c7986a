//! Domain error taxonomy for `biblio-core`.
//!
//! Each variant corresponds to a stable machine-readable code surfaced in
//! HTTP error bodies. The code-to-status mapping lives in the server crate;
//! this crate stays transport-agnostic.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("book not found: {0}")]
  BookNotFound(String),

  #[error("no active or returned borrow for this user and book")]
  BorrowNotFound,

  #[error("purchase not found: {0}")]
  PurchaseNotFound(Uuid),

  #[error("user not found: {0}")]
  UserNotFound(String),

  #[error("no copies available for {0}")]
  NoCopiesAvailable(String),

  #[error("active borrow limit reached ({0})")]
  BorrowLimitExceeded(i64),

  #[error("per-book purchase limit reached ({0})")]
  BookBuyLimitExceeded(i64),

  #[error("total purchase limit reached ({0})")]
  TotalBuyLimitExceeded(i64),

  #[error("cancellation window of {0} minutes has expired")]
  CancellationWindowExpired(i64),

  #[error("X-User-Email header is required")]
  UserEmailRequired,

  #[error("X-Idempotency-Key header is required")]
  IdempotencyKeyRequired,

  #[error("invalid email address: {0}")]
  InvalidEmail(String),

  #[error("forbidden")]
  Forbidden,
}

impl Error {
  /// The stable machine-readable code for this error, as it appears in
  /// `{"error":{"code":...}}` response bodies.
  pub fn code(&self) -> &'static str {
    match self {
      Self::BookNotFound(_) => "BOOK_NOT_FOUND",
      Self::BorrowNotFound => "BORROW_NOT_FOUND",
      Self::PurchaseNotFound(_) => "PURCHASE_NOT_FOUND",
      Self::UserNotFound(_) => "USER_NOT_FOUND",
      Self::NoCopiesAvailable(_) => "NO_COPIES_AVAILABLE",
      Self::BorrowLimitExceeded(_) => "BORROW_LIMIT_EXCEEDED",
      Self::BookBuyLimitExceeded(_) => "BOOK_BUY_LIMIT_EXCEEDED",
      Self::TotalBuyLimitExceeded(_) => "TOTAL_BUY_LIMIT_EXCEEDED",
      Self::CancellationWindowExpired(_) => "CANCELLATION_WINDOW_EXPIRED",
      Self::UserEmailRequired => "USER_EMAIL_REQUIRED",
      Self::IdempotencyKeyRequired => "IDEMPOTENCY_KEY_REQUIRED",
      Self::InvalidEmail(_) => "INVALID_EMAIL",
      Self::Forbidden => "FORBIDDEN",
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
