//! Borrow — the circulation record.
//!
//! A borrow is `Active` from checkout until return, then `Returned` forever.
//! While active it holds a unique `active_key` of the form
//! `"{user_id}:{book_id}"`; the key is cleared on return so the unique index
//! only ever sees live borrows.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum simultaneous active borrows per user.
pub const ACTIVE_BORROW_LIMIT: i64 = 3;

/// Hours until a borrow is due.
pub const LOAN_PERIOD_HOURS: i64 = 72;

/// `ACTIVE → RETURNED`. Terminal; no other transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BorrowStatus {
  Active,
  Returned,
}

impl BorrowStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Active => "ACTIVE",
      Self::Returned => "RETURNED",
    }
  }
}

/// A single checkout of one copy by one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Borrow {
  pub id:          Uuid,
  pub user_id:     Uuid,
  pub book_id:     Uuid,
  pub borrowed_at: DateTime<Utc>,
  pub due_at:      DateTime<Utc>,
  pub returned_at: Option<DateTime<Utc>>,
  pub status:      BorrowStatus,
  /// `"{user_id}:{book_id}"` while `Active`, `None` once returned.
  pub active_key:  Option<String>,
}

impl Borrow {
  pub fn is_active(&self) -> bool {
    self.status == BorrowStatus::Active
  }
}

/// Due date for a borrow taken out at `borrowed_at`.
pub fn due_at(borrowed_at: DateTime<Utc>) -> DateTime<Utc> {
  borrowed_at + Duration::hours(LOAN_PERIOD_HOURS)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn due_date_is_72_hours_out() {
    let now = Utc::now();
    assert_eq!(due_at(now) - now, Duration::hours(72));
  }
}
