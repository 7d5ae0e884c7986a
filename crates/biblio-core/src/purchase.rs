//! Purchase — a sale of one copy, cancellable within a short window.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum active purchases of a single book per user.
pub const PER_BOOK_LIMIT: i64 = 2;

/// Maximum active purchases per user across all books.
pub const TOTAL_LIMIT: i64 = 10;

/// Minutes after purchase during which cancellation is allowed.
pub const CANCEL_WINDOW_MINUTES: i64 = 5;

/// `ACTIVE → CANCELED`. Terminal; no other transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PurchaseStatus {
  Active,
  Canceled,
}

impl PurchaseStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Active => "ACTIVE",
      Self::Canceled => "CANCELED",
    }
  }
}

/// One sold copy. `price_cents` snapshots the book's sell price at purchase
/// time; later price changes never affect refunds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
  pub id:           Uuid,
  pub user_id:      Uuid,
  pub book_id:      Uuid,
  pub price_cents:  i64,
  pub purchased_at: DateTime<Utc>,
  pub canceled_at:  Option<DateTime<Utc>>,
  pub status:       PurchaseStatus,
}

impl Purchase {
  pub fn is_canceled(&self) -> bool {
    self.status == PurchaseStatus::Canceled
  }

  /// Whether the cancellation window is still open at `now`.
  pub fn cancellable_at(&self, now: DateTime<Utc>) -> bool {
    now - self.purchased_at <= Duration::minutes(CANCEL_WINDOW_MINUTES)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn purchase(purchased_at: DateTime<Utc>) -> Purchase {
    Purchase {
      id:           Uuid::new_v4(),
      user_id:      Uuid::new_v4(),
      book_id:      Uuid::new_v4(),
      price_cents:  1500,
      purchased_at,
      canceled_at:  None,
      status:       PurchaseStatus::Active,
    }
  }

  #[test]
  fn window_open_just_after_purchase() {
    let now = Utc::now();
    assert!(purchase(now).cancellable_at(now + Duration::minutes(4)));
  }

  #[test]
  fn window_closed_after_five_minutes() {
    let now = Utc::now();
    assert!(!purchase(now).cancellable_at(now + Duration::minutes(6)));
  }
}
