//! Book — the inventory unit.
//!
//! A book row is seeded once and never deleted. `available_copies` moves with
//! borrows, returns, purchases, cancellations, and restocks; `seeded_copies`
//! is the replenishment target fixed at seed time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A catalogued book. Identity is the externally-supplied `isbn`; `id` is the
/// stable internal key other rows reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
  pub id:               Uuid,
  pub isbn:             String,
  pub title:            String,
  pub author:           String,
  pub genre:            String,
  /// Purchase price in cents. Always positive.
  pub sell_cents:       i64,
  /// Borrow fee in cents. Always positive.
  pub borrow_cents:     i64,
  /// Per-copy replenishment cost in cents. Always positive.
  pub stock_cents:      i64,
  /// Copies currently on the shelf. Never negative.
  pub available_copies: i32,
  /// The restock target, fixed at seed time.
  pub seeded_copies:    i32,
  pub created_at:       DateTime<Utc>,
}

/// Input to the seed path. `copies` becomes both `available_copies` and
/// `seeded_copies` on first insert.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
  pub isbn:         String,
  pub title:        String,
  pub author:       String,
  pub genre:        String,
  pub sell_cents:   i64,
  pub borrow_cents: i64,
  pub stock_cents:  i64,
  pub copies:       i32,
}

/// Catalogue search filters for the public listing endpoint. All text
/// filters are case-insensitive substring matches.
#[derive(Debug, Clone, Default)]
pub struct BookQuery {
  pub title:  Option<String>,
  pub author: Option<String>,
  pub genre:  Option<String>,
}
