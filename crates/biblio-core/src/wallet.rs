//! The library wallet and its append-only movement ledger.
//!
//! The balance is never stored; it is always the sum of movement amounts.
//! Movements are never updated or deleted, and a unique `dedupe_key` makes
//! every credit/debit safely retryable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Primary key of the singleton wallet row.
pub const WALLET_ID: &str = "library-wallet";

/// One-shot milestone threshold in cents ($2000).
pub const MILESTONE_CENTS: i64 = 200_000;

/// Classification of a ledger movement. The sign of the amount is what
/// actually moves money; the type is for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementType {
  BorrowIncome,
  BuyIncome,
  CancelRefund,
  RestockExpense,
  InitialBalance,
}

impl MovementType {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::BorrowIncome => "BORROW_INCOME",
      Self::BuyIncome => "BUY_INCOME",
      Self::CancelRefund => "CANCEL_REFUND",
      Self::RestockExpense => "RESTOCK_EXPENSE",
      Self::InitialBalance => "INITIAL_BALANCE",
    }
  }
}

/// The singleton wallet. Carries only the one-shot milestone flag; the
/// balance is derived from movements on every read.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
  pub id:                String,
  pub milestone_reached: bool,
}

/// One signed ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletMovement {
  pub id:             Uuid,
  pub wallet_id:      String,
  /// Signed; positive for credits, negative for debits.
  pub amount_cents:   i64,
  pub movement_type:  MovementType,
  pub reason:         String,
  /// Free-form pointer to the row that caused the movement.
  pub related_entity: Option<String>,
  /// Unique when set; a retried insert with the same key returns the
  /// original row instead of appending a duplicate.
  pub dedupe_key:     Option<String>,
  pub created_at:     DateTime<Utc>,
}

/// Input to the ledger append operation.
#[derive(Debug, Clone)]
pub struct NewMovement {
  pub amount_cents:   i64,
  pub movement_type:  MovementType,
  pub reason:         String,
  pub related_entity: Option<String>,
  pub dedupe_key:     Option<String>,
}

/// Credit/debit filter for the movement listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementDirection {
  /// `amount_cents > 0`
  Credit,
  /// `amount_cents < 0`
  Debit,
}

/// Filters for the paginated movement listing, newest first.
#[derive(Debug, Clone, Default)]
pub struct MovementQuery {
  pub direction: Option<MovementDirection>,
  pub from:      Option<DateTime<Utc>>,
  pub to:        Option<DateTime<Utc>>,
}
