//! Response DTOs — the wire shapes, including formatted money fields.
//!
//! Every monetary amount goes out twice: `<name>Cents` as the integer of
//! record and `<name>Formatted` as the `"D.CC"` display string.

use biblio_core::{
  book::Book,
  circulation::{Borrow, BorrowStatus},
  money::format_cents,
  page::{PageRequest, Paginated},
  purchase::{Purchase, PurchaseStatus},
  wallet::{MovementType, WalletMovement},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Query parameters ────────────────────────────────────────────────────────

/// Shared pagination parameters.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
  pub page:      Option<i64>,
  pub page_size: Option<i64>,
}

impl PageParams {
  pub fn request(&self) -> PageRequest {
    PageRequest::clamped(self.page, self.page_size)
  }
}

// ─── Books ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDto {
  pub id:               Uuid,
  pub isbn:             String,
  pub title:            String,
  pub author:           String,
  pub genre:            String,
  pub sell_cents:       i64,
  pub sell_formatted:   String,
  pub borrow_cents:     i64,
  pub borrow_formatted: String,
  pub stock_cents:      i64,
  pub stock_formatted:  String,
  pub available_copies: i32,
  pub seeded_copies:    i32,
}

impl From<Book> for BookDto {
  fn from(b: Book) -> Self {
    Self {
      id:               b.id,
      isbn:             b.isbn,
      title:            b.title,
      author:           b.author,
      genre:            b.genre,
      sell_cents:       b.sell_cents,
      sell_formatted:   format_cents(b.sell_cents),
      borrow_cents:     b.borrow_cents,
      borrow_formatted: format_cents(b.borrow_cents),
      stock_cents:      b.stock_cents,
      stock_formatted:  format_cents(b.stock_cents),
      available_copies: b.available_copies,
      seeded_copies:    b.seeded_copies,
    }
  }
}

// ─── Borrows ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowDto {
  pub id:          Uuid,
  pub user_id:     Uuid,
  pub book_id:     Uuid,
  pub borrowed_at: DateTime<Utc>,
  pub due_at:      DateTime<Utc>,
  pub returned_at: Option<DateTime<Utc>>,
  pub status:      BorrowStatus,
}

impl From<Borrow> for BorrowDto {
  fn from(b: Borrow) -> Self {
    Self {
      id:          b.id,
      user_id:     b.user_id,
      book_id:     b.book_id,
      borrowed_at: b.borrowed_at,
      due_at:      b.due_at,
      returned_at: b.returned_at,
      status:      b.status,
    }
  }
}

/// Body of the borrow and return endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowResponse {
  pub borrow:      BorrowDto,
  pub is_existing: bool,
}

impl From<biblio_engine::borrow::BorrowOutcome> for BorrowResponse {
  fn from(o: biblio_engine::borrow::BorrowOutcome) -> Self {
    Self { borrow: o.borrow.into(), is_existing: o.is_existing }
  }
}

// ─── Purchases ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseDto {
  pub id:              Uuid,
  pub user_id:         Uuid,
  pub book_id:         Uuid,
  pub price_cents:     i64,
  pub price_formatted: String,
  pub purchased_at:    DateTime<Utc>,
  pub canceled_at:     Option<DateTime<Utc>>,
  pub status:          PurchaseStatus,
}

impl From<Purchase> for PurchaseDto {
  fn from(p: Purchase) -> Self {
    Self {
      id:              p.id,
      user_id:         p.user_id,
      book_id:         p.book_id,
      price_cents:     p.price_cents,
      price_formatted: format_cents(p.price_cents),
      purchased_at:    p.purchased_at,
      canceled_at:     p.canceled_at,
      status:          p.status,
    }
  }
}

/// Body of the buy and cancel endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResponse {
  pub purchase:    PurchaseDto,
  pub is_existing: bool,
}

impl From<biblio_engine::purchase::PurchaseOutcome> for PurchaseResponse {
  fn from(o: biblio_engine::purchase::PurchaseOutcome) -> Self {
    Self { purchase: o.purchase.into(), is_existing: o.is_existing }
  }
}

// ─── Wallet ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletDto {
  pub id:                String,
  pub balance_cents:     i64,
  pub balance_formatted: String,
  pub milestone_reached: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementDto {
  pub id:               Uuid,
  pub amount_cents:     i64,
  pub amount_formatted: String,
  pub movement_type:    MovementType,
  pub reason:           String,
  pub related_entity:   Option<String>,
  pub created_at:       DateTime<Utc>,
}

impl From<WalletMovement> for MovementDto {
  fn from(m: WalletMovement) -> Self {
    Self {
      id:               m.id,
      amount_cents:     m.amount_cents,
      amount_formatted: format_cents(m.amount_cents),
      movement_type:    m.movement_type,
      reason:           m.reason,
      related_entity:   m.related_entity,
      created_at:       m.created_at,
    }
  }
}

/// Re-wrap a page of rows with a DTO conversion, keeping the envelope.
pub fn map_page<T, U: From<T>>(page: Paginated<T>) -> Paginated<U> {
  Paginated {
    data:       page.data.into_iter().map(U::from).collect(),
    pagination: page.pagination,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn money_fields_carry_both_forms() {
    let dto = PurchaseDto::from(Purchase {
      id:           Uuid::new_v4(),
      user_id:      Uuid::new_v4(),
      book_id:      Uuid::new_v4(),
      price_cents:  1550,
      purchased_at: Utc::now(),
      canceled_at:  None,
      status:       PurchaseStatus::Active,
    });
    let json = serde_json::to_value(&dto).unwrap();
    assert_eq!(json["priceCents"], 1550);
    assert_eq!(json["priceFormatted"], "15.50");
    assert_eq!(json["status"], "ACTIVE");
  }
}
