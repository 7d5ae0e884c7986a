//! Event — the append-only audit log.
//!
//! Events refer to users, books, borrows, purchases, and jobs but own none of
//! them; references are soft. Rows are never updated or deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
  Borrow,
  Return,
  Buy,
  CancelBuy,
  LowStockEmail,
  RestockScheduled,
  RestockDelivered,
  ReminderSent,
  MilestoneEmail,
}

impl EventType {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Borrow => "BORROW",
      Self::Return => "RETURN",
      Self::Buy => "BUY",
      Self::CancelBuy => "CANCEL_BUY",
      Self::LowStockEmail => "LOW_STOCK_EMAIL",
      Self::RestockScheduled => "RESTOCK_SCHEDULED",
      Self::RestockDelivered => "RESTOCK_DELIVERED",
      Self::ReminderSent => "REMINDER_SENT",
      Self::MilestoneEmail => "MILESTONE_EMAIL",
    }
  }
}

/// An immutable audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
  pub id:          Uuid,
  pub event_type:  EventType,
  pub user_id:     Option<Uuid>,
  pub book_id:     Option<Uuid>,
  pub borrow_id:   Option<Uuid>,
  pub purchase_id: Option<Uuid>,
  pub job_id:      Option<Uuid>,
  pub metadata:    serde_json::Value,
  pub dedupe_key:  Option<String>,
  pub created_at:  DateTime<Utc>,
}

/// Input to the event append operation. References default to `None`;
/// callers set only what the event actually refers to.
#[derive(Debug, Clone)]
pub struct NewEvent {
  pub event_type:  EventType,
  pub user_id:     Option<Uuid>,
  pub book_id:     Option<Uuid>,
  pub borrow_id:   Option<Uuid>,
  pub purchase_id: Option<Uuid>,
  pub job_id:      Option<Uuid>,
  pub metadata:    serde_json::Value,
  pub dedupe_key:  Option<String>,
}

impl NewEvent {
  pub fn new(event_type: EventType, dedupe_key: impl Into<String>) -> Self {
    Self {
      event_type,
      user_id: None,
      book_id: None,
      borrow_id: None,
      purchase_id: None,
      job_id: None,
      metadata: serde_json::Value::Null,
      dedupe_key: Some(dedupe_key.into()),
    }
  }

  pub fn user(mut self, id: Uuid) -> Self {
    self.user_id = Some(id);
    self
  }

  pub fn book(mut self, id: Uuid) -> Self {
    self.book_id = Some(id);
    self
  }

  pub fn borrow(mut self, id: Uuid) -> Self {
    self.borrow_id = Some(id);
    self
  }

  pub fn purchase(mut self, id: Uuid) -> Self {
    self.purchase_id = Some(id);
    self
  }

  pub fn job(mut self, id: Uuid) -> Self {
    self.job_id = Some(id);
    self
  }

  pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
    self.metadata = metadata;
    self
  }
}
