//! Simulated email — persisted instead of delivered.
//!
//! Each row stands in for one outbound message; the unique `dedupe_key` is
//! what gives notifications their exactly-once semantics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Recipient of low-stock notifications.
pub const SUPPLY_EMAIL: &str = "supply@library.com";

/// Recipient of the milestone notification.
pub const MANAGEMENT_EMAIL: &str = "management@dummy-library.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmailType {
  LowStock,
  Reminder,
  Milestone,
}

impl EmailType {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::LowStock => "LOW_STOCK",
      Self::Reminder => "REMINDER",
      Self::Milestone => "MILESTONE",
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulatedEmail {
  pub id:         Uuid,
  pub recipient:  String,
  pub subject:    String,
  pub body:       String,
  pub email_type: EmailType,
  pub dedupe_key: String,
  pub created_at: DateTime<Utc>,
}

/// Input to the email append operation.
#[derive(Debug, Clone)]
pub struct NewEmail {
  pub recipient:  String,
  pub subject:    String,
  pub body:       String,
  pub email_type: EmailType,
  pub dedupe_key: String,
}
