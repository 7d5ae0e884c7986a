//! Idempotency cache records — stored response snapshots keyed by
//! `(key, user, endpoint)`.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Hours a stored response remains replayable.
pub const TTL_HOURS: i64 = 24;

/// A cached endpoint response. The same key from a different user or
/// endpoint is a distinct cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdempotencyRecord {
  pub key:         String,
  pub user_id:     Uuid,
  pub endpoint:    String,
  pub response:    serde_json::Value,
  pub status_code: i32,
  pub expires_at:  DateTime<Utc>,
}

impl IdempotencyRecord {
  pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
    self.expires_at <= now
  }
}

/// Expiry for a response stored at `now`.
pub fn expires_at(now: DateTime<Utc>) -> DateTime<Utc> {
  now + Duration::hours(TTL_HOURS)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn record_expires_after_ttl() {
    let now = Utc::now();
    let record = IdempotencyRecord {
      key:         "k".into(),
      user_id:     Uuid::new_v4(),
      endpoint:    "buy".into(),
      response:    serde_json::json!({}),
      status_code: 200,
      expires_at:  expires_at(now),
    };
    assert!(!record.is_expired(now));
    assert!(!record.is_expired(now + Duration::hours(23)));
    assert!(record.is_expired(now + Duration::hours(25)));
  }
}
