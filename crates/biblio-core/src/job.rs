//! Durable jobs — the schedulable unit of deferred work.
//!
//! A job is schedulable (claimable by the runner) exactly while `active_key`
//! is set. Terminal transitions always clear the key, releasing the logical
//! slot for future scheduling. The unique index on `active_key` is what
//! guarantees at most one live job per logical key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Seconds between runner polls.
pub const POLL_INTERVAL_SECS: u64 = 5;

/// Seconds a claimed job is leased to a worker before it becomes
/// reclaimable.
pub const LEASE_SECS: i64 = 60;

/// Seconds a handler transaction may run before the runner abandons it.
pub const HANDLER_TIMEOUT_SECS: u64 = 30;

/// Exponential backoff base in seconds.
pub const BACKOFF_BASE_SECS: u64 = 60;

/// Exponential backoff cap in seconds.
pub const BACKOFF_CAP_SECS: u64 = 3600;

/// Default attempt budget per job.
pub const DEFAULT_MAX_ATTEMPTS: i32 = 10;

/// Jobs claimed per poll tick.
pub const CLAIM_BATCH: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobType {
  Restock,
  Reminder,
}

impl JobType {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Restock => "RESTOCK",
      Self::Reminder => "REMINDER",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
  Pending,
  Processing,
  Completed,
  Failed,
  Canceled,
}

impl JobStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Pending => "PENDING",
      Self::Processing => "PROCESSING",
      Self::Completed => "COMPLETED",
      Self::Failed => "FAILED",
      Self::Canceled => "CANCELED",
    }
  }

  /// Terminal states must have `active_key = NULL`.
  pub fn is_terminal(&self) -> bool {
    matches!(self, Self::Completed | Self::Failed | Self::Canceled)
  }
}

/// A durable job row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
  pub id:           Uuid,
  pub job_type:     JobType,
  pub status:       JobStatus,
  pub payload:      serde_json::Value,
  pub run_at:       DateTime<Utc>,
  pub attempts:     i32,
  pub max_attempts: i32,
  pub locked_at:    Option<DateTime<Utc>>,
  pub last_error:   Option<String>,
  pub completed_at: Option<DateTime<Utc>>,
  /// Set exactly while the job is schedulable (PENDING or PROCESSING).
  pub active_key:   Option<String>,
  pub book_id:      Option<Uuid>,
  pub borrow_id:    Option<Uuid>,
  pub created_at:   DateTime<Utc>,
}

/// Payload of a `RESTOCK` job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestockPayload {
  pub book_id: Uuid,
  pub isbn:    String,
}

/// Payload of a `REMINDER` job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderPayload {
  pub borrow_id:  Uuid,
  pub user_email: String,
}

/// Delay before the next attempt after `attempts` failed tries:
/// `min(BASE * 2^(attempts - 1), CAP)`.
pub fn retry_delay_secs(attempts: i32) -> u64 {
  // 60 << 6 already exceeds the cap, so clamping the exponent avoids overflow
  // for arbitrarily large attempt counts.
  let exponent = attempts.saturating_sub(1).clamp(0, 6) as u32;
  BACKOFF_CAP_SECS.min(BACKOFF_BASE_SECS << exponent)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn backoff_doubles_then_caps() {
    assert_eq!(retry_delay_secs(1), 60);
    assert_eq!(retry_delay_secs(2), 120);
    assert_eq!(retry_delay_secs(3), 240);
    assert_eq!(retry_delay_secs(4), 480);
    assert_eq!(retry_delay_secs(5), 960);
    assert_eq!(retry_delay_secs(6), 1920);
    assert_eq!(retry_delay_secs(7), 3600);
    assert_eq!(retry_delay_secs(100), 3600);
  }

  #[test]
  fn terminal_states() {
    assert!(JobStatus::Completed.is_terminal());
    assert!(JobStatus::Failed.is_terminal());
    assert!(JobStatus::Canceled.is_terminal());
    assert!(!JobStatus::Pending.is_terminal());
    assert!(!JobStatus::Processing.is_terminal());
  }
}
