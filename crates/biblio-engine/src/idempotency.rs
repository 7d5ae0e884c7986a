//! The idempotency cache — response replay for endpoints that must
//! deduplicate transport retries.
//!
//! The cache cell is `(key, user, endpoint)`; the same key from a different
//! user or endpoint is a distinct cell. Stored responses replay verbatim
//! for 24 hours; expired cells are dropped and the handler runs fresh.
//!
//! The consult/record pair runs inside the endpoint's own serializable
//! transaction, under the caller's advisory lock. That is what collapses
//! parallel same-key requests to a single purchase: the losers of the lock
//! wait, then find the winner's stored response.

use biblio_core::idempotency::{self, IdempotencyRecord};
use biblio_store_postgres::Tx;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::Result;

/// A response either produced by the wrapped handler or replayed from the
/// cache.
#[derive(Debug, Clone)]
pub struct CachedResponse {
  pub status_code: i32,
  pub body:        serde_json::Value,
  pub replayed:    bool,
}

/// Look up the caller's cell. A live record is returned for replay; an
/// expired one is deleted so the caller proceeds to run the handler.
pub async fn consult(
  tx: &Tx<'_>,
  key: &str,
  user_id: Uuid,
  endpoint: &str,
  now: DateTime<Utc>,
) -> Result<Option<CachedResponse>> {
  match tx.idempotency_get(key, user_id, endpoint).await? {
    Some(record) if !record.is_expired(now) => {
      tracing::debug!(key, endpoint, "idempotency replay");
      Ok(Some(CachedResponse {
        status_code: record.status_code,
        body:        record.response,
        replayed:    true,
      }))
    }
    Some(_) => {
      tx.idempotency_delete(key, user_id, endpoint).await?;
      Ok(None)
    }
    None => Ok(None),
  }
}

/// Store a response snapshot for later replay. Only outcomes below 500 are
/// cacheable; infrastructure failures abort the transaction and are never
/// recorded.
pub async fn record(
  tx: &Tx<'_>,
  key: &str,
  user_id: Uuid,
  endpoint: &str,
  status_code: i32,
  body: &serde_json::Value,
  now: DateTime<Utc>,
) -> Result<()> {
  tx.idempotency_put(
    &IdempotencyRecord {
      key:         key.to_owned(),
      user_id,
      endpoint:    endpoint.to_owned(),
      response:    body.clone(),
      status_code,
      expires_at:  idempotency::expires_at(now),
    },
    now,
  )
  .await?;
  Ok(())
}
