//! Transactional engines for Biblio.
//!
//! Each public operation here runs exactly one serializable transaction:
//! advisory lock, precondition reads, inventory mutation, ledger append,
//! audit event, secondary effects. The watchers run inside the triggering
//! transaction so their side effects commit or roll back with it.

pub mod borrow;
pub mod error;
pub mod idempotency;
pub mod milestone;
pub mod purchase;
pub mod stock;

pub use error::{Error, Result};

/// Request-scoped context resolved by the transport layer and passed
/// explicitly to engine functions. No implicit per-request storage.
#[derive(Debug, Clone)]
pub struct RequestContext {
  pub user_email:      String,
  /// Present when the endpoint participates in idempotency-key replay.
  pub idempotency_key: Option<String>,
}

impl RequestContext {
  pub fn new(user_email: impl Into<String>) -> Self {
    Self { user_email: user_email.into(), idempotency_key: None }
  }

  pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
    self.idempotency_key = Some(key.into());
    self
  }
}
