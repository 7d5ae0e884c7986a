//! Durable job execution for Biblio.
//!
//! The [`runner::Runner`] polls the job table, claims due rows under a
//! lease, and dispatches them to a [`JobHandler`] looked up by type. Each
//! handler runs in its own serializable transaction; the runner records the
//! terminal state (or the backoff reschedule) afterwards.

use std::{collections::HashMap, future::Future, pin::Pin, sync::Arc};

use biblio_core::job::{Job, JobType};
use biblio_store_postgres::PgStore;

pub mod error;
pub mod reminder;
pub mod restock;
pub mod runner;

pub use error::{Error, Result};

/// A future returned by a job handler; boxed so handlers can live behind a
/// single registry as trait objects.
pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// A unit of deferred work. Implementations must be idempotent: the runner
/// retries on failure and a lease expiry can hand a half-finished job to
/// another worker, so every side effect needs a dedupe key.
pub trait JobHandler: Send + Sync {
  fn handle<'a>(&'a self, store: &'a PgStore, job: &'a Job)
    -> HandlerFuture<'a>;
}

/// Handler lookup by job type. A type with no registered handler fails the
/// job terminally rather than retrying something that can never succeed.
#[derive(Default)]
pub struct HandlerRegistry {
  handlers: HashMap<JobType, Arc<dyn JobHandler>>,
}

impl HandlerRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// The production registry: restock and reminder.
  pub fn standard() -> Self {
    let mut registry = Self::new();
    registry.register(JobType::Restock, Arc::new(restock::RestockHandler));
    registry.register(JobType::Reminder, Arc::new(reminder::ReminderHandler));
    registry
  }

  pub fn register(
    &mut self,
    job_type: JobType,
    handler: Arc<dyn JobHandler>,
  ) {
    self.handlers.insert(job_type, handler);
  }

  pub fn get(&self, job_type: JobType) -> Option<&Arc<dyn JobHandler>> {
    self.handlers.get(&job_type)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn standard_registry_covers_both_job_types() {
    let registry = HandlerRegistry::standard();
    assert!(registry.get(JobType::Restock).is_some());
    assert!(registry.get(JobType::Reminder).is_some());
  }

  #[test]
  fn empty_registry_has_no_handlers() {
    let registry = HandlerRegistry::new();
    assert!(registry.get(JobType::Restock).is_none());
  }
}
