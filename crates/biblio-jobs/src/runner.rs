//! The job runner — a single long-lived poll loop with lease-based
//! claiming, per-handler timeouts, and exponential backoff.

use std::time::Duration;

use biblio_core::job::{
  self, Job, CLAIM_BATCH, HANDLER_TIMEOUT_SECS, POLL_INTERVAL_SECS,
};
use biblio_store_postgres::PgStore;
use chrono::Utc;
use tokio::sync::watch;

use crate::{Error, HandlerRegistry, Result};

/// Polls the job table and drives handlers to a terminal state or a
/// backoff reschedule. One instance per process; multiple processes
/// coordinate safely through the atomic claim update.
pub struct Runner {
  store:    PgStore,
  registry: HandlerRegistry,
}

impl Runner {
  pub fn new(store: PgStore, registry: HandlerRegistry) -> Self {
    Self { store, registry }
  }

  /// Run until the shutdown signal flips. Poll errors are logged and the
  /// loop keeps going; a broken database should not kill the process.
  pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
    let mut tick =
      tokio::time::interval(Duration::from_secs(POLL_INTERVAL_SECS));
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    tracing::info!("job runner started");

    loop {
      tokio::select! {
        _ = tick.tick() => {
          if let Err(e) = self.poll_once().await {
            tracing::error!(error = %e, "job poll failed");
          }
        }
        _ = shutdown.changed() => {
          tracing::info!("job runner stopping");
          break;
        }
      }
    }
  }

  /// One poll tick: scan for due jobs, claim each, dispatch the winners.
  pub async fn poll_once(&self) -> Result<()> {
    let now = Utc::now();
    let due = {
      let mut conn = self.store.acquire().await?;
      let tx = self.store.begin(&mut conn).await?;
      let due = tx.due_jobs(now, CLAIM_BATCH).await?;
      tx.commit().await?;
      due
    };

    for job in due {
      let claim_time = Utc::now();
      let claimed = {
        let mut conn = self.store.acquire().await?;
        let tx = self.store.begin(&mut conn).await?;
        let claimed = tx.claim_job(job.id, claim_time).await?;
        tx.commit().await?;
        claimed
      };
      if !claimed {
        // Another worker won the claim.
        continue;
      }

      // The claim bumped the attempt counter; mirror that for the backoff
      // and exhaustion decisions below.
      let attempts = job.attempts + 1;
      self.dispatch(&job, attempts).await;
    }
    Ok(())
  }

  async fn dispatch(&self, job: &Job, attempts: i32) {
    let result = match self.registry.get(job.job_type) {
      None => Err(Error::NoHandler(job.job_type)),
      Some(handler) => {
        match tokio::time::timeout(
          Duration::from_secs(HANDLER_TIMEOUT_SECS),
          handler.handle(&self.store, job),
        )
        .await
        {
          Ok(result) => result,
          Err(_) => Err(Error::Timeout(HANDLER_TIMEOUT_SECS)),
        }
      }
    };

    let now = Utc::now();
    let settle = match &result {
      Ok(()) => self.settle_success(job).await,
      Err(e) if e.is_terminal() || attempts >= job.max_attempts => {
        tracing::warn!(
          job_id = %job.id,
          job_type = ?job.job_type,
          attempts,
          error = %e,
          "job failed terminally"
        );
        self.settle_failure(job, e).await
      }
      Err(e) => {
        let delay = job::retry_delay_secs(attempts);
        tracing::warn!(
          job_id = %job.id,
          job_type = ?job.job_type,
          attempts,
          retry_in_secs = delay,
          error = %e,
          "job attempt failed; rescheduled"
        );
        self
          .settle_retry(job, now + chrono::Duration::seconds(delay as i64), e)
          .await
      }
    };

    if let Err(e) = settle {
      // The lease will expire and another tick picks the job back up.
      tracing::error!(job_id = %job.id, error = %e, "failed to settle job");
    }
  }

  async fn settle_success(&self, job: &Job) -> Result<()> {
    let mut conn = self.store.acquire().await?;
    let tx = self.store.begin(&mut conn).await?;
    tx.complete_job(job.id, Utc::now()).await?;
    tx.commit().await?;
    tracing::info!(job_id = %job.id, job_type = ?job.job_type, "job completed");
    Ok(())
  }

  async fn settle_failure(&self, job: &Job, error: &Error) -> Result<()> {
    let mut conn = self.store.acquire().await?;
    let tx = self.store.begin(&mut conn).await?;
    tx.fail_job(job.id, Utc::now(), &error.to_string()).await?;
    tx.commit().await?;
    Ok(())
  }

  async fn settle_retry(
    &self,
    job: &Job,
    run_at: chrono::DateTime<Utc>,
    error: &Error,
  ) -> Result<()> {
    let mut conn = self.store.acquire().await?;
    let tx = self.store.begin(&mut conn).await?;
    tx.reschedule_job(job.id, run_at, &error.to_string()).await?;
    tx.commit().await?;
    Ok(())
  }
}
