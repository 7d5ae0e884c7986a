//! The stock watcher — fires on the transition to exactly one remaining
//! copy and schedules replenishment within the triggering transaction.

use biblio_core::{
  book::Book,
  email::{EmailType, NewEmail, SUPPLY_EMAIL},
  event::{EventType, NewEvent},
  job::{JobType, RestockPayload},
  keys,
};
use biblio_store_postgres::Tx;
use chrono::{DateTime, Duration, Utc};
use serde_json::json;

use crate::Result;

/// Hours between scheduling a restock and its delivery attempt.
const RESTOCK_DELAY_HOURS: i64 = 1;

/// Invoked only when the caller observed `available_copies == 1` after its
/// decrement. A live restock job for the book makes this a no-op; otherwise
/// the job, the supplier email, and both audit events are appended
/// atomically with the triggering sale or borrow.
pub async fn watch(
  tx: &Tx<'_>,
  book: &Book,
  now: DateTime<Utc>,
) -> Result<()> {
  if tx.live_restock_job(book.id).await?.is_some() {
    return Ok(());
  }

  let payload = serde_json::to_value(RestockPayload {
    book_id: book.id,
    isbn:    book.isbn.clone(),
  })?;
  let run_at = now + Duration::hours(RESTOCK_DELAY_HOURS);
  let Some(job) = tx
    .insert_job(
      JobType::Restock,
      &keys::restock_job(book.id),
      run_at,
      &payload,
      Some(book.id),
      None,
      now,
    )
    .await?
  else {
    // Lost an insert race within this transaction's snapshot; a restock is
    // already scheduled.
    return Ok(());
  };

  tx.append_email(
    &NewEmail {
      recipient:  SUPPLY_EMAIL.to_owned(),
      subject:    format!("Low stock: {}", book.title),
      body:       format!(
        "Only one copy of \"{}\" (ISBN {}) remains. A restock has been \
         scheduled for {}.",
        book.title, book.isbn, run_at
      ),
      email_type: EmailType::LowStock,
      dedupe_key: keys::low_stock_email(&book.isbn, job.id),
    },
    now,
  )
  .await?;

  tx.append_event(
    &NewEvent::new(
      EventType::LowStockEmail,
      keys::low_stock_event(&book.isbn, job.id),
    )
    .book(book.id)
    .job(job.id)
    .metadata(json!({ "isbn": book.isbn, "recipient": SUPPLY_EMAIL })),
    now,
  )
  .await?;

  tx.append_event(
    &NewEvent::new(
      EventType::RestockScheduled,
      keys::restock_scheduled_event(job.id),
    )
    .book(book.id)
    .job(job.id)
    .metadata(json!({ "isbn": book.isbn, "runAt": run_at })),
    now,
  )
  .await?;

  tracing::info!(isbn = %book.isbn, job_id = %job.id, "restock scheduled");
  Ok(())
}
