//! Reminder handler — sends exactly one due-date email per active borrow.

use biblio_core::{
  email::{EmailType, NewEmail},
  event::{EventType, NewEvent},
  job::{Job, ReminderPayload},
  keys,
};
use biblio_store_postgres::PgStore;
use chrono::Utc;
use serde_json::json;

use crate::{HandlerFuture, JobHandler, Result};

pub struct ReminderHandler;

impl JobHandler for ReminderHandler {
  fn handle<'a>(
    &'a self,
    store: &'a PgStore,
    job: &'a Job,
  ) -> HandlerFuture<'a> {
    Box::pin(remind(store, job))
  }
}

async fn remind(store: &PgStore, job: &Job) -> Result<()> {
  let payload: ReminderPayload = serde_json::from_value(job.payload.clone())?;
  let now = Utc::now();
  let mut conn = store.acquire().await?;
  let tx = store.begin(&mut conn).await?;

  // A borrow that no longer exists or was already returned needs no
  // reminder; both are successes.
  let Some(borrow) = tx.borrow_by_id(payload.borrow_id).await? else {
    tx.commit().await?;
    return Ok(());
  };
  if borrow.active_key.is_none() {
    tx.commit().await?;
    return Ok(());
  }

  let dedupe_key = keys::reminder_email(borrow.id);
  if tx.email_by_dedupe_key(&dedupe_key).await?.is_some() {
    tx.commit().await?;
    return Ok(());
  }

  let Some(book) = tx.book_by_id(borrow.book_id).await? else {
    tx.commit().await?;
    return Ok(());
  };

  tx.append_email(
    &NewEmail {
      recipient: payload.user_email.clone(),
      subject:   format!("Reminder: \"{}\" is due soon", book.title),
      body:      format!(
        "Your borrowed copy of \"{}\" (ISBN {}) is due at {}. Please \
         return it to avoid losing borrowing privileges.",
        book.title, book.isbn, borrow.due_at
      ),
      email_type: EmailType::Reminder,
      dedupe_key,
    },
    now,
  )
  .await?;

  tx.append_event(
    &NewEvent::new(EventType::ReminderSent, keys::reminder_event(borrow.id))
      .user(borrow.user_id)
      .book(book.id)
      .borrow(borrow.id)
      .job(job.id)
      .metadata(json!({
        "userEmail": payload.user_email,
        "bookTitle": book.title,
        "dueAt":     borrow.due_at,
      })),
    now,
  )
  .await?;

  tx.commit().await?;
  tracing::info!(borrow_id = %borrow.id, "reminder sent");
  Ok(())
}
