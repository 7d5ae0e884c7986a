//! The borrow engine — checkout and return.

use biblio_core::{
  circulation::{Borrow, ACTIVE_BORROW_LIMIT},
  event::{EventType, NewEvent},
  job::{JobType, ReminderPayload},
  keys,
  wallet::{MovementType, NewMovement},
  Error as Domain,
};
use biblio_store_postgres::PgStore;
use chrono::Utc;
use serde_json::json;

use crate::{milestone, stock, RequestContext, Result};

/// Result of a borrow or return operation. `is_existing` marks the
/// idempotent path: the returned row pre-dates this request and no state
/// changed.
#[derive(Debug, Clone)]
pub struct BorrowOutcome {
  pub borrow:      Borrow,
  pub is_existing: bool,
}

/// Check out one copy of `isbn` for the caller.
///
/// Re-borrowing a book the caller already has active is an idempotent
/// success. Limit and inventory checks happen under the caller's advisory
/// lock, so parallel requests from one user cannot oversubscribe.
pub async fn borrow(
  store: &PgStore,
  ctx: &RequestContext,
  isbn: &str,
) -> Result<BorrowOutcome> {
  let now = Utc::now();
  let mut conn = store.acquire().await?;
  let tx = store.begin(&mut conn).await?;

  tx.lock_user(&ctx.user_email).await?;
  let user = tx.upsert_user(&ctx.user_email, now).await?;
  let book = tx
    .book_by_isbn(isbn)
    .await?
    .ok_or_else(|| Domain::BookNotFound(isbn.to_owned()))?;

  if let Some(existing) = tx.active_borrow(user.id, book.id).await? {
    tx.commit().await?;
    return Ok(BorrowOutcome { borrow: existing, is_existing: true });
  }

  let active = tx.count_active_borrows(user.id).await?;
  if active >= ACTIVE_BORROW_LIMIT {
    return Err(Domain::BorrowLimitExceeded(ACTIVE_BORROW_LIMIT).into());
  }

  let remaining = tx
    .take_copy(isbn)
    .await?
    .ok_or_else(|| Domain::NoCopiesAvailable(isbn.to_owned()))?;

  let borrow = tx.insert_borrow(user.id, book.id, now).await?;

  tx.append_movement(
    &NewMovement {
      amount_cents:   book.borrow_cents,
      movement_type:  MovementType::BorrowIncome,
      reason:         format!("Borrow fee for \"{}\"", book.title),
      related_entity: Some(format!("borrow:{}", borrow.id)),
      dedupe_key:     Some(keys::borrow_movement(borrow.id)),
    },
    now,
  )
  .await?;

  tx.append_event(
    &NewEvent::new(EventType::Borrow, keys::borrow_event(borrow.id))
      .user(user.id)
      .book(book.id)
      .borrow(borrow.id)
      .metadata(json!({ "isbn": book.isbn, "dueAt": borrow.due_at })),
    now,
  )
  .await?;

  let payload = serde_json::to_value(ReminderPayload {
    borrow_id:  borrow.id,
    user_email: user.email.clone(),
  })?;
  tx.insert_job(
    JobType::Reminder,
    &keys::reminder_job(borrow.id),
    borrow.due_at,
    &payload,
    Some(book.id),
    Some(borrow.id),
    now,
  )
  .await?;

  if remaining == 1 {
    stock::watch(&tx, &book, now).await?;
  }
  milestone::watch(&tx, now).await?;

  tx.commit().await?;
  tracing::info!(
    user = %user.email,
    isbn = %book.isbn,
    borrow_id = %borrow.id,
    "borrow recorded"
  );
  Ok(BorrowOutcome { borrow, is_existing: false })
}

/// Return the caller's active borrow of `isbn`.
///
/// Returning a book that was already returned replays the most recent
/// terminal row as an idempotent success.
pub async fn return_book(
  store: &PgStore,
  ctx: &RequestContext,
  isbn: &str,
) -> Result<BorrowOutcome> {
  let now = Utc::now();
  let mut conn = store.acquire().await?;
  let tx = store.begin(&mut conn).await?;

  tx.lock_user(&ctx.user_email).await?;
  let user = tx
    .user_by_email(&ctx.user_email)
    .await?
    .ok_or(Domain::BorrowNotFound)?;
  let book = tx
    .book_by_isbn(isbn)
    .await?
    .ok_or_else(|| Domain::BookNotFound(isbn.to_owned()))?;

  let Some(active) = tx.active_borrow(user.id, book.id).await? else {
    let Some(returned) = tx.latest_returned_borrow(user.id, book.id).await?
    else {
      return Err(Domain::BorrowNotFound.into());
    };
    tx.commit().await?;
    return Ok(BorrowOutcome { borrow: returned, is_existing: true });
  };

  let borrow = tx.mark_returned(active.id, now).await?;
  tx.release_copy(book.id).await?;
  tx.cancel_reminder_jobs(borrow.id).await?;

  tx.append_event(
    &NewEvent::new(EventType::Return, keys::return_event(borrow.id))
      .user(user.id)
      .book(book.id)
      .borrow(borrow.id)
      .metadata(json!({ "isbn": book.isbn, "returnedAt": borrow.returned_at })),
    now,
  )
  .await?;

  tx.commit().await?;
  tracing::info!(
    user = %user.email,
    isbn = %book.isbn,
    borrow_id = %borrow.id,
    "return recorded"
  );
  Ok(BorrowOutcome { borrow, is_existing: false })
}
