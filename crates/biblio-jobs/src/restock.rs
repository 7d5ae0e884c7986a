//! Restock handler — replenishes a book to its seeded level and debits the
//! wallet, atomically.

use biblio_core::{
  event::{EventType, NewEvent},
  job::{Job, RestockPayload},
  keys,
  wallet::{MovementType, NewMovement},
};
use biblio_store_postgres::PgStore;
use chrono::Utc;
use serde_json::json;

use crate::{Error, HandlerFuture, JobHandler, Result};

pub struct RestockHandler;

impl JobHandler for RestockHandler {
  fn handle<'a>(
    &'a self,
    store: &'a PgStore,
    job: &'a Job,
  ) -> HandlerFuture<'a> {
    Box::pin(deliver(store, job))
  }
}

async fn deliver(store: &PgStore, job: &Job) -> Result<()> {
  let payload: RestockPayload = serde_json::from_value(job.payload.clone())?;
  let now = Utc::now();
  let mut conn = store.acquire().await?;
  let tx = store.begin(&mut conn).await?;

  // A vanished book or an already-full shelf is a success, not a retry.
  let Some(book) = tx.book_by_id(payload.book_id).await? else {
    tx.commit().await?;
    return Ok(());
  };
  let needed = book.seeded_copies - book.available_copies;
  if needed <= 0 {
    tx.commit().await?;
    return Ok(());
  }

  let cost = i64::from(needed) * book.stock_cents;
  let balance = tx.balance().await?;
  if balance < cost {
    return Err(Error::InsufficientFunds {
      needed_cents:  cost,
      balance_cents: balance,
    });
  }

  tx.append_movement(
    &NewMovement {
      amount_cents:   -cost,
      movement_type:  MovementType::RestockExpense,
      reason:         format!(
        "Restock of {} copies of \"{}\"",
        needed, book.title
      ),
      related_entity: Some(format!("book:{}", book.id)),
      dedupe_key:     Some(keys::restock_movement(job.id)),
    },
    now,
  )
  .await?;

  let new_available = tx.add_copies(book.id, needed).await?;

  tx.append_event(
    &NewEvent::new(
      EventType::RestockDelivered,
      keys::restock_delivered_event(job.id),
    )
    .book(book.id)
    .job(job.id)
    .metadata(json!({
      "copiesAdded":       needed,
      "totalCostCents":    cost,
      "previousAvailable": book.available_copies,
      "newAvailable":      new_available,
    })),
    now,
  )
  .await?;

  tx.commit().await?;
  tracing::info!(
    isbn = %book.isbn,
    copies = needed,
    cost_cents = cost,
    "restock delivered"
  );
  Ok(())
}
