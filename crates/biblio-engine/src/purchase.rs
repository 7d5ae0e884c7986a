//! The purchase engine — buy and cancel.

use biblio_core::{
  event::{EventType, NewEvent},
  keys,
  purchase::{Purchase, CANCEL_WINDOW_MINUTES, PER_BOOK_LIMIT, TOTAL_LIMIT},
  user::User,
  wallet::{MovementType, NewMovement},
  Error as Domain,
};
use biblio_store_postgres::{PgStore, Tx};
use chrono::{DateTime, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::{
  idempotency::{self, CachedResponse},
  milestone, stock, RequestContext, Result,
};

/// Endpoint discriminator for the idempotency cache.
const BUY_ENDPOINT: &str = "buy";

/// Result of a buy or cancel operation; `is_existing` marks the idempotent
/// replay of an already-terminal row.
#[derive(Debug, Clone)]
pub struct PurchaseOutcome {
  pub purchase:    Purchase,
  pub is_existing: bool,
}

/// The buy steps, composed on an open transaction.
///
/// The inner `Result` carries business-rule rejections; they leave the
/// transaction free of mutations (the conditional decrement affected zero
/// rows), so a caller may still commit other work — the cached-buy path
/// commits the stored rejection response. Infrastructure errors propagate
/// through the outer `Result` and abort everything.
async fn buy_in_tx(
  tx: &Tx<'_>,
  user: &User,
  isbn: &str,
  now: DateTime<Utc>,
) -> Result<std::result::Result<PurchaseOutcome, Domain>> {
  let Some(book) = tx.book_by_isbn(isbn).await? else {
    return Ok(Err(Domain::BookNotFound(isbn.to_owned())));
  };

  let per_book = tx.count_active_purchases_for_book(user.id, book.id).await?;
  if per_book >= PER_BOOK_LIMIT {
    return Ok(Err(Domain::BookBuyLimitExceeded(PER_BOOK_LIMIT)));
  }
  let total = tx.count_active_purchases(user.id).await?;
  if total >= TOTAL_LIMIT {
    return Ok(Err(Domain::TotalBuyLimitExceeded(TOTAL_LIMIT)));
  }

  let Some(remaining) = tx.take_copy(isbn).await? else {
    return Ok(Err(Domain::NoCopiesAvailable(isbn.to_owned())));
  };

  let purchase =
    tx.insert_purchase(user.id, book.id, book.sell_cents, now).await?;

  tx.append_movement(
    &NewMovement {
      amount_cents:   book.sell_cents,
      movement_type:  MovementType::BuyIncome,
      reason:         format!("Sale of \"{}\"", book.title),
      related_entity: Some(format!("purchase:{}", purchase.id)),
      dedupe_key:     Some(keys::buy_movement(purchase.id)),
    },
    now,
  )
  .await?;

  tx.append_event(
    &NewEvent::new(EventType::Buy, keys::buy_event(purchase.id))
      .user(user.id)
      .book(book.id)
      .purchase(purchase.id)
      .metadata(json!({ "isbn": book.isbn, "priceCents": purchase.price_cents })),
    now,
  )
  .await?;

  if remaining == 1 {
    stock::watch(tx, &book, now).await?;
  }
  milestone::watch(tx, now).await?;

  tracing::info!(
    user = %user.email,
    isbn = %book.isbn,
    purchase_id = %purchase.id,
    "purchase recorded"
  );
  Ok(Ok(PurchaseOutcome { purchase, is_existing: false }))
}

/// Sell one copy of `isbn` to the caller. Business rejections surface as
/// errors; transport-level deduplication is [`buy_cached`]'s job.
pub async fn buy(
  store: &PgStore,
  ctx: &RequestContext,
  isbn: &str,
) -> Result<PurchaseOutcome> {
  let now = Utc::now();
  let mut conn = store.acquire().await?;
  let tx = store.begin(&mut conn).await?;

  tx.lock_user(&ctx.user_email).await?;
  let user = tx.upsert_user(&ctx.user_email, now).await?;

  match buy_in_tx(&tx, &user, isbn, now).await? {
    Ok(outcome) => {
      tx.commit().await?;
      Ok(outcome)
    }
    Err(rejection) => Err(rejection.into()),
  }
}

/// Buy under mandatory idempotency-key replay, all inside one serializable
/// transaction held under the caller's advisory lock.
///
/// `render` turns the buy outcome — success or business rejection — into
/// the `(status, body)` pair that is stored and replayed verbatim. Parallel
/// requests with the same key serialize on the advisory lock; the losers
/// find the winner's stored response and replay it.
pub async fn buy_cached<F>(
  store: &PgStore,
  ctx: &RequestContext,
  isbn: &str,
  render: F,
) -> Result<CachedResponse>
where
  F: FnOnce(
    std::result::Result<&PurchaseOutcome, &Domain>,
  ) -> std::result::Result<(i32, serde_json::Value), serde_json::Error>,
{
  let key = ctx
    .idempotency_key
    .as_deref()
    .ok_or(Domain::IdempotencyKeyRequired)?;
  let now = Utc::now();
  let mut conn = store.acquire().await?;
  let tx = store.begin(&mut conn).await?;

  tx.lock_user(&ctx.user_email).await?;
  let user = tx.upsert_user(&ctx.user_email, now).await?;

  if let Some(replay) =
    idempotency::consult(&tx, key, user.id, BUY_ENDPOINT, now).await?
  {
    tx.commit().await?;
    return Ok(replay);
  }

  let outcome = buy_in_tx(&tx, &user, isbn, now).await?;
  let (status_code, body) = render(outcome.as_ref())?;

  idempotency::record(
    &tx,
    key,
    user.id,
    BUY_ENDPOINT,
    status_code,
    &body,
    now,
  )
  .await?;
  tx.commit().await?;

  Ok(CachedResponse { status_code, body, replayed: false })
}

/// Cancel a purchase within the refund window.
///
/// Cancelling an already-canceled purchase replays the terminal row; the
/// refund movement exists exactly once either way thanks to its dedupe key.
pub async fn cancel(
  store: &PgStore,
  ctx: &RequestContext,
  purchase_id: Uuid,
) -> Result<PurchaseOutcome> {
  let now = Utc::now();
  let mut conn = store.acquire().await?;
  let tx = store.begin(&mut conn).await?;

  tx.lock_user(&ctx.user_email).await?;
  let user = tx
    .user_by_email(&ctx.user_email)
    .await?
    .ok_or_else(|| Domain::UserNotFound(ctx.user_email.clone()))?;

  let purchase = tx
    .purchase_for_update(purchase_id, user.id)
    .await?
    .ok_or(Domain::PurchaseNotFound(purchase_id))?;

  if purchase.is_canceled() {
    tx.commit().await?;
    return Ok(PurchaseOutcome { purchase, is_existing: true });
  }
  if !purchase.cancellable_at(now) {
    return Err(
      Domain::CancellationWindowExpired(CANCEL_WINDOW_MINUTES).into(),
    );
  }

  let purchase = tx.mark_canceled(purchase.id, now).await?;

  tx.append_movement(
    &NewMovement {
      amount_cents:   -purchase.price_cents,
      movement_type:  MovementType::CancelRefund,
      reason:         format!("Refund for purchase {}", purchase.id),
      related_entity: Some(format!("purchase:{}", purchase.id)),
      dedupe_key:     Some(keys::cancel_movement(purchase.id)),
    },
    now,
  )
  .await?;

  tx.release_copy(purchase.book_id).await?;

  tx.append_event(
    &NewEvent::new(EventType::CancelBuy, keys::cancel_event(purchase.id))
      .user(user.id)
      .book(purchase.book_id)
      .purchase(purchase.id)
      .metadata(json!({ "refundCents": purchase.price_cents })),
    now,
  )
  .await?;

  tx.commit().await?;
  tracing::info!(
    user = %user.email,
    purchase_id = %purchase.id,
    "cancellation recorded"
  );
  Ok(PurchaseOutcome { purchase, is_existing: false })
}
