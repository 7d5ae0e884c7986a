//! The milestone watcher — a one-shot check that the wallet has crossed
//! $2000, run inside every transaction that credits the ledger.

use biblio_core::{
  email::{EmailType, NewEmail, MANAGEMENT_EMAIL},
  event::{EventType, NewEvent},
  keys, money,
  wallet::MILESTONE_CENTS,
};
use biblio_store_postgres::Tx;
use chrono::{DateTime, Utc};
use serde_json::json;

use crate::Result;

/// Flip the wallet flag and notify management the first time the derived
/// balance exceeds the threshold. The flag only ever goes `false → true`,
/// and the email/event dedupe keys make the notification exactly-once even
/// across racing transactions.
pub async fn watch(tx: &Tx<'_>, now: DateTime<Utc>) -> Result<()> {
  let wallet = tx.wallet().await?;
  if wallet.milestone_reached {
    return Ok(());
  }

  let balance = tx.balance().await?;
  if balance <= MILESTONE_CENTS {
    return Ok(());
  }

  tx.set_milestone_reached().await?;

  tx.append_email(
    &NewEmail {
      recipient:  MANAGEMENT_EMAIL.to_owned(),
      subject:    "Library wallet passed $2000".to_owned(),
      body:       format!(
        "The library wallet balance is now {}.",
        money::format_cents(balance)
      ),
      email_type: EmailType::Milestone,
      dedupe_key: keys::MILESTONE_EMAIL_KEY.to_owned(),
    },
    now,
  )
  .await?;

  tx.append_event(
    &NewEvent::new(EventType::MilestoneEmail, keys::MILESTONE_EVENT_KEY)
      .metadata(json!({ "balanceCents": balance })),
    now,
  )
  .await?;

  tracing::info!(balance_cents = balance, "wallet milestone reached");
  Ok(())
}
