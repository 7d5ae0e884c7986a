//! Seed path — load the catalogue and the opening wallet float.
//!
//! Safe to re-run: books insert only if their ISBN is absent, and the
//! opening float carries a fixed dedupe key so it appends at most once.

use std::path::Path;

use biblio_core::{
  book::NewBook,
  keys,
  wallet::{MovementType, NewMovement},
};
use biblio_store_postgres::PgStore;
use chrono::Utc;
use serde::Deserialize;

use crate::error::{Error, Result};

/// On-disk seed format.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedFile {
  pub books: Vec<NewBook>,
  /// Opening balance in cents; appended once as `INITIAL_BALANCE`.
  #[serde(default)]
  pub opening_float_cents: Option<i64>,
}

/// Apply a seed file. Returns how many books were newly inserted.
pub async fn apply(store: &PgStore, path: &Path) -> Result<usize> {
  let raw = std::fs::read_to_string(path)
    .map_err(|e| Error::Internal(Box::new(e)))?;
  let seed: SeedFile =
    serde_json::from_str(&raw).map_err(|e| Error::Internal(Box::new(e)))?;

  let now = Utc::now();
  let mut conn = store.acquire().await?;
  let tx = store.begin(&mut conn).await?;

  let mut inserted = 0;
  for book in &seed.books {
    if tx.insert_book_if_absent(book, now).await?.is_some() {
      inserted += 1;
    }
  }

  if let Some(float_cents) = seed.opening_float_cents {
    tx.append_movement(
      &NewMovement {
        amount_cents:   float_cents,
        movement_type:  MovementType::InitialBalance,
        reason:         "Opening float".to_owned(),
        related_entity: None,
        dedupe_key:     Some(keys::INITIAL_BALANCE_KEY.to_owned()),
      },
      now,
    )
    .await?;
  }

  tx.commit().await?;
  tracing::info!(
    books = seed.books.len(),
    inserted,
    "seed applied"
  );
  Ok(inserted)
}
