//! Admin read surface — wallet, movements, jobs, emails, events.
//!
//! Every handler is gated on the literal admin email. These are plain
//! paginated reads; nothing here mutates state.

use axum::{
  extract::{Query, State},
  http::HeaderMap,
  Json,
};
use biblio_core::{
  email::SimulatedEmail,
  event::Event,
  job::{Job, JobStatus},
  page::{PageRequest, Paginated},
  wallet::{MovementDirection, MovementQuery, WALLET_ID},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::{
  auth,
  dto::{map_page, MovementDto, PageParams, WalletDto},
  error::Result,
  AppState,
};

/// `GET /api/admin/wallet` — the derived balance and milestone flag.
pub async fn wallet(
  State(state): State<AppState>,
  headers: HeaderMap,
) -> Result<Json<WalletDto>> {
  auth::require_admin(&headers)?;
  let mut conn = state.store.acquire().await?;
  let tx = state.store.begin(&mut conn).await?;
  let wallet = tx.wallet().await?;
  let balance = tx.balance().await?;
  tx.commit().await?;
  Ok(Json(WalletDto {
    id:                WALLET_ID.to_owned(),
    balance_cents:     balance,
    balance_formatted: biblio_core::money::format_cents(balance),
    milestone_reached: wallet.milestone_reached,
  }))
}

// Pagination fields are inlined rather than flattened: axum's `Query`
// deserializer cannot route numeric values through `#[serde(flatten)]`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementParams {
  /// `credit` or `debit`.
  #[serde(rename = "type")]
  pub direction: Option<MovementDirection>,
  pub from:      Option<DateTime<Utc>>,
  pub to:        Option<DateTime<Utc>>,
  pub page:      Option<i64>,
  pub page_size: Option<i64>,
}

/// `GET /api/admin/wallet/movements` — the ledger, newest first.
pub async fn movements(
  State(state): State<AppState>,
  headers: HeaderMap,
  Query(params): Query<MovementParams>,
) -> Result<Json<Paginated<MovementDto>>> {
  auth::require_admin(&headers)?;
  let query = MovementQuery {
    direction: params.direction,
    from:      params.from,
    to:        params.to,
  };
  let request = PageRequest::clamped(params.page, params.page_size);
  let mut conn = state.store.acquire().await?;
  let tx = state.store.begin(&mut conn).await?;
  let page = tx.list_movements(&query, request).await?;
  tx.commit().await?;
  Ok(Json(map_page(page)))
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobParams {
  pub status:    Option<JobStatus>,
  pub page:      Option<i64>,
  pub page_size: Option<i64>,
}

/// `GET /api/admin/jobs` — job rows, newest first, optional status filter.
pub async fn jobs(
  State(state): State<AppState>,
  headers: HeaderMap,
  Query(params): Query<JobParams>,
) -> Result<Json<Paginated<Job>>> {
  auth::require_admin(&headers)?;
  let request = PageRequest::clamped(params.page, params.page_size);
  let mut conn = state.store.acquire().await?;
  let tx = state.store.begin(&mut conn).await?;
  let page = tx.list_jobs(params.status, request).await?;
  tx.commit().await?;
  Ok(Json(page))
}

/// `GET /api/admin/emails` — the simulated outbox, newest first.
pub async fn emails(
  State(state): State<AppState>,
  headers: HeaderMap,
  Query(params): Query<PageParams>,
) -> Result<Json<Paginated<SimulatedEmail>>> {
  auth::require_admin(&headers)?;
  let mut conn = state.store.acquire().await?;
  let tx = state.store.begin(&mut conn).await?;
  let page = tx.list_emails(params.request()).await?;
  tx.commit().await?;
  Ok(Json(page))
}

/// `GET /api/admin/events` — the audit log, newest first.
pub async fn events(
  State(state): State<AppState>,
  headers: HeaderMap,
  Query(params): Query<PageParams>,
) -> Result<Json<Paginated<Event>>> {
  auth::require_admin(&headers)?;
  let mut conn = state.store.acquire().await?;
  let tx = state.store.begin(&mut conn).await?;
  let page = tx.list_events(params.request()).await?;
  tx.commit().await?;
  Ok(Json(page))
}
