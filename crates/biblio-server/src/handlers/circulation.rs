//! Handlers for borrow and return.

use axum::{
  extract::{Path, State},
  http::HeaderMap,
  Json,
};
use biblio_engine::{borrow, RequestContext};

use crate::{auth, dto::BorrowResponse, error::Result, AppState};

/// `POST /api/books/{isbn}/borrow`
pub async fn borrow_book(
  State(state): State<AppState>,
  Path(isbn): Path<String>,
  headers: HeaderMap,
) -> Result<Json<BorrowResponse>> {
  let ctx = RequestContext::new(auth::identify(&headers)?);
  let outcome = borrow::borrow(&state.store, &ctx, &isbn).await?;
  Ok(Json(outcome.into()))
}

/// `POST /api/books/{isbn}/return`
pub async fn return_book(
  State(state): State<AppState>,
  Path(isbn): Path<String>,
  headers: HeaderMap,
) -> Result<Json<BorrowResponse>> {
  let ctx = RequestContext::new(auth::identify(&headers)?);
  let outcome = borrow::return_book(&state.store, &ctx, &isbn).await?;
  Ok(Json(outcome.into()))
}
