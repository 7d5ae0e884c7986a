//! Handler for the public catalogue listing.

use axum::{
  extract::{Query, State},
  Json,
};
use biblio_core::{
  book::BookQuery,
  page::{PageRequest, Paginated},
};
use serde::Deserialize;

use crate::{
  dto::{map_page, BookDto},
  error::Result,
  AppState,
};

// Pagination fields are inlined rather than flattened: axum's `Query`
// deserializer cannot route numeric values through `#[serde(flatten)]`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
  pub title:     Option<String>,
  pub author:    Option<String>,
  pub genre:     Option<String>,
  pub page:      Option<i64>,
  pub page_size: Option<i64>,
}

/// `GET /api/books` — paginated catalogue with optional substring filters.
pub async fn list(
  State(state): State<AppState>,
  Query(params): Query<ListParams>,
) -> Result<Json<Paginated<BookDto>>> {
  let query = BookQuery {
    title:  params.title,
    author: params.author,
    genre:  params.genre,
  };
  let request = PageRequest::clamped(params.page, params.page_size);
  let mut conn = state.store.acquire().await?;
  let tx = state.store.begin(&mut conn).await?;
  let page = tx.list_books(&query, request).await?;
  tx.commit().await?;
  Ok(Json(map_page(page)))
}
