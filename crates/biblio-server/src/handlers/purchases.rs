//! Handlers for buy and cancel.
//!
//! Buy is the one endpoint where the idempotency key is mandatory. The
//! engine runs the whole operation — cache consult, purchase, cache record
//! — in a single transaction, and business-rule rejections are stored
//! alongside successes so a retried key sees the same answer.

use axum::{
  extract::{Path, State},
  http::{HeaderMap, StatusCode},
  response::{IntoResponse, Response},
  Json,
};
use biblio_core::Error as Domain;
use biblio_engine::{purchase, RequestContext};
use uuid::Uuid;

use crate::{
  auth,
  dto::PurchaseResponse,
  error::{domain_status, error_body, Error, Result},
  AppState,
};

/// `POST /api/books/{isbn}/buy`
pub async fn buy(
  State(state): State<AppState>,
  Path(isbn): Path<String>,
  headers: HeaderMap,
) -> Result<Response> {
  let email = auth::identify(&headers)?;
  let key = auth::idempotency_key(&headers)
    .ok_or(Domain::IdempotencyKeyRequired)?;
  let ctx = RequestContext::new(email).with_idempotency_key(key);

  let cached = purchase::buy_cached(&state.store, &ctx, &isbn, |outcome| {
    match outcome {
      Ok(fresh) => {
        let body =
          serde_json::to_value(PurchaseResponse::from(fresh.clone()))?;
        Ok((StatusCode::OK.as_u16() as i32, body))
      }
      // Business rejections are cacheable responses, not failures.
      Err(rejection) => Ok((
        domain_status(rejection).as_u16() as i32,
        error_body(rejection.code(), &rejection.to_string()),
      )),
    }
  })
  .await
  .map_err(Error::from)?;

  let status = StatusCode::from_u16(cached.status_code as u16)
    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
  Ok((status, Json(cached.body)).into_response())
}

/// `POST /api/purchases/{id}/cancel`
pub async fn cancel(
  State(state): State<AppState>,
  Path(id): Path<Uuid>,
  headers: HeaderMap,
) -> Result<Json<PurchaseResponse>> {
  let ctx = RequestContext::new(auth::identify(&headers)?);
  let outcome = purchase::cancel(&state.store, &ctx, id).await?;
  Ok(Json(outcome.into()))
}
