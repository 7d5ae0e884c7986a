//! HTTP layer for Biblio.
//!
//! Exposes an axum [`Router`] over the engines and the admin read surface.
//! Handlers resolve the caller from headers, delegate to the matching
//! engine, and map outcomes through the error contract in [`error`].

pub mod auth;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod seed;

use axum::{
  routing::{get, post},
  Json, Router,
};
use biblio_store_postgres::PgStore;
use serde::Deserialize;
use serde_json::json;

pub use error::{Error, Result};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime configuration, deserialised from `config.toml` layered under the
/// `BIBLIO_` environment prefix. The bare `PORT` and `DATABASE_URL`
/// variables are honoured by the binary as overrides.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:         String,
  #[serde(default = "default_port")]
  pub port:         u16,
  #[serde(default)]
  pub database_url: Option<String>,
}

fn default_host() -> String {
  "0.0.0.0".to_owned()
}

fn default_port() -> u16 {
  3000
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self { host: default_host(), port: default_port(), database_url: None }
  }
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState {
  pub store: PgStore,
}

// ─── Router ──────────────────────────────────────────────────────────────────

async fn health() -> Json<serde_json::Value> {
  Json(json!({ "ok": true }))
}

/// Build the full application router.
pub fn router(state: AppState) -> Router {
  Router::new()
    .route("/health", get(health))
    .route("/api/books", get(handlers::books::list))
    .route(
      "/api/books/{isbn}/borrow",
      post(handlers::circulation::borrow_book),
    )
    .route(
      "/api/books/{isbn}/return",
      post(handlers::circulation::return_book),
    )
    .route("/api/books/{isbn}/buy", post(handlers::purchases::buy))
    .route("/api/purchases/{id}/cancel", post(handlers::purchases::cancel))
    .route("/api/admin/wallet", get(handlers::admin::wallet))
    .route("/api/admin/wallet/movements", get(handlers::admin::movements))
    .route("/api/admin/jobs", get(handlers::admin::jobs))
    .route("/api/admin/emails", get(handlers::admin::emails))
    .route("/api/admin/events", get(handlers::admin::events))
    .with_state(state)
}

// ─── Router tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use tower::ServiceExt as _;

  use super::*;
  use crate::auth::{X_IDEMPOTENCY_KEY, X_USER_EMAIL};

  /// State whose pool points nowhere; only header-level rejections are
  /// exercised, so no connection is ever attempted.
  fn state() -> AppState {
    AppState {
      store: PgStore::connect("postgres://biblio@localhost:5432/unused")
        .expect("pool config parses"),
    }
  }

  async fn send(
    method: &str,
    uri: &str,
    headers: Vec<(&str, &str)>,
  ) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    for (k, v) in headers {
      builder = builder.header(k, v);
    }
    let req = builder.body(Body::empty()).unwrap();
    let resp = router(state()).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    let body = if bytes.is_empty() {
      serde_json::Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
  }

  #[tokio::test]
  async fn health_answers_without_a_database() {
    let (status, body) = send("GET", "/health", vec![]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
  }

  #[tokio::test]
  async fn borrow_without_email_is_rejected() {
    let (status, body) =
      send("POST", "/api/books/some-isbn/borrow", vec![]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "USER_EMAIL_REQUIRED");
  }

  #[tokio::test]
  async fn borrow_with_malformed_email_is_rejected() {
    let (status, body) = send(
      "POST",
      "/api/books/some-isbn/borrow",
      vec![(X_USER_EMAIL, "nope")],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_EMAIL");
  }

  #[tokio::test]
  async fn buy_without_idempotency_key_is_rejected() {
    let (status, body) = send(
      "POST",
      "/api/books/some-isbn/buy",
      vec![(X_USER_EMAIL, "alice@example.com")],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "IDEMPOTENCY_KEY_REQUIRED");
  }

  #[tokio::test]
  async fn admin_surface_requires_the_admin_literal() {
    let (status, body) = send(
      "GET",
      "/api/admin/jobs",
      vec![(X_USER_EMAIL, "alice@example.com")],
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    let (status, body) = send("GET", "/api/admin/jobs", vec![]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "USER_EMAIL_REQUIRED");
  }

  #[tokio::test]
  async fn buy_header_order_checks_email_first() {
    let (status, body) = send(
      "POST",
      "/api/books/some-isbn/buy",
      vec![(X_IDEMPOTENCY_KEY, "key-1")],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "USER_EMAIL_REQUIRED");
  }
}
