//! Caller identification from request headers.
//!
//! There is no authentication beyond the identifying header; the admin
//! surface is gated on a literal email.

use axum::http::HeaderMap;
use biblio_core::{
  user::{is_valid_email, ADMIN_EMAIL},
  Error as Domain,
};

use crate::error::Result;

pub const X_USER_EMAIL: &str = "x-user-email";
pub const X_IDEMPOTENCY_KEY: &str = "x-idempotency-key";

/// Resolve the calling user from `X-User-Email`. Missing → 400
/// `USER_EMAIL_REQUIRED`; malformed → 400 `INVALID_EMAIL`.
pub fn identify(headers: &HeaderMap) -> Result<String> {
  let email = headers
    .get(X_USER_EMAIL)
    .and_then(|v| v.to_str().ok())
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .ok_or(Domain::UserEmailRequired)?;
  if !is_valid_email(email) {
    return Err(Domain::InvalidEmail(email.to_owned()).into());
  }
  Ok(email.to_owned())
}

/// Gate for `/api/admin/*`: the literal admin email, nothing else.
pub fn require_admin(headers: &HeaderMap) -> Result<()> {
  let email = identify(headers)?;
  if email != ADMIN_EMAIL {
    return Err(Domain::Forbidden.into());
  }
  Ok(())
}

/// The raw idempotency key, if the caller sent one. Whether it is required
/// is the endpoint's decision.
pub fn idempotency_key(headers: &HeaderMap) -> Option<String> {
  headers
    .get(X_IDEMPOTENCY_KEY)
    .and_then(|v| v.to_str().ok())
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_owned)
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (k, v) in pairs {
      map.insert(
        axum::http::HeaderName::from_bytes(k.as_bytes()).unwrap(),
        HeaderValue::from_str(v).unwrap(),
      );
    }
    map
  }

  #[test]
  fn missing_header_is_required_error() {
    let err = identify(&headers(&[])).unwrap_err();
    let crate::error::Error::Domain(d) = err else {
      panic!("expected domain error");
    };
    assert_eq!(d.code(), "USER_EMAIL_REQUIRED");
  }

  #[test]
  fn malformed_email_is_invalid() {
    let err =
      identify(&headers(&[(X_USER_EMAIL, "not-an-email")])).unwrap_err();
    let crate::error::Error::Domain(d) = err else {
      panic!("expected domain error");
    };
    assert_eq!(d.code(), "INVALID_EMAIL");
  }

  #[test]
  fn admin_literal_is_the_only_admin() {
    assert!(require_admin(&headers(&[(X_USER_EMAIL, ADMIN_EMAIL)])).is_ok());
    let err = require_admin(&headers(&[(
      X_USER_EMAIL,
      "someone-else@example.com",
    )]))
    .unwrap_err();
    let crate::error::Error::Domain(d) = err else {
      panic!("expected domain error");
    };
    assert_eq!(d.code(), "FORBIDDEN");
  }

  #[test]
  fn idempotency_key_is_optional_and_trimmed() {
    assert_eq!(idempotency_key(&headers(&[])), None);
    assert_eq!(
      idempotency_key(&headers(&[(X_IDEMPOTENCY_KEY, "  key-1  ")])),
      Some("key-1".to_owned())
    );
  }
}
