//! User — identified by email, auto-created on first interaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The literal email that grants access to the admin surface.
pub const ADMIN_EMAIL: &str = "admin@dummy-library.com";

/// A library patron. Rows are created lazily by the first state-changing
/// request carrying the email and are never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id:         Uuid,
  pub email:      String,
  pub created_at: DateTime<Utc>,
}

/// Minimal syntactic check applied to the identity header. Full RFC 5322
/// validation is intentionally out of scope; the store treats the string as
/// an opaque unique key.
pub fn is_valid_email(email: &str) -> bool {
  let Some((local, domain)) = email.split_once('@') else {
    return false;
  };
  !local.is_empty()
    && !domain.is_empty()
    && domain.contains('.')
    && !email.chars().any(char::is_whitespace)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn accepts_plain_addresses() {
    assert!(is_valid_email("alice@example.com"));
    assert!(is_valid_email(ADMIN_EMAIL));
  }

  #[test]
  fn rejects_malformed_addresses() {
    assert!(!is_valid_email(""));
    assert!(!is_valid_email("alice"));
    assert!(!is_valid_email("alice@"));
    assert!(!is_valid_email("@example.com"));
    assert!(!is_valid_email("alice@nodot"));
    assert!(!is_valid_email("alice smith@example.com"));
  }
}
