//! Postgres store for Biblio.
//!
//! Owns the schema, the connection pool, and every SQL statement in the
//! system. Higher layers compose the typed queries on [`Tx`] inside one
//! serializable transaction per operation; no SQL leaks upward.

pub mod error;
pub mod row;
pub mod schema;
pub mod store;
pub mod tx;

pub use error::{Error, Result};
pub use store::PgStore;
pub use tx::Tx;
