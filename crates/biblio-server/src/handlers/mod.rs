//! HTTP handlers, one module per resource.

pub mod admin;
pub mod books;
pub mod circulation;
pub mod purchases;
