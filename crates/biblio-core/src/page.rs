//! Pagination request/response types shared by store queries and DTOs.

use serde::{Deserialize, Serialize};

/// Smallest and largest accepted page sizes.
pub const MIN_PAGE_SIZE: i64 = 1;
pub const MAX_PAGE_SIZE: i64 = 100;
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// A validated page request. Construct with [`PageRequest::clamped`] so the
/// bounds hold by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
  page:      i64,
  page_size: i64,
}

impl PageRequest {
  /// Clamp raw query parameters into range: `page >= 1` (default 1),
  /// `page_size in [1, 100]` (default 10).
  pub fn clamped(page: Option<i64>, page_size: Option<i64>) -> Self {
    Self {
      page:      page.unwrap_or(1).max(1),
      page_size: page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE),
    }
  }

  pub fn page(&self) -> i64 {
    self.page
  }

  pub fn limit(&self) -> i64 {
    self.page_size
  }

  pub fn offset(&self) -> i64 {
    (self.page - 1) * self.page_size
  }

  /// Assemble the response-side page info for a known total row count.
  pub fn info(&self, total: i64) -> PageInfo {
    PageInfo {
      total,
      page: self.page,
      page_size: self.page_size,
      total_pages: if total == 0 {
        0
      } else {
        (total + self.page_size - 1) / self.page_size
      },
    }
  }
}

impl Default for PageRequest {
  fn default() -> Self {
    Self::clamped(None, None)
  }
}

/// The `pagination` object of list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
  pub total:       i64,
  pub page:        i64,
  pub page_size:   i64,
  pub total_pages: i64,
}

/// A page of rows plus its pagination envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
  pub data:       Vec<T>,
  pub pagination: PageInfo,
}

impl<T> Paginated<T> {
  pub fn new(data: Vec<T>, request: PageRequest, total: i64) -> Self {
    Self { data, pagination: request.info(total) }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_and_clamping() {
    let p = PageRequest::clamped(None, None);
    assert_eq!((p.page(), p.limit(), p.offset()), (1, 10, 0));

    let p = PageRequest::clamped(Some(0), Some(0));
    assert_eq!((p.page(), p.limit()), (1, 1));

    let p = PageRequest::clamped(Some(-3), Some(1000));
    assert_eq!((p.page(), p.limit()), (1, 100));

    let p = PageRequest::clamped(Some(3), Some(25));
    assert_eq!(p.offset(), 50);
  }

  #[test]
  fn total_pages_rounds_up() {
    let p = PageRequest::clamped(Some(1), Some(10));
    assert_eq!(p.info(0).total_pages, 0);
    assert_eq!(p.info(1).total_pages, 1);
    assert_eq!(p.info(10).total_pages, 1);
    assert_eq!(p.info(11).total_pages, 2);
  }
}
