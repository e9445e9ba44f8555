//! Page requests and paginated responses.
//!
//! Grids in this application count pages from zero. The remote APIs count
//! from one. [`PageRequest::query_pairs`] is the single place where the two
//! conventions meet.

use serde::{Deserialize, Serialize};

/// A request for one page of a remote listing, zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Zero-based page index.
    pub page: u32,
    /// Number of records per page.
    pub page_size: u32,
}

impl PageRequest {
    /// Default page size for grids.
    pub const DEFAULT_PAGE_SIZE: u32 = 25;
    /// Largest page size a caller may request.
    pub const MAX_PAGE_SIZE: u32 = 100;

    /// Create a page request, clamping the page size to `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page,
            page_size: page_size.clamp(1, Self::MAX_PAGE_SIZE),
        }
    }

    /// Query parameters for the remote API: `page` is 1-based.
    #[must_use]
    pub fn query_pairs(&self) -> [(&'static str, String); 2] {
        [
            ("page", self.page.saturating_add(1).to_string()),
            ("pageSize", self.page_size.to_string()),
        ]
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, Self::DEFAULT_PAGE_SIZE)
    }
}

/// One page of records as returned by a remote listing endpoint.
///
/// `page` is the remote, 1-based page number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub total: u64,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default, alias = "pageSize")]
    pub page_size: u32,
}

const fn first_page() -> u32 {
    1
}

impl<T> Page<T> {
    /// Total number of pages, given the reported total and page size.
    #[must_use]
    pub fn page_count(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.page_size))
    }

    /// Whether another page follows this one.
    #[must_use]
    pub fn has_next(&self) -> bool {
        u64::from(self.page) < self.page_count()
    }

    /// Map the records, keeping pagination metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
        }
    }
}
