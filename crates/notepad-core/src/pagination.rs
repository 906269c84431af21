//! Page requests and paged results.

use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;
/// Highest page number whose offset still fits a signed 64-bit SQL `OFFSET`.
pub const MAX_PAGE: u64 = i64::MAX as u64 / MAX_PAGE_SIZE;

/// A 1-based page request with a clamped page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub page_size: u64,
}

impl PageRequest {
    pub fn new(page: Option<u64>, page_size: Option<u64>) -> Self {
        Self {
            page: page.unwrap_or(1).clamp(1, MAX_PAGE),
            page_size: page_size
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Zero-based page index.
    pub fn index(&self) -> u64 {
        self.page - 1
    }

    pub fn offset(&self) -> u64 {
        self.index().saturating_mul(self.page_size)
    }

    /// Exclusive end of the page's item range.
    pub fn end(&self) -> u64 {
        self.offset().saturating_add(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of results plus totals.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub page_size: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total_items: u64) -> Self {
        Self {
            items,
            page: request.page,
            page_size: request.page_size,
            total_items,
            total_pages: total_items.div_ceil(request.page_size),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}
