//! Pagination types.
//!
//! Pages are 1-indexed everywhere in this workspace.

use serde::{Deserialize, Serialize};

/// One page of results as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    /// Items on the current page (`data.len() <= page_size`).
    pub data: Vec<T>,
    /// Total number of items across all pages.
    pub total: u64,
    /// Current page number (1-indexed).
    pub page: u32,
    /// Maximum number of items per page.
    pub page_size: u32,
    /// Total number of pages.
    pub total_pages: u32,
}

impl<T> PaginatedResponse<T> {
    /// Navigation state for this page.
    #[must_use]
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.total_pages)
    }
}

/// Query for a single page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    /// Create a page request. Zero values are raised to 1.
    #[must_use]
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }

    /// Requested page (1-indexed).
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Requested page size.
    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }
}

/// Previous/next navigation bounded by the first page and the last known
/// page count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    current_page: u32,
    total_pages: u32,
}

impl Pagination {
    /// Create navigation state. A zero page count is treated as one page.
    #[must_use]
    pub fn new(current_page: u32, total_pages: u32) -> Self {
        Self {
            current_page: current_page.max(1),
            total_pages: total_pages.max(1),
        }
    }

    #[must_use]
    pub const fn current_page(&self) -> u32 {
        self.current_page
    }

    #[must_use]
    pub const fn total_pages(&self) -> u32 {
        self.total_pages
    }

    /// Whether a previous page exists.
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    /// Whether a next page exists.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    /// The previous page number, if any.
    #[must_use]
    pub const fn previous_page(&self) -> Option<u32> {
        if self.has_previous() {
            Some(self.current_page - 1)
        } else {
            None
        }
    }

    /// The next page number, if any.
    #[must_use]
    pub const fn next_page(&self) -> Option<u32> {
        if self.has_next() {
            Some(self.current_page + 1)
        } else {
            None
        }
    }
}
