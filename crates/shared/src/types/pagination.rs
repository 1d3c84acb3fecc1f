//! Pagination types for list endpoints.

use serde::{Deserialize, Serialize};

const DEFAULT_PAGE: u32 = 1;
const DEFAULT_PER_PAGE: u32 = 20;
const MAX_PER_PAGE: u32 = 100;

/// Request parameters for paginated queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number (1-indexed).
    pub page: u32,
    /// Number of items per page.
    pub per_page: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl PageRequest {
    /// Builds a request from optional query values, clamping the page to
    /// at least 1 and the page size to 1..=100.
    #[must_use]
    pub fn clamped(page: Option<u32>, per_page: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(DEFAULT_PAGE).max(1),
            per_page: per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE),
        }
    }

    /// The offset for database queries.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page)
    }

    /// The limit for database queries.
    #[must_use]
    pub fn limit(&self) -> u64 {
        u64::from(self.per_page)
    }
}

/// Response wrapper for paginated data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    /// The items in the current page.
    pub data: Vec<T>,
    /// Pagination metadata.
    pub meta: PageMeta,
}

/// Pagination metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageMeta {
    /// Current page number.
    pub page: u32,
    /// Items per page.
    pub per_page: u32,
    /// Total number of items across all pages.
    pub total: u64,
    /// Total number of pages.
    pub total_pages: u32,
}

impl<T> PageResponse<T> {
    /// Wraps one page of items with its metadata.
    #[must_use]
    pub fn new(data: Vec<T>, page: u32, per_page: u32, total: u64) -> Self {
        let total_pages = if total == 0 {
            1
        } else {
            u32::try_from(total.div_ceil(u64::from(per_page.max(1)))).unwrap_or(u32::MAX)
        };

        Self {
            data,
            meta: PageMeta {
                page,
                per_page,
                total,
                total_pages,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_and_limit() {
        let req = PageRequest {
            page: 3,
            per_page: 20,
        };
        assert_eq!(req.offset(), 40);
        assert_eq!(req.limit(), 20);

        assert_eq!(PageRequest::default().offset(), 0);
    }

    #[test]
    fn test_clamped_bounds() {
        let req = PageRequest::clamped(None, None);
        assert_eq!(req.page, 1);
        assert_eq!(req.per_page, 20);

        let req = PageRequest::clamped(Some(0), Some(0));
        assert_eq!(req.page, 1);
        assert_eq!(req.per_page, 1);

        let req = PageRequest::clamped(Some(5), Some(1000));
        assert_eq!(req.page, 5);
        assert_eq!(req.per_page, 100);
    }

    #[test]
    fn test_page_response_total_pages() {
        let resp: PageResponse<u32> = PageResponse::new(vec![], 1, 20, 45);
        assert_eq!(resp.meta.total_pages, 3);

        let resp: PageResponse<u32> = PageResponse::new(vec![], 1, 20, 0);
        assert_eq!(resp.meta.total_pages, 1);

        let resp: PageResponse<u32> = PageResponse::new(vec![], 1, 20, 40);
        assert_eq!(resp.meta.total_pages, 2);
    }
}
