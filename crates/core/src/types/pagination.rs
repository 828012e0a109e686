//! Page arithmetic for list endpoints.

use serde::Serialize;

/// Pagination metadata returned next to a page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_count: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    /// Largest page size a caller may request.
    pub const MAX_LIMIT: u32 = 100;

    /// Build pagination metadata. `page` and `limit` are clamped to at least 1.
    #[must_use]
    pub fn new(page: u32, limit: u32, total_count: u64) -> Self {
        let page = page.max(1);
        let limit = u64::from(limit.clamp(1, Self::MAX_LIMIT));
        let total_pages = u32::try_from(total_count.div_ceil(limit)).unwrap_or(u32::MAX);

        Self {
            current_page: page,
            total_pages,
            total_count,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }

    /// Row offset for a page, after clamping.
    #[must_use]
    pub fn offset(page: u32, limit: u32) -> i64 {
        let page = i64::from(page.max(1));
        let limit = i64::from(limit.clamp(1, Self::MAX_LIMIT));
        (page - 1) * limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_middle_page() {
        let p = Pagination::new(2, 10, 35);
        assert_eq!(p.total_pages, 4);
        assert!(p.has_next);
        assert!(p.has_prev);
    }

    #[test]
    fn test_empty_result() {
        let p = Pagination::new(1, 10, 0);
        assert_eq!(p.total_pages, 0);
        assert!(!p.has_next);
        assert!(!p.has_prev);
    }

    #[test]
    fn test_offset_clamps_page_zero() {
        assert_eq!(Pagination::offset(0, 10), 0);
        assert_eq!(Pagination::offset(3, 10), 20);
    }
}
