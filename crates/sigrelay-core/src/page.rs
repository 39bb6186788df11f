//! Offset/limit paging over newest-first listings.

use serde::{Deserialize, Serialize};

/// Default page number.
pub const DEFAULT_PAGE: u32 = 1;

/// Default number of rows per page and for fixed-limit listings.
pub const DEFAULT_LIMIT: u32 = 100;

/// A validated page request. Both fields are always >= 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// Build a page request, replacing zero values with the defaults.
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: if page == 0 { DEFAULT_PAGE } else { page },
            limit: if limit == 0 { DEFAULT_LIMIT } else { limit },
        }
    }

    /// Parse raw query-string values. Anything that is not a positive
    /// integer falls back to the default rather than erroring.
    pub fn from_raw(page: Option<&str>, limit: Option<&str>) -> Self {
        Self::new(parse_positive(page, DEFAULT_PAGE), parse_positive(limit, DEFAULT_LIMIT))
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of rows to skip.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }

    /// Clamp the limit to an optional server-side maximum.
    pub fn capped(self, max_limit: Option<u32>) -> Self {
        match max_limit {
            Some(max) if max > 0 && self.limit > max => Self::new(self.page, max),
            _ => self,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE, DEFAULT_LIMIT)
    }
}

fn parse_positive(raw: Option<&str>, default: u32) -> u32 {
    raw.and_then(|s| s.trim().parse::<u32>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

/// Paging metadata returned alongside a page of rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub total: u64,
    pub page: u32,
    /// `ceil(total / limit)`.
    pub pages: u64,
}

impl Pagination {
    pub fn new(total: u64, request: PageRequest) -> Self {
        Self {
            total,
            page: request.page(),
            pages: total.div_ceil(u64::from(request.limit())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_values_fall_back_to_defaults() {
        let req = PageRequest::from_raw(Some("abc"), Some("-5"));
        assert_eq!(req.page(), 1);
        assert_eq!(req.limit(), 100);

        let req = PageRequest::from_raw(Some("0"), Some("0"));
        assert_eq!(req, PageRequest::default());

        let req = PageRequest::from_raw(None, Some("2.5"));
        assert_eq!(req.limit(), 100);
    }

    #[test]
    fn test_offset() {
        assert_eq!(PageRequest::new(1, 10).offset(), 0);
        assert_eq!(PageRequest::new(3, 10).offset(), 20);
    }

    #[test]
    fn test_pages_is_ceiling() {
        assert_eq!(Pagination::new(0, PageRequest::new(1, 10)).pages, 0);
        assert_eq!(Pagination::new(10, PageRequest::new(1, 10)).pages, 1);
        assert_eq!(Pagination::new(11, PageRequest::new(1, 10)).pages, 2);
        assert_eq!(Pagination::new(250, PageRequest::default()).pages, 3);
    }

    #[test]
    fn test_capped() {
        assert_eq!(PageRequest::new(2, 500).capped(Some(100)).limit(), 100);
        assert_eq!(PageRequest::new(2, 50).capped(Some(100)).limit(), 50);
        assert_eq!(PageRequest::new(2, 500).capped(None).limit(), 500);
    }
}
