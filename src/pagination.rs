//! This modules defines the common functionality for paging through lists of data.

/// The maximum number of items returned by a listing when no valid limit is given.
pub const DEFAULT_PAGE_LIMIT: i64 = 100;

/// The config for pagination.
#[derive(Debug, Clone, PartialEq)]
pub struct PaginationConfig {
    /// The number of items to return when a request does not specify a valid limit.
    ///
    /// This is also the largest limit a request may ask for.
    pub default_limit: i64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

/// A window into a listing, with the limit and offset already clamped to valid values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    limit: i64,
    offset: i64,
}

impl Page {
    /// Create a page from client supplied values.
    ///
    /// A `limit` that is zero or negative falls back to `max_limit`, and a
    /// `limit` above `max_limit` is capped to it. A negative `offset` is treated as zero.
    pub fn new(limit: i64, offset: i64, max_limit: i64) -> Self {
        let max_limit = max_limit.max(1);
        let limit = if limit <= 0 {
            max_limit
        } else {
            limit.min(max_limit)
        };

        Self {
            limit,
            offset: offset.max(0),
        }
    }

    /// The maximum number of items in the page.
    pub fn limit(&self) -> i64 {
        self.limit
    }

    /// The number of items to skip before the page starts.
    pub fn offset(&self) -> i64 {
        self.offset
    }
}

/// Parse a pagination query parameter, ignoring values that are missing or not integers.
pub fn parse_or_default(raw_value: Option<&str>, default: i64) -> i64 {
    raw_value
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use crate::pagination::{DEFAULT_PAGE_LIMIT, Page, PaginationConfig, parse_or_default};

    #[test]
    fn non_positive_limit_falls_back_to_max() {
        assert_eq!(Page::new(0, 0, 100).limit(), 100);
        assert_eq!(Page::new(-5, 0, 100).limit(), 100);
    }

    #[test]
    fn limit_is_capped() {
        assert_eq!(Page::new(1000, 0, 100).limit(), 100);
        assert_eq!(Page::new(20, 0, 100).limit(), 20);
    }

    #[test]
    fn negative_offset_is_zero() {
        assert_eq!(Page::new(10, -3, 100).offset(), 0);
        assert_eq!(Page::new(10, 7, 100).offset(), 7);
    }

    #[test]
    fn invalid_numbers_use_default() {
        assert_eq!(parse_or_default(Some("abc"), 0), 0);
        assert_eq!(parse_or_default(Some(""), 0), 0);
        assert_eq!(parse_or_default(None, 5), 5);
        assert_eq!(parse_or_default(Some(" 12 "), 0), 12);
    }

    #[test]
    fn default_config_uses_fixed_cap() {
        assert_eq!(PaginationConfig::default().default_limit, DEFAULT_PAGE_LIMIT);
    }
}
