//! # Pagination
//!
//! Page numbers are 1-based. A `limit` above [`MAX_LIMIT`] is clamped to it,
//! not refused. `total_pages` is `ceil(total / limit)` and is zero for an
//! empty collection.

use crate::error::ValidationError;

/// Page returned when the caller does not ask for one.
pub const DEFAULT_PAGE: u32 = 1;

/// Page size used when the caller does not ask for one.
pub const DEFAULT_LIMIT: u32 = 5;

/// Largest page size ever served.
pub const MAX_LIMIT: u32 = 100;

/// Validated pagination request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// Apply defaults, range checks and the page size cap to raw query
    /// parameters.
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Result<Self, ValidationError> {
        let page = page.unwrap_or(DEFAULT_PAGE);
        let limit = limit.unwrap_or(DEFAULT_LIMIT);
        if page == 0 {
            return Err(ValidationError::PageOutOfRange {
                param: "page",
                max: u32::MAX,
            });
        }
        if limit == 0 {
            return Err(ValidationError::PageOutOfRange {
                param: "limit",
                max: MAX_LIMIT,
            });
        }
        Ok(Self {
            page,
            limit: limit.min(MAX_LIMIT),
        })
    }

    /// 1-based page number.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Page size.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of items preceding this page.
    pub fn skip(&self) -> usize {
        (self.page as usize - 1).saturating_mul(self.limit as usize)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// One page of results plus the figures needed to navigate the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items on this page, newest first.
    pub items: Vec<T>,
    /// The request that produced this page.
    pub request: PageRequest,
    /// Size of the whole collection.
    pub total: usize,
}

impl<T> Page<T> {
    /// `ceil(total / limit)`.
    pub fn total_pages(&self) -> usize {
        self.total.div_ceil(self.request.limit as usize)
    }

    /// Transform every item, keeping the page figures.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            request: self.request,
            total: self.total,
        }
    }
}
