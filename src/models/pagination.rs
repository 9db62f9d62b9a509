//! Page-based pagination shared by the list endpoints.

use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// A resolved page request: `page` is 1-based, `limit` is at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    /// Resolve raw query values.
    ///
    /// `page` defaults to 1 and never goes below it. `limit` defaults to
    /// [`DEFAULT_PAGE_SIZE`] and is clamped to `1..=max_limit`.
    pub fn new(page: Option<i64>, limit: Option<i64>, max_limit: i64) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, max_limit.max(1)),
        }
    }

    /// Rows to skip: `(page - 1) * limit`.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// Pagination block returned next to `data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(total: i64, request: PageRequest) -> Self {
        Self {
            total,
            page: request.page,
            limit: request.limit,
            // ceil(total / limit)
            total_pages: (total + request.limit - 1) / request.limit,
        }
    }
}

/// Envelope for list responses.
///
/// ```json
/// {
///   "data": [ ... ],
///   "pagination": { "total": 25, "page": 3, "limit": 10, "totalPages": 3 }
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

/// A page of rows plus the total row count before pagination.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}
