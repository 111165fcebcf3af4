//! Pagination types for list endpoints.
//!
//! Offset pagination for histories, cursor pagination for the reward catalog.

use serde::{Deserialize, Serialize};

/// Query parameters for paginated list endpoints.
#[derive(Debug, Deserialize, Default)]
pub struct PaginationQuery {
    /// Maximum number of items to return (default: 50, max: 100)
    #[serde(default)]
    pub limit: Option<i64>,
    /// Number of items to skip (default: 0)
    #[serde(default)]
    pub offset: Option<i64>,
}

impl PaginationQuery {
    /// Get the limit, clamped to valid range
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(50).clamp(1, 100)
    }

    /// Get the offset, minimum 0
    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

/// Paginated response wrapper for list endpoints.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    /// Total number of items (across all pages)
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: i64, limit: i64, offset: i64) -> Self {
        Self {
            items,
            total,
            limit,
            offset,
        }
    }
}

pub const CURSOR_DEFAULT_LIMIT: i64 = 20;
pub const CURSOR_MAX_LIMIT: i64 = 50;

/// Clamp a requested cursor page size to 1..=50 (default 20).
pub fn cursor_limit(requested: Option<i64>) -> i64 {
    requested
        .unwrap_or(CURSOR_DEFAULT_LIMIT)
        .clamp(1, CURSOR_MAX_LIMIT)
}

/// One page of an id-ordered listing.
#[derive(Debug, Serialize)]
pub struct CursorPage<T> {
    pub items: Vec<T>,
    /// Pass back as `cursor` to fetch the next page; None on the last page
    pub next_cursor: Option<i64>,
    pub limit: i64,
}

impl<T> CursorPage<T> {
    /// A full page means there may be more, so its last id becomes the cursor.
    pub fn new(items: Vec<T>, limit: i64, id_of: impl Fn(&T) -> i64) -> Self {
        let next_cursor = if items.len() as i64 == limit {
            items.last().map(id_of)
        } else {
            None
        };
        Self {
            items,
            next_cursor,
            limit,
        }
    }
}
