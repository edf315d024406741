//! Page/pageSize handling shared by every list endpoint

use crate::errors::{AppError, Result};
use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Validated, 1-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: u64,
    pub page_size: u64,
}

impl PageParams {
    /// Validate raw query values. Missing values take the defaults, a page
    /// size above `max_size` is clamped and anything below 1 is rejected.
    pub fn from_parts(
        page: Option<i64>,
        page_size: Option<i64>,
        default_size: u64,
        max_size: u64,
    ) -> Result<Self> {
        let page = page.unwrap_or(1);
        if page < 1 {
            return Err(AppError::invalid_field("page", "page must be at least 1"));
        }

        let page_size = page_size.unwrap_or(default_size as i64);
        if page_size < 1 {
            return Err(AppError::invalid_field("pageSize", "pageSize must be at least 1"));
        }

        Ok(Self {
            page: page as u64,
            page_size: (page_size as u64).min(max_size.max(1)),
        })
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    /// 0-based page index as used by SeaORM's paginator, `None` when the
    /// row offset would not fit a Postgres `BIGINT`
    pub fn index(&self) -> Option<u64> {
        let index = self.page - 1;
        index
            .checked_mul(self.page_size)
            .filter(|offset| *offset <= i64::MAX as u64)
            .map(|_| index)
    }

    pub fn describe(&self, total_items: u64) -> Pagination {
        Pagination {
            page: self.page,
            page_size: self.page_size,
            total_items,
            total_pages: total_pages(total_items, self.page_size),
        }
    }
}

/// Number of pages for `total_items`; an empty listing still has one page
pub fn total_pages(total_items: u64, page_size: u64) -> u64 {
    if page_size == 0 {
        return 1;
    }
    total_items.div_ceil(page_size).max(1)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u64,
    pub page_size: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub results: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Paginated<T> {
    pub fn new(results: Vec<T>, params: PageParams, total_items: u64) -> Self {
        Self {
            results,
            pagination: params.describe(total_items),
        }
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Paginated<U> {
        Paginated {
            results: self.results.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

/// Slice an in-memory listing the same way the database paginator would
pub fn paginate_vec<T>(items: Vec<T>, params: PageParams) -> Paginated<T> {
    let total = items.len() as u64;
    let results = items
        .into_iter()
        .skip(params.offset() as usize)
        .take(params.page_size as usize)
        .collect();
    Paginated::new(results, params, total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = PageParams::from_parts(None, None, DEFAULT_PAGE_SIZE, 100).unwrap();
        assert_eq!(params, PageParams { page: 1, page_size: 20 });
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn test_bounds() {
        assert!(PageParams::from_parts(Some(0), None, 20, 100).is_err());
        assert!(PageParams::from_parts(Some(1), Some(0), 20, 100).is_err());
        assert!(PageParams::from_parts(Some(-3), None, 20, 100).is_err());

        let clamped = PageParams::from_parts(Some(2), Some(500), 20, 100).unwrap();
        assert_eq!(clamped.page_size, 100);
        assert_eq!(clamped.offset(), 100);
        assert_eq!(clamped.index(), Some(1));
    }

    #[test]
    fn test_far_pages_have_no_index() {
        let last = PageParams::from_parts(Some(i64::MAX), Some(20), 20, 100).unwrap();
        assert_eq!(last.index(), None);
        assert_eq!(last.offset(), u64::MAX);
        assert_eq!(last.describe(3).page, i64::MAX as u64);

        let single = PageParams::from_parts(Some(i64::MAX), Some(1), 20, 100).unwrap();
        assert_eq!(single.index(), Some(i64::MAX as u64 - 1));
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 20), 1);
        assert_eq!(total_pages(20, 20), 1);
        assert_eq!(total_pages(21, 20), 2);
        assert_eq!(total_pages(5, 0), 1);
    }

    #[test]
    fn test_page_past_end_is_empty() {
        let params = PageParams::from_parts(Some(4), Some(2), 20, 100).unwrap();
        let page = paginate_vec(vec![1, 2, 3, 4, 5], params);
        assert!(page.results.is_empty());
        assert_eq!(page.pagination.total_items, 5);
        assert_eq!(page.pagination.total_pages, 3);
    }

    #[test]
    fn test_serialized_keys_are_camel_case() {
        let params = PageParams::from_parts(Some(1), Some(2), 20, 100).unwrap();
        let page = paginate_vec(vec!["a", "b", "c"], params);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["pagination"]["pageSize"], 2);
        assert_eq!(json["pagination"]["totalPages"], 2);
        assert_eq!(json["results"], serde_json::json!(["a", "b"]));
    }
}
