//! API handlers module

pub mod auth;
pub mod bookmarks;
pub mod datasets;
pub mod health;
pub mod keywords;
pub mod library;
pub mod papers;
pub mod profile;
pub mod publications;
pub mod search;
pub mod stats;
pub mod venues;

use crate::AppState;
use scholarhub_common::errors::Result;
use scholarhub_common::pagination::PageParams;

/// Validate `page`/`pageSize` against the configured maximum
pub(crate) fn page_params(
    state: &AppState,
    page: Option<i64>,
    page_size: Option<i64>,
    default_size: u64,
) -> Result<PageParams> {
    PageParams::from_parts(page, page_size, default_size, state.config.server.max_page_size)
}

/// Trimmed value, or `None` when blank
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
