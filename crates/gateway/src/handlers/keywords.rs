//! Distinct keyword listing

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use std::collections::BTreeSet;

use super::{non_blank, page_params};
use crate::AppState;
use scholarhub_common::{
    db::models::StringList,
    errors::Result,
    pagination::{paginate_vec, Paginated},
};

const KEYWORD_PAGE_SIZE: u64 = 50;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordQuery {
    pub search: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// Sorted distinct keywords, optionally filtered by a case-insensitive substring
fn distinct_keywords(lists: Vec<StringList>, search: Option<&str>) -> Vec<String> {
    let needle = search.map(str::to_lowercase);
    lists
        .into_iter()
        .flat_map(StringList::into_inner)
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .filter(|k| needle.as_ref().map_or(true, |n| k.to_lowercase().contains(n)))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub async fn list_keywords(
    State(state): State<AppState>,
    Query(query): Query<KeywordQuery>,
) -> Result<Json<Paginated<String>>> {
    let page = page_params(&state, query.page, query.page_size, KEYWORD_PAGE_SIZE)?;
    let lists = state.repo().all_keyword_lists().await?;
    let keywords = distinct_keywords(lists, non_blank(query.search.as_deref()));
    Ok(Json(paginate_vec(keywords, page)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> StringList {
        StringList(items.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_distinct_sorted() {
        let lists = vec![list(&["vision", "nlp"]), list(&["nlp", "graphs"])];
        assert_eq!(distinct_keywords(lists, None), vec!["graphs", "nlp", "vision"]);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let lists = vec![list(&["Computer Vision", "NLP", "vision transformers"])];
        assert_eq!(
            distinct_keywords(lists, Some("VISION")),
            vec!["Computer Vision", "vision transformers"]
        );
    }
}
