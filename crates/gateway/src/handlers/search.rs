//! Catalog search across papers and datasets

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::page_params;
use crate::AppState;
use scholarhub_common::{
    db::models::{Dataset, Paper},
    errors::{AppError, Result},
    metrics,
    pagination::total_pages,
};

const SEARCH_PAGE_SIZE: u64 = 10;
const MIN_QUERY_CHARS: usize = 2;
const SNIPPET_CHARS: usize = 200;
const MAX_LISTED_AUTHORS: usize = 3;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub q: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct PaperHit {
    pub id: Uuid,
    pub title: String,
    pub authors: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub year: i32,
    pub venue: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DatasetHit {
    pub id: Uuid,
    pub name: String,
    pub abbreviation: String,
    pub description: String,
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPagination {
    pub page: u64,
    pub page_size: u64,
    pub total_papers: u64,
    pub total_datasets: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub papers: Vec<PaperHit>,
    pub datasets: Vec<DatasetHit>,
    pub pagination: SearchPagination,
}

/// First three authors, then "et al."
fn author_line(authors: &[String]) -> String {
    let shown = authors
        .iter()
        .take(MAX_LISTED_AUTHORS)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if authors.len() > MAX_LISTED_AUTHORS {
        format!("{} et al.", shown)
    } else {
        shown
    }
}

/// Cut to `limit` characters on a char boundary, marking the cut with "..."
fn snippet(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

impl From<Paper> for PaperHit {
    fn from(paper: Paper) -> Self {
        Self {
            id: paper.id,
            title: paper.title,
            authors: author_line(&paper.authors),
            abstract_text: snippet(&paper.abstract_text, SNIPPET_CHARS),
            year: paper.year,
            venue: paper.venue_name,
            keywords: paper.keywords.into_inner(),
        }
    }
}

impl From<Dataset> for DatasetHit {
    fn from(dataset: Dataset) -> Self {
        Self {
            id: dataset.id,
            name: dataset.name,
            abbreviation: dataset.abbreviation,
            description: snippet(&dataset.description, SNIPPET_CHARS),
            category: dataset.category,
        }
    }
}

fn validate_query(q: Option<&str>) -> Result<String> {
    let q = q.map(str::trim).unwrap_or_default();
    if q.chars().count() < MIN_QUERY_CHARS {
        return Err(AppError::invalid_field(
            "q",
            format!("Search query must be at least {} characters", MIN_QUERY_CHARS),
        ));
    }
    Ok(q.to_string())
}

pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>> {
    let q = validate_query(query.q.as_deref())?;
    let page = page_params(&state, query.page, query.page_size, SEARCH_PAGE_SIZE)?;
    let repo = state.repo();

    let (papers, total_papers) = repo.search_papers(&q, page).await?;
    let (datasets, total_datasets) = repo.search_datasets(&q, page).await?;

    metrics::record_search(total_papers, total_datasets);
    tracing::debug!(query = %q, total_papers, total_datasets, "Search executed");

    Ok(Json(SearchResponse {
        query: q,
        papers: papers.into_iter().map(PaperHit::from).collect(),
        datasets: datasets.into_iter().map(DatasetHit::from).collect(),
        pagination: SearchPagination {
            page: page.page,
            page_size: page.page_size,
            total_papers,
            total_datasets,
            total_items: total_papers + total_datasets,
            total_pages: total_pages(total_papers, page.page_size)
                .max(total_pages(total_datasets, page.page_size)),
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_author_line() {
        let authors: Vec<String> = ["A", "B", "C", "D"].iter().map(|s| s.to_string()).collect();
        assert_eq!(author_line(&authors), "A, B, C et al.");
        assert_eq!(author_line(&authors[..2]), "A, B");
        assert_eq!(author_line(&[]), "");
    }

    #[test]
    fn test_snippet_respects_char_boundaries() {
        assert_eq!(snippet("short", 200), "short");
        let long = "é".repeat(250);
        let cut = snippet(&long, 200);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), 203);
    }

    #[test]
    fn test_query_length() {
        assert!(validate_query(None).is_err());
        assert!(validate_query(Some("  a ")).is_err());
        assert_eq!(validate_query(Some(" gan ")).unwrap(), "gan");
    }
}
