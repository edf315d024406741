//! Paper catalog handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{bookmarks, non_blank, page_params};
use crate::AppState;
use scholarhub_common::{
    analytics::DateRange,
    auth::AuthContext,
    db::{
        models::{Dataset, Paper, PaperCitation, StringList},
        BookmarkKind, NewPaper, PaperFilter,
    },
    errors::{AppError, Result},
    pagination::{Paginated, DEFAULT_PAGE_SIZE},
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperListQuery {
    pub search: Option<String>,
    pub year: Option<i32>,
    pub venue: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkListQuery {
    pub search: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// Request to create a new paper
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaperRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 1000, message = "Title is required"))]
    pub title: String,

    /// JSON array of author names
    #[serde(default)]
    pub authors: serde_json::Value,

    #[serde(default, rename = "abstract")]
    pub abstract_text: String,

    #[validate(range(min = 1800, max = 2100))]
    pub year: Option<i32>,

    /// Comma separated research fields
    #[serde(default)]
    pub field: String,

    #[serde(default)]
    pub keywords: Option<serde_json::Value>,

    #[serde(default)]
    pub venue: String,

    pub journal_id: Option<Uuid>,

    pub conference_id: Option<Uuid>,

    #[serde(default)]
    #[validate(range(min = 0))]
    pub citation_count: i32,

    #[serde(default)]
    pub download_url: String,

    #[serde(default)]
    pub doi: String,

    #[serde(default)]
    pub source_code_url: String,
}

impl CreatePaperRequest {
    fn into_new_paper(self, created_by: Uuid) -> Result<NewPaper> {
        self.validate()?;

        let year = self.year.ok_or_else(|| AppError::MissingField {
            field: "year".to_string(),
        })?;
        let authors = StringList::from_json("authors", &self.authors)?;
        if authors.is_empty() {
            return Err(AppError::invalid_field("authors", "at least one author is required"));
        }
        let keywords = StringList::from_optional_json("keywords", self.keywords.as_ref())?;

        Ok(NewPaper {
            title: self.title.trim().to_string(),
            authors,
            abstract_text: self.abstract_text,
            year,
            field: self.field.trim().to_string(),
            keywords,
            venue_name: self.venue.trim().to_string(),
            journal_id: self.journal_id,
            conference_id: self.conference_id,
            citation_count: self.citation_count,
            download_url: self.download_url,
            doi: self.doi,
            source_code_url: self.source_code_url,
            created_by: Some(created_by),
        })
    }
}

/// Paper with its venue, datasets and citation history
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperDetail {
    #[serde(flatten)]
    pub paper: Paper,
    pub venue_type: Option<&'static str>,
    pub venue_name: String,
    pub datasets: Vec<Dataset>,
    pub citation_history: Vec<PaperCitation>,
}

pub async fn list_papers(
    State(state): State<AppState>,
    Query(query): Query<PaperListQuery>,
) -> Result<Json<Paginated<Paper>>> {
    let page = page_params(&state, query.page, query.page_size, DEFAULT_PAGE_SIZE)?;
    let filter = PaperFilter {
        search: non_blank(query.search.as_deref()).map(str::to_string),
        year: query.year,
        venue: non_blank(query.venue.as_deref()).map(str::to_string),
        range: DateRange::lenient(query.start_date.as_deref(), query.end_date.as_deref()),
    };

    let (papers, total) = state.repo().list_papers(&filter, page).await?;
    Ok(Json(Paginated::new(papers, page, total)))
}

pub async fn create_paper(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(request): Json<CreatePaperRequest>,
) -> Result<(StatusCode, Json<Paper>)> {
    let input = request.into_new_paper(auth.user_id)?;
    let paper = state.repo().create_paper(input).await?;

    tracing::info!(
        paper_id = %paper.id,
        user_id = %auth.user_id,
        title = %paper.title,
        "Paper created"
    );

    Ok((StatusCode::CREATED, Json(paper)))
}

pub async fn get_paper(
    State(state): State<AppState>,
    Path(paper_id): Path<Uuid>,
) -> Result<Json<PaperDetail>> {
    let repo = state.repo();
    let paper = repo.get_paper(paper_id).await?;

    let venue_name = if let Some(journal_id) = paper.journal_id {
        repo.find_journal(journal_id).await?.map(|j| j.name)
    } else if let Some(conference_id) = paper.conference_id {
        repo.find_conference(conference_id).await?.map(|c| c.name)
    } else {
        None
    };

    let datasets = repo.datasets_for_paper(&paper).await?;
    let citation_history = repo.citation_history(paper.id).await?;

    Ok(Json(PaperDetail {
        venue_type: paper.venue_type(),
        venue_name: venue_name.unwrap_or_else(|| paper.venue_name.clone()),
        paper,
        datasets,
        citation_history,
    }))
}

/// Words of a slug that are specific enough to match on
fn slug_words(slug: &str) -> Vec<String> {
    slug.split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|w| w.chars().count() > 2)
        .map(str::to_lowercase)
        .collect()
}

pub async fn get_paper_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Paper>> {
    let words = slug_words(&slug);
    state
        .repo()
        .find_paper_by_title_words(&words)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound {
            resource_type: "Paper".to_string(),
            id: slug,
        })
}

pub async fn downloaded_papers(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<BookmarkListQuery>,
) -> Result<Json<Paginated<Paper>>> {
    let page = page_params(&state, query.page, query.page_size, DEFAULT_PAGE_SIZE)?;
    let (papers, total) = state
        .repo()
        .bookmarked_papers(
            BookmarkKind::DownloadedPaper,
            auth.user_id,
            non_blank(query.search.as_deref()),
            page,
        )
        .await?;
    Ok(Json(Paginated::new(papers, page, total)))
}

pub async fn mark_interesting(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(paper_id): Path<Uuid>,
) -> Result<(StatusCode, Json<bookmarks::BookmarkResponse>)> {
    bookmarks::mark(&state.repo(), BookmarkKind::InterestingPaper, auth.user_id, paper_id).await
}

pub async fn unmark_interesting(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(paper_id): Path<Uuid>,
) -> Result<Json<bookmarks::BookmarkResponse>> {
    bookmarks::unmark(&state.repo(), BookmarkKind::InterestingPaper, auth.user_id, paper_id).await
}

pub async fn mark_downloaded(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(paper_id): Path<Uuid>,
) -> Result<(StatusCode, Json<bookmarks::BookmarkResponse>)> {
    bookmarks::mark(&state.repo(), BookmarkKind::DownloadedPaper, auth.user_id, paper_id).await
}

pub async fn unmark_downloaded(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(paper_id): Path<Uuid>,
) -> Result<Json<bookmarks::BookmarkResponse>> {
    bookmarks::unmark(&state.repo(), BookmarkKind::DownloadedPaper, auth.user_id, paper_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(body: serde_json::Value) -> CreatePaperRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_slug_words_drop_short_words() {
        assert_eq!(
            slug_words("a-survey-of-deep-learning"),
            vec!["survey", "deep", "learning"]
        );
        assert!(slug_words("of-an").is_empty());
    }

    #[test]
    fn test_create_request_normalizes_lists() {
        let user = Uuid::new_v4();
        let paper = request(json!({
            "title": "  Attention Is All You Need ",
            "authors": ["Vaswani", " Shazeer", "vaswani"],
            "year": 2017,
            "keywords": ["transformers", "Transformers", "attention"]
        }))
        .into_new_paper(user)
        .unwrap();

        assert_eq!(paper.title, "Attention Is All You Need");
        assert_eq!(paper.authors.len(), 2);
        assert_eq!(paper.keywords.len(), 2);
        assert_eq!(paper.created_by, Some(user));
    }

    #[test]
    fn test_create_request_rejects_bad_input() {
        let user = Uuid::new_v4();

        let no_title = request(json!({"authors": ["A"], "year": 2020}));
        assert!(no_title.into_new_paper(user).is_err());

        let authors_not_strings = request(json!({"title": "T", "authors": [1, 2], "year": 2020}));
        assert!(authors_not_strings.into_new_paper(user).is_err());

        let no_year = request(json!({"title": "T", "authors": ["A"]}));
        let err = no_year.into_new_paper(user).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let blank_keyword = request(json!({
            "title": "T", "authors": ["A"], "year": 2020, "keywords": ["ok", "  "]
        }));
        assert!(blank_keyword.into_new_paper(user).is_err());
    }
}
