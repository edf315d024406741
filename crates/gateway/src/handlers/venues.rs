//! Journal and conference handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use super::{non_blank, page_params};
use crate::AppState;
use scholarhub_common::{
    auth::AuthContext,
    db::{
        models::{Conference, Journal, Paper},
        JournalFilter, NewConference, NewJournal,
    },
    errors::{AppError, Result},
    pagination::{Paginated, DEFAULT_PAGE_SIZE},
};

const QUARTILES: [&str; 4] = ["Q1", "Q2", "Q3", "Q4"];

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalListQuery {
    pub search: Option<String>,
    pub quartile: Option<String>,
    pub impact_min: Option<f64>,
    pub impact_max: Option<f64>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConferenceListQuery {
    pub search: Option<String>,
    pub rank: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct JournalRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 500, message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    pub abbreviation: String,
    #[validate(range(min = 0.0))]
    pub impact_factor: Option<f64>,
    #[serde(default)]
    pub quartile: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub url: String,
}

impl JournalRequest {
    fn into_input(self) -> Result<NewJournal> {
        self.validate()?;
        let quartile = self.quartile.trim().to_uppercase();
        if !quartile.is_empty() && !QUARTILES.contains(&quartile.as_str()) {
            return Err(AppError::invalid_field("quartile", "quartile must be one of Q1, Q2, Q3, Q4"));
        }
        Ok(NewJournal {
            name: self.name.trim().to_string(),
            abbreviation: self.abbreviation.trim().to_string(),
            impact_factor: self.impact_factor,
            quartile,
            publisher: self.publisher.trim().to_string(),
            url: self.url.trim().to_string(),
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ConferenceRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 500, message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    pub abbreviation: String,
    #[serde(default)]
    pub rank: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub url: String,
}

impl ConferenceRequest {
    fn into_input(self) -> Result<NewConference> {
        self.validate()?;
        Ok(NewConference {
            name: self.name.trim().to_string(),
            abbreviation: self.abbreviation.trim().to_string(),
            rank: self.rank.trim().to_string(),
            location: self.location.trim().to_string(),
            url: self.url.trim().to_string(),
        })
    }
}

/// A venue row plus its number of papers
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithPaperCount<T> {
    #[serde(flatten)]
    pub venue: T,
    pub papers_count: u64,
}

#[derive(Serialize)]
pub struct WithPapers<T> {
    #[serde(flatten)]
    pub venue: T,
    pub papers: Vec<Paper>,
}

fn attach_counts<T>(
    venues: Vec<T>,
    counts: &HashMap<Uuid, u64>,
    id: impl Fn(&T) -> Uuid,
) -> Vec<WithPaperCount<T>> {
    venues
        .into_iter()
        .map(|venue| {
            let papers_count = counts.get(&id(&venue)).copied().unwrap_or(0);
            WithPaperCount { venue, papers_count }
        })
        .collect()
}

// ============================================================================
// Journals
// ============================================================================

pub async fn list_journals(
    State(state): State<AppState>,
    Query(query): Query<JournalListQuery>,
) -> Result<Json<Paginated<WithPaperCount<Journal>>>> {
    let page = page_params(&state, query.page, query.page_size, DEFAULT_PAGE_SIZE)?;
    let filter = JournalFilter {
        search: non_blank(query.search.as_deref()).map(str::to_string),
        quartile: non_blank(query.quartile.as_deref()).map(str::to_uppercase),
        impact_min: query.impact_min,
        impact_max: query.impact_max,
    };

    let repo = state.repo();
    let (journals, total) = repo.list_journals(&filter, page).await?;
    let ids: Vec<Uuid> = journals.iter().map(|j| j.id).collect();
    let counts = repo.venue_paper_counts(&ids, false).await?;

    let results = attach_counts(journals, &counts, |j| j.id);
    Ok(Json(Paginated::new(results, page, total)))
}

pub async fn get_journal(
    State(state): State<AppState>,
    Path(journal_id): Path<Uuid>,
) -> Result<Json<WithPapers<Journal>>> {
    let repo = state.repo();
    let journal = repo.get_journal(journal_id).await?;
    let papers = repo.journal_papers(&journal).await?;
    Ok(Json(WithPapers {
        venue: journal,
        papers,
    }))
}

pub async fn create_journal(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(request): Json<JournalRequest>,
) -> Result<(StatusCode, Json<Journal>)> {
    let journal = state.repo().create_journal(request.into_input()?).await?;
    tracing::info!(journal_id = %journal.id, user_id = %auth.user_id, "Journal created");
    Ok((StatusCode::CREATED, Json(journal)))
}

pub async fn update_journal(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(journal_id): Path<Uuid>,
    Json(request): Json<JournalRequest>,
) -> Result<Json<Journal>> {
    let journal = state
        .repo()
        .update_journal(journal_id, request.into_input()?)
        .await?;
    tracing::info!(journal_id = %journal.id, user_id = %auth.user_id, "Journal updated");
    Ok(Json(journal))
}

// ============================================================================
// Conferences
// ============================================================================

pub async fn list_conferences(
    State(state): State<AppState>,
    Query(query): Query<ConferenceListQuery>,
) -> Result<Json<Paginated<WithPaperCount<Conference>>>> {
    let page = page_params(&state, query.page, query.page_size, DEFAULT_PAGE_SIZE)?;

    let repo = state.repo();
    let (conferences, total) = repo
        .list_conferences(
            non_blank(query.search.as_deref()),
            non_blank(query.rank.as_deref()),
            page,
        )
        .await?;
    let ids: Vec<Uuid> = conferences.iter().map(|c| c.id).collect();
    let counts = repo.venue_paper_counts(&ids, true).await?;

    let results = attach_counts(conferences, &counts, |c| c.id);
    Ok(Json(Paginated::new(results, page, total)))
}

pub async fn get_conference(
    State(state): State<AppState>,
    Path(conference_id): Path<Uuid>,
) -> Result<Json<WithPapers<Conference>>> {
    let repo = state.repo();
    let conference = repo.get_conference(conference_id).await?;
    let papers = repo.conference_papers(&conference).await?;
    Ok(Json(WithPapers {
        venue: conference,
        papers,
    }))
}

pub async fn create_conference(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(request): Json<ConferenceRequest>,
) -> Result<(StatusCode, Json<Conference>)> {
    let conference = state.repo().create_conference(request.into_input()?).await?;
    tracing::info!(conference_id = %conference.id, user_id = %auth.user_id, "Conference created");
    Ok((StatusCode::CREATED, Json(conference)))
}

pub async fn update_conference(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(conference_id): Path<Uuid>,
    Json(request): Json<ConferenceRequest>,
) -> Result<Json<Conference>> {
    let conference = state
        .repo()
        .update_conference(conference_id, request.into_input()?)
        .await?;
    tracing::info!(conference_id = %conference.id, user_id = %auth.user_id, "Conference updated");
    Ok(Json(conference))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_journal_request_validation() {
        let ok: JournalRequest =
            serde_json::from_value(json!({"name": " Nature ", "quartile": "q1", "impactFactor": 49.9}))
                .unwrap();
        let input = ok.into_input().unwrap();
        assert_eq!(input.name, "Nature");
        assert_eq!(input.quartile, "Q1");

        let bad_quartile: JournalRequest =
            serde_json::from_value(json!({"name": "X", "quartile": "Q7"})).unwrap();
        assert!(bad_quartile.into_input().is_err());

        let negative: JournalRequest =
            serde_json::from_value(json!({"name": "X", "impactFactor": -1.0})).unwrap();
        assert!(negative.into_input().is_err());

        let nameless: ConferenceRequest = serde_json::from_value(json!({"rank": "A*"})).unwrap();
        assert!(nameless.into_input().is_err());
    }

    #[test]
    fn test_attach_counts_defaults_to_zero() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let counts = HashMap::from([(a, 4)]);
        let rows = attach_counts(vec![a, b], &counts, |id| *id);
        assert_eq!(rows[0].papers_count, 4);
        assert_eq!(rows[1].papers_count, 0);
    }
}
