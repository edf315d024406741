//! "My library": bookmarks and keyword-based recommendations

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration, Utc};
use serde::Deserialize;
use std::collections::HashSet;
use std::str::FromStr;
use uuid::Uuid;

use crate::AppState;
use scholarhub_common::{
    auth::AuthContext,
    db::{models::Paper, BookmarkKind},
    errors::{AppError, Result},
};

const RECOMMENDATION_WINDOW_DAYS: i64 = 30;
const MAX_RECOMMENDATIONS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Interesting,
    Downloaded,
    Datasets,
    Recommended,
}

impl FromStr for Section {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "" | "interesting" => Ok(Section::Interesting),
            "downloaded" => Ok(Section::Downloaded),
            "datasets" => Ok(Section::Datasets),
            "recommended" => Ok(Section::Recommended),
            _ => Err(AppError::invalid_field("section", "Invalid section parameter")),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LibraryQuery {
    pub section: Option<String>,
}

/// Recent papers sharing a keyword with the profile, skipping excluded ids
fn recommend(papers: Vec<Paper>, keywords: &[String], exclude: &HashSet<Uuid>) -> Vec<Paper> {
    if keywords.is_empty() {
        return Vec::new();
    }
    papers
        .into_iter()
        .filter(|p| !exclude.contains(&p.id))
        .filter(|p| keywords.iter().any(|k| p.keywords.contains_ignore_case(k)))
        .take(MAX_RECOMMENDATIONS)
        .collect()
}

pub async fn my_library(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<LibraryQuery>,
) -> Result<Response> {
    let section = query.section.as_deref().unwrap_or_default().parse::<Section>()?;
    let repo = state.repo();

    let response = match section {
        Section::Interesting | Section::Downloaded => {
            let kind = if section == Section::Interesting {
                BookmarkKind::InterestingPaper
            } else {
                BookmarkKind::DownloadedPaper
            };
            let ids = repo.bookmarked_ids(kind, auth.user_id).await?;
            Json(repo.papers_by_ids(&ids).await?).into_response()
        }
        Section::Datasets => {
            let ids = repo
                .bookmarked_ids(BookmarkKind::InterestingDataset, auth.user_id)
                .await?;
            Json(repo.datasets_by_ids(&ids).await?).into_response()
        }
        Section::Recommended => {
            let profile = repo.get_or_create_profile(auth.user_id).await?;
            let keywords = profile.match_keywords();
            if keywords.is_empty() {
                return Ok(Json(Vec::<Paper>::new()).into_response());
            }

            let since = Utc::now() - Duration::days(RECOMMENDATION_WINDOW_DAYS);
            let recent = repo.papers_created_since(since).await?;
            let already: HashSet<Uuid> = repo
                .bookmarked_ids(BookmarkKind::InterestingPaper, auth.user_id)
                .await?
                .into_iter()
                .collect();

            Json(recommend(recent, &keywords, &already)).into_response()
        }
    };

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scholarhub_common::db::models::StringList;

    fn paper(keywords: &[&str]) -> Paper {
        let now = Utc::now();
        Paper {
            id: Uuid::new_v4(),
            title: "T".to_string(),
            authors: StringList::new(),
            abstract_text: String::new(),
            year: 2024,
            field: String::new(),
            keywords: StringList(keywords.iter().map(|s| s.to_string()).collect()),
            venue_name: String::new(),
            journal_id: None,
            conference_id: None,
            citation_count: 0,
            download_url: String::new(),
            doi: String::new(),
            source_code_url: String::new(),
            created_by: None,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[test]
    fn test_section_parsing() {
        assert_eq!("".parse::<Section>().unwrap(), Section::Interesting);
        assert_eq!("recommended".parse::<Section>().unwrap(), Section::Recommended);
        assert!("everything".parse::<Section>().is_err());
    }

    #[test]
    fn test_recommend_matches_case_insensitively() {
        let gan = paper(&["GANs", "Vision"]);
        let rl = paper(&["Reinforcement Learning"]);
        let keywords = vec!["gans".to_string()];

        let picked = recommend(vec![gan.clone(), rl.clone()], &keywords, &HashSet::new());
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].id, gan.id);

        // Whole keywords only, not substrings
        let partial = vec!["learning".to_string()];
        assert!(recommend(vec![rl], &partial, &HashSet::new()).is_empty());
    }

    #[test]
    fn test_recommend_skips_bookmarked_and_caps() {
        let papers: Vec<Paper> = (0..30).map(|_| paper(&["nlp"])).collect();
        let excluded: HashSet<Uuid> = papers.iter().take(15).map(|p| p.id).collect();
        let keywords = vec!["nlp".to_string()];

        let picked = recommend(papers.clone(), &keywords, &excluded);
        assert_eq!(picked.len(), 15);
        assert!(picked.iter().all(|p| !excluded.contains(&p.id)));

        assert_eq!(recommend(papers, &keywords, &HashSet::new()).len(), MAX_RECOMMENDATIONS);
        assert!(recommend(vec![paper(&["nlp"])], &[], &HashSet::new()).is_empty());
    }
}
