//! Dataset catalog handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use super::{bookmarks, non_blank, page_params, papers::BookmarkListQuery};
use crate::AppState;
use scholarhub_common::{
    auth::AuthContext,
    db::{
        models::{Dataset, Paper},
        BookmarkKind, DatasetFilter,
    },
    errors::{AppError, Result},
    pagination::{Paginated, DEFAULT_PAGE_SIZE},
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetListQuery {
    pub category: Option<String>,
    pub language: Option<String>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSimilarRequest {
    pub similar_dataset_id: Option<Uuid>,
}

/// Compact view of a related dataset
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarDatasetSummary {
    pub id: Uuid,
    pub name: String,
    pub abbreviation: String,
    pub description: String,
    pub category: String,
    pub language: String,
    pub paper_count: u64,
}

impl SimilarDatasetSummary {
    fn new(dataset: Dataset, paper_count: u64) -> Self {
        Self {
            id: dataset.id,
            name: dataset.name,
            abbreviation: dataset.abbreviation,
            description: dataset.description,
            category: or_default(dataset.category, "Unknown"),
            language: or_default(dataset.language, "English"),
            paper_count,
        }
    }
}

fn or_default(value: Option<String>, default: &str) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetDetail {
    pub dataset: Dataset,
    pub related_papers: Vec<Paper>,
    pub similar_datasets: Vec<SimilarDatasetSummary>,
}

#[derive(Serialize)]
pub struct SimilarLinkResponse {
    pub message: String,
    pub created: bool,
}

pub async fn list_datasets(
    State(state): State<AppState>,
    Query(query): Query<DatasetListQuery>,
) -> Result<Json<Paginated<Dataset>>> {
    let page = page_params(&state, query.page, query.page_size, DEFAULT_PAGE_SIZE)?;
    let filter = DatasetFilter {
        category: non_blank(query.category.as_deref()).map(str::to_string),
        language: non_blank(query.language.as_deref()).map(str::to_string),
        search: non_blank(query.search.as_deref()).map(str::to_string),
    };

    let (datasets, total) = state.repo().list_datasets(&filter, page).await?;
    Ok(Json(Paginated::new(datasets, page, total)))
}

/// Dataset with its papers and the output of the similarity job
pub async fn get_dataset(
    State(state): State<AppState>,
    Path(dataset_id): Path<Uuid>,
) -> Result<Json<DatasetDetail>> {
    let repo = state.repo();
    let dataset = repo.get_dataset(dataset_id).await?;
    let related_papers = repo.related_papers(&dataset).await?;

    let similar = repo.similar_datasets(dataset.id).await?;
    let ids: Vec<Uuid> = similar.iter().map(|d| d.id).collect();
    let counts: HashMap<Uuid, u64> = repo.dataset_paper_counts(&ids).await?;

    let similar_datasets = similar
        .into_iter()
        .map(|d| {
            let count = counts.get(&d.id).copied().unwrap_or(0);
            SimilarDatasetSummary::new(d, count)
        })
        .collect();

    Ok(Json(DatasetDetail {
        dataset,
        related_papers,
        similar_datasets,
    }))
}

/// Manually record `id -> similarDatasetId`
pub async fn add_similar_dataset(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(dataset_id): Path<Uuid>,
    Json(request): Json<AddSimilarRequest>,
) -> Result<(StatusCode, Json<SimilarLinkResponse>)> {
    let similar_id = request.similar_dataset_id.ok_or_else(|| AppError::MissingField {
        field: "similarDatasetId".to_string(),
    })?;

    let repo = state.repo();
    repo.get_dataset(dataset_id).await?;
    repo.get_dataset(similar_id).await?;

    let created = repo.add_similar_dataset(dataset_id, similar_id).await?;
    tracing::info!(
        from = %dataset_id,
        to = %similar_id,
        user_id = %auth.user_id,
        created,
        "Similar dataset linked"
    );

    let (status, message) = if created {
        (StatusCode::CREATED, "Similar dataset added")
    } else {
        (StatusCode::OK, "Datasets were already linked")
    };
    Ok((
        status,
        Json(SimilarLinkResponse {
            message: message.to_string(),
            created,
        }),
    ))
}

pub async fn interesting_datasets(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<BookmarkListQuery>,
) -> Result<Json<Paginated<Dataset>>> {
    let page = page_params(&state, query.page, query.page_size, DEFAULT_PAGE_SIZE)?;
    let (datasets, total) = state
        .repo()
        .interesting_datasets(auth.user_id, non_blank(query.search.as_deref()), page)
        .await?;
    Ok(Json(Paginated::new(datasets, page, total)))
}

pub async fn mark_interesting(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(dataset_id): Path<Uuid>,
) -> Result<(StatusCode, Json<bookmarks::BookmarkResponse>)> {
    bookmarks::mark(&state.repo(), BookmarkKind::InterestingDataset, auth.user_id, dataset_id).await
}

pub async fn unmark_interesting(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(dataset_id): Path<Uuid>,
) -> Result<Json<bookmarks::BookmarkResponse>> {
    bookmarks::unmark(&state.repo(), BookmarkKind::InterestingDataset, auth.user_id, dataset_id).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_defaults() {
        assert_eq!(or_default(None, "Unknown"), "Unknown");
        assert_eq!(or_default(Some("  ".to_string()), "English"), "English");
        assert_eq!(or_default(Some("vision".to_string()), "Unknown"), "vision");
    }
}
