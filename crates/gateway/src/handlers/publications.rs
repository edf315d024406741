//! The caller's own publications

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use scholarhub_common::{
    auth::AuthContext,
    db::{
        models::{Publication, StringList},
        NewPublication,
    },
    errors::{AppError, Result},
};

#[derive(Debug, Deserialize, Validate)]
pub struct PublicationRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 1000, message = "Title is required"))]
    pub title: String,
    #[serde(default)]
    pub authors: serde_json::Value,
    #[serde(default, rename = "abstract")]
    pub abstract_text: String,
    #[serde(default)]
    pub venue: String,
    #[validate(range(min = 1800, max = 2100))]
    pub year: Option<i32>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub doi: String,
}

impl PublicationRequest {
    fn into_input(self) -> Result<NewPublication> {
        self.validate()?;
        let year = self.year.ok_or_else(|| AppError::MissingField {
            field: "year".to_string(),
        })?;
        let authors = match self.authors {
            serde_json::Value::Null => StringList::new(),
            ref value => StringList::from_json("authors", value)?,
        };

        Ok(NewPublication {
            title: self.title.trim().to_string(),
            authors,
            abstract_text: self.abstract_text,
            venue: self.venue.trim().to_string(),
            year,
            url: self.url.trim().to_string(),
            doi: self.doi.trim().to_string(),
        })
    }
}

pub async fn list_publications(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<Vec<Publication>>> {
    Ok(Json(state.repo().list_publications(auth.user_id).await?))
}

pub async fn create_publication(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(request): Json<PublicationRequest>,
) -> Result<(StatusCode, Json<Publication>)> {
    let publication = state
        .repo()
        .create_publication(auth.user_id, request.into_input()?)
        .await?;
    tracing::info!(publication_id = %publication.id, user_id = %auth.user_id, "Publication created");
    Ok((StatusCode::CREATED, Json(publication)))
}

pub async fn get_publication(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Publication>> {
    Ok(Json(state.repo().get_publication(auth.user_id, id).await?))
}

pub async fn update_publication(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(request): Json<PublicationRequest>,
) -> Result<Json<Publication>> {
    let publication = state
        .repo()
        .update_publication(auth.user_id, id, request.into_input()?)
        .await?;
    Ok(Json(publication))
}

pub async fn delete_publication(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.repo().delete_publication(auth.user_id, id).await?;
    tracing::info!(publication_id = %id, user_id = %auth.user_id, "Publication deleted");
    Ok(StatusCode::NO_CONTENT)
}
