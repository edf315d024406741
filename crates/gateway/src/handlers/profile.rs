//! The caller's researcher profile

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use scholarhub_common::{
    auth::AuthContext,
    db::{
        models::{Profile, Publication, StringList},
        ProfileUpdate,
    },
    errors::{AppError, Result},
};

#[derive(Serialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub profile: Profile,
    pub username: String,
    pub email: String,
    /// Same list as `research_interests`
    pub keywords: StringList,
    pub publications: Vec<Publication>,
}

/// Partial update; absent fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(max = 255))]
    pub full_name: Option<String>,
    #[validate(length(max = 255))]
    pub faculty_institute: Option<String>,
    pub school: Option<String>,
    pub position: Option<String>,
    #[validate(url(message = "google_scholar_link must be a URL"))]
    pub google_scholar_link: Option<String>,
    pub bio: Option<String>,
    #[serde(alias = "keywords")]
    pub research_interests: Option<serde_json::Value>,
    pub additional_keywords: Option<serde_json::Value>,
}

impl UpdateProfileRequest {
    fn into_update(self) -> Result<ProfileUpdate> {
        self.validate()?;
        let list = |field: &str, value: Option<serde_json::Value>| -> Result<Option<StringList>> {
            value
                .map(|v| StringList::from_json(field, &v))
                .transpose()
        };

        Ok(ProfileUpdate {
            full_name: self.full_name.map(|s| s.trim().to_string()),
            faculty_institute: self.faculty_institute.map(|s| s.trim().to_string()),
            school: self.school.map(|s| s.trim().to_string()),
            position: self.position.map(|s| s.trim().to_string()),
            google_scholar_link: self.google_scholar_link,
            bio: self.bio,
            research_interests: list("research_interests", self.research_interests)?,
            additional_keywords: list("additional_keywords", self.additional_keywords)?,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AvatarRequest {
    #[validate(url(message = "avatarUrl must be a URL"))]
    pub avatar_url: Option<String>,
}

async fn profile_response(state: &AppState, auth: &AuthContext, profile: Profile) -> Result<ProfileResponse> {
    let repo = state.repo();
    let user = repo.find_user(auth.user_id).await?.ok_or_else(|| AppError::Unauthorized {
        message: "User no longer exists".to_string(),
    })?;
    let publications = repo.list_publications(auth.user_id).await?;

    Ok(ProfileResponse {
        keywords: profile.research_interests.clone(),
        profile,
        username: user.username,
        email: user.email,
        publications,
    })
}

pub async fn get_profile(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<ProfileResponse>> {
    let profile = state.repo().get_or_create_profile(auth.user_id).await?;
    Ok(Json(profile_response(&state, &auth, profile).await?))
}

pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>> {
    let profile = state
        .repo()
        .update_profile(auth.user_id, request.into_update()?)
        .await?;

    tracing::info!(
        user_id = %auth.user_id,
        completed = profile.is_profile_completed,
        "Profile updated"
    );
    Ok(Json(profile_response(&state, &auth, profile).await?))
}

pub async fn update_avatar(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(request): Json<AvatarRequest>,
) -> Result<Json<Profile>> {
    request.validate()?;
    let url = request
        .avatar_url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| AppError::MissingField {
            field: "avatarUrl".to_string(),
        })?;

    let profile = state.repo().set_avatar(auth.user_id, url).await?;
    Ok(Json(profile))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_update_accepts_keywords_alias() {
        let request: UpdateProfileRequest =
            serde_json::from_value(json!({"keywords": ["GANs", " gans ", "RL"]})).unwrap();
        let update = request.into_update().unwrap();
        assert_eq!(update.research_interests.unwrap().len(), 2);
        assert!(update.full_name.is_none());
    }

    #[test]
    fn test_update_rejects_bad_lists_and_links() {
        let not_list: UpdateProfileRequest =
            serde_json::from_value(json!({"research_interests": "GANs, RL"})).unwrap();
        assert!(not_list.into_update().is_err());

        let bad_link: UpdateProfileRequest =
            serde_json::from_value(json!({"google_scholar_link": "not a url"})).unwrap();
        assert!(bad_link.into_update().is_err());
    }
}
