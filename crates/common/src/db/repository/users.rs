//! Users, profiles and publications

use super::{is_unique_violation, Repository};
use crate::db::models::*;
use crate::errors::{AppError, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use uuid::Uuid;

/// Partial profile update; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub faculty_institute: Option<String>,
    pub school: Option<String>,
    pub position: Option<String>,
    pub google_scholar_link: Option<String>,
    pub bio: Option<String>,
    pub research_interests: Option<StringList>,
    pub additional_keywords: Option<StringList>,
}

#[derive(Debug, Clone)]
pub struct NewPublication {
    pub title: String,
    pub authors: StringList,
    pub abstract_text: String,
    pub venue: String,
    pub year: i32,
    pub url: String,
    pub doi: String,
}

fn empty_profile(user_id: Uuid) -> ProfileActiveModel {
    let now = chrono::Utc::now();
    ProfileActiveModel {
        user_id: Set(user_id),
        full_name: Set(String::new()),
        faculty_institute: Set(String::new()),
        school: Set(None),
        position: Set(String::new()),
        google_scholar_link: Set(None),
        bio: Set(None),
        research_interests: Set(StringList::new()),
        additional_keywords: Set(StringList::new()),
        avatar_url: Set(None),
        is_profile_completed: Set(false),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
}

impl Repository {
    // ========================================================================
    // Users
    // ========================================================================

    pub async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        UserEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        UserEntity::find()
            .filter(UserColumn::Username.eq(username))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Emails are compared case-insensitively
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        UserEntity::find()
            .filter(UserColumn::Email.eq(email.to_lowercase()))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Create a user and its empty profile in one transaction
    pub async fn create_user(&self, username: &str, email: &str, password_hash: String) -> Result<User> {
        if self.find_user_by_username(username).await?.is_some() {
            return Err(AppError::Duplicate {
                message: "Username already exists".to_string(),
            });
        }
        if self.find_user_by_email(email).await?.is_some() {
            return Err(AppError::Duplicate {
                message: "Email already exists".to_string(),
            });
        }

        let txn = self.write_conn().begin().await?;

        let user_id = Uuid::new_v4();
        let user = UserActiveModel {
            id: Set(user_id),
            username: Set(username.to_string()),
            email: Set(email.to_lowercase()),
            password_hash: Set(password_hash),
            created_at: Set(chrono::Utc::now().into()),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            // lost a race with a concurrent registration
            if is_unique_violation(&e) {
                AppError::Duplicate {
                    message: "Username or email already exists".to_string(),
                }
            } else {
                e.into()
            }
        })?;

        empty_profile(user_id).insert(&txn).await?;
        txn.commit().await?;

        Ok(user)
    }

    pub async fn user_count(&self) -> Result<u64> {
        UserEntity::find().count(self.read_conn()).await.map_err(Into::into)
    }

    // ========================================================================
    // Profiles
    // ========================================================================

    /// Fetch the profile, creating an empty one for users that predate profiles
    pub async fn get_or_create_profile(&self, user_id: Uuid) -> Result<Profile> {
        if let Some(profile) = ProfileEntity::find_by_id(user_id).one(self.read_conn()).await? {
            return Ok(profile);
        }
        let profile = empty_profile(user_id).insert(self.write_conn()).await?;
        Ok(profile)
    }

    pub async fn update_profile(&self, user_id: Uuid, changes: ProfileUpdate) -> Result<Profile> {
        let current = self.get_or_create_profile(user_id).await?;

        let mut merged = current.clone();
        if let Some(v) = changes.full_name {
            merged.full_name = v;
        }
        if let Some(v) = changes.faculty_institute {
            merged.faculty_institute = v;
        }
        if let Some(v) = changes.school {
            merged.school = Some(v);
        }
        if let Some(v) = changes.position {
            merged.position = v;
        }
        if let Some(v) = changes.google_scholar_link {
            merged.google_scholar_link = Some(v);
        }
        if let Some(v) = changes.bio {
            merged.bio = Some(v);
        }
        if let Some(v) = changes.research_interests {
            merged.research_interests = v;
        }
        if let Some(v) = changes.additional_keywords {
            merged.additional_keywords = v;
        }
        // once complete, stays complete
        merged.is_profile_completed = current.is_profile_completed || merged.is_complete();

        let mut active: ProfileActiveModel = current.into();
        active.full_name = Set(merged.full_name);
        active.faculty_institute = Set(merged.faculty_institute);
        active.school = Set(merged.school);
        active.position = Set(merged.position);
        active.google_scholar_link = Set(merged.google_scholar_link);
        active.bio = Set(merged.bio);
        active.research_interests = Set(merged.research_interests);
        active.additional_keywords = Set(merged.additional_keywords);
        active.is_profile_completed = Set(merged.is_profile_completed);
        active.updated_at = Set(chrono::Utc::now().into());

        active.update(self.write_conn()).await.map_err(Into::into)
    }

    pub async fn set_avatar(&self, user_id: Uuid, avatar_url: String) -> Result<Profile> {
        let mut active: ProfileActiveModel = self.get_or_create_profile(user_id).await?.into();
        active.avatar_url = Set(Some(avatar_url));
        active.updated_at = Set(chrono::Utc::now().into());
        active.update(self.write_conn()).await.map_err(Into::into)
    }

    // ========================================================================
    // Publications (always scoped to their owner)
    // ========================================================================

    pub async fn list_publications(&self, user_id: Uuid) -> Result<Vec<Publication>> {
        PublicationEntity::find()
            .filter(PublicationColumn::UserId.eq(user_id))
            .order_by_desc(PublicationColumn::Year)
            .order_by_desc(PublicationColumn::CreatedAt)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn create_publication(&self, user_id: Uuid, input: NewPublication) -> Result<Publication> {
        let now = chrono::Utc::now();
        let publication = PublicationActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            title: Set(input.title),
            authors: Set(input.authors),
            abstract_text: Set(input.abstract_text),
            venue: Set(input.venue),
            year: Set(input.year),
            url: Set(input.url),
            doi: Set(input.doi),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };
        publication.insert(self.write_conn()).await.map_err(Into::into)
    }

    /// Another user's publication is reported as missing
    pub async fn get_publication(&self, user_id: Uuid, id: Uuid) -> Result<Publication> {
        PublicationEntity::find_by_id(id)
            .filter(PublicationColumn::UserId.eq(user_id))
            .one(self.read_conn())
            .await?
            .ok_or_else(|| AppError::PublicationNotFound { id: id.to_string() })
    }

    pub async fn update_publication(
        &self,
        user_id: Uuid,
        id: Uuid,
        input: NewPublication,
    ) -> Result<Publication> {
        let mut active: PublicationActiveModel = self.get_publication(user_id, id).await?.into();
        active.title = Set(input.title);
        active.authors = Set(input.authors);
        active.abstract_text = Set(input.abstract_text);
        active.venue = Set(input.venue);
        active.year = Set(input.year);
        active.url = Set(input.url);
        active.doi = Set(input.doi);
        active.updated_at = Set(chrono::Utc::now().into());
        active.update(self.write_conn()).await.map_err(Into::into)
    }

    pub async fn delete_publication(&self, user_id: Uuid, id: Uuid) -> Result<()> {
        let result = PublicationEntity::delete_many()
            .filter(PublicationColumn::Id.eq(id))
            .filter(PublicationColumn::UserId.eq(user_id))
            .exec(self.write_conn())
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::PublicationNotFound { id: id.to_string() });
        }
        Ok(())
    }
}
