//! Researcher profile, one per user

use super::StringList;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "profiles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub full_name: String,

    #[sea_orm(column_type = "Text")]
    pub faculty_institute: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub school: Option<String>,

    #[sea_orm(column_type = "Text")]
    pub position: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub google_scholar_link: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub bio: Option<String>,

    #[sea_orm(column_type = "JsonBinary")]
    pub research_interests: StringList,

    #[sea_orm(column_type = "JsonBinary")]
    pub additional_keywords: StringList,

    #[sea_orm(column_type = "Text", nullable)]
    pub avatar_url: Option<String>,

    pub is_profile_completed: bool,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// A profile is complete once the identifying fields and interests are filled
    pub fn is_complete(&self) -> bool {
        !self.full_name.trim().is_empty()
            && !self.faculty_institute.trim().is_empty()
            && !self.position.trim().is_empty()
            && !self.research_interests.is_empty()
    }

    /// Interests plus additional keywords, lowercased
    pub fn match_keywords(&self) -> Vec<String> {
        self.research_interests
            .lowercased()
            .chain(self.additional_keywords.lowercased())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> Model {
        let now = chrono::Utc::now().into();
        Model {
            user_id: Uuid::new_v4(),
            full_name: "Ada Lovelace".into(),
            faculty_institute: "Engineering".into(),
            school: None,
            position: "".into(),
            google_scholar_link: None,
            bio: None,
            research_interests: StringList(vec!["NLP".into()]),
            additional_keywords: StringList(vec!["Parsing".into()]),
            avatar_url: None,
            is_profile_completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_completion_requires_position() {
        let mut p = profile();
        assert!(!p.is_complete());
        p.position = "Lecturer".into();
        assert!(p.is_complete());
        p.research_interests = StringList::new();
        assert!(!p.is_complete());
    }

    #[test]
    fn test_match_keywords_lowercased() {
        assert_eq!(profile().match_keywords(), vec!["nlp", "parsing"]);
    }
}
