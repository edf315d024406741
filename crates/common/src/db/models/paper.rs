//! Paper entity

use super::StringList;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "papers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub title: String,

    #[sea_orm(column_type = "JsonBinary")]
    pub authors: StringList,

    #[sea_orm(column_type = "Text")]
    pub abstract_text: String,

    pub year: i32,

    /// Comma separated research fields
    #[sea_orm(column_type = "Text")]
    pub field: String,

    #[sea_orm(column_type = "JsonBinary")]
    pub keywords: StringList,

    /// Raw venue string as imported, resolved by the venue linking job
    #[sea_orm(column_type = "Text")]
    pub venue_name: String,

    pub journal_id: Option<Uuid>,

    pub conference_id: Option<Uuid>,

    pub citation_count: i32,

    #[sea_orm(column_type = "Text")]
    pub download_url: String,

    #[sea_orm(column_type = "Text")]
    pub doi: String,

    #[sea_orm(column_type = "Text")]
    pub source_code_url: String,

    pub created_by: Option<Uuid>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::journal::Entity",
        from = "Column::JournalId",
        to = "super::journal::Column::Id",
        on_delete = "SetNull"
    )]
    Journal,

    #[sea_orm(
        belongs_to = "super::conference::Entity",
        from = "Column::ConferenceId",
        to = "super::conference::Column::Id",
        on_delete = "SetNull"
    )]
    Conference,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatedBy",
        to = "super::user::Column::Id",
        on_delete = "SetNull"
    )]
    Creator,

    #[sea_orm(has_many = "super::paper_citation::Entity")]
    Citations,
}

impl Related<super::journal::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Journal.def()
    }
}

impl Related<super::conference::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Conference.def()
    }
}

impl Related<super::paper_citation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Citations.def()
    }
}

impl Related<super::dataset::Entity> for Entity {
    fn to() -> RelationDef {
        super::dataset_paper::Relation::Dataset.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::dataset_paper::Relation::Paper.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Which kind of venue this paper is linked to, if any
    pub fn venue_type(&self) -> Option<&'static str> {
        if self.journal_id.is_some() {
            Some("journal")
        } else if self.conference_id.is_some() {
            Some("conference")
        } else {
            None
        }
    }
}
