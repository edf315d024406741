//! Dataset entity

use super::StringList;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Category bucket for datasets without one
pub const UNKNOWN_CATEGORY: &str = "unknown";

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "datasets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub name: String,

    #[sea_orm(column_type = "Text")]
    pub abbreviation: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub category: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub language: Option<String>,

    #[sea_orm(column_type = "Text")]
    pub source_url: String,

    #[sea_orm(column_type = "Text")]
    pub license: String,

    #[sea_orm(column_type = "JsonBinary")]
    pub tasks: StringList,

    #[sea_orm(column_type = "JsonBinary")]
    pub benchmarks: StringList,

    /// Paper titles declared at import time, resolved by the dataset linking job
    #[sea_orm(column_type = "JsonBinary")]
    pub linked_paper_titles: StringList,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::dataset_paper::Entity")]
    DatasetPapers,
}

impl Related<super::dataset_paper::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DatasetPapers.def()
    }
}

impl Related<super::paper::Entity> for Entity {
    fn to() -> RelationDef {
        super::dataset_paper::Relation::Paper.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::dataset_paper::Relation::Dataset.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Grouping label: the trimmed category, or `unknown` when missing or blank
    pub fn category_label(&self) -> String {
        category_label(self.category.as_deref())
    }
}

pub fn category_label(category: Option<&str>) -> String {
    match category.map(str::trim) {
        Some(c) if !c.is_empty() => c.to_string(),
        _ => UNKNOWN_CATEGORY.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_label() {
        assert_eq!(category_label(Some("vision")), "vision");
        assert_eq!(category_label(Some("  nlp ")), "nlp");
        assert_eq!(category_label(Some("   ")), UNKNOWN_CATEGORY);
        assert_eq!(category_label(None), UNKNOWN_CATEGORY);
    }
}
