//! Directed "similar dataset" edge

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "dataset_similar_datasets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub from_dataset_id: Uuid,

    #[sea_orm(primary_key, auto_increment = false)]
    pub to_dataset_id: Uuid,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::dataset::Entity",
        from = "Column::FromDatasetId",
        to = "super::dataset::Column::Id",
        on_delete = "Cascade"
    )]
    FromDataset,

    #[sea_orm(
        belongs_to = "super::dataset::Entity",
        from = "Column::ToDatasetId",
        to = "super::dataset::Column::Id",
        on_delete = "Cascade"
    )]
    ToDataset,
}

impl ActiveModelBehavior for ActiveModel {}
