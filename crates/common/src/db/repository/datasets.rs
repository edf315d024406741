//! Dataset operations

use super::{contains_ci, fetch_page, Repository};
use crate::db::models::*;
use crate::errors::{AppError, Result};
use crate::pagination::PageParams;
use sea_orm::sea_query::Condition;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbBackend, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Statement,
};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct DatasetFilter {
    /// Case-insensitive substring of the category
    pub category: Option<String>,
    /// Exact language
    pub language: Option<String>,
    /// Case-insensitive substring of name or description
    pub search: Option<String>,
}

fn search_condition(q: &str) -> Condition {
    Condition::any()
        .add(contains_ci(DatasetColumn::Name, q))
        .add(contains_ci(DatasetColumn::Description, q))
}

impl Repository {
    pub async fn list_datasets(&self, filter: &DatasetFilter, page: PageParams) -> Result<(Vec<Dataset>, u64)> {
        let mut query = DatasetEntity::find();

        if let Some(category) = filter.category.as_deref().filter(|s| !s.trim().is_empty()) {
            query = query.filter(contains_ci(DatasetColumn::Category, category));
        }
        if let Some(language) = filter.language.as_deref().filter(|s| !s.trim().is_empty()) {
            query = query.filter(DatasetColumn::Language.eq(language.trim()));
        }
        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            query = query.filter(search_condition(search));
        }

        let paginator = query
            .order_by_asc(DatasetColumn::Name)
            .order_by_asc(DatasetColumn::Id)
            .paginate(self.read_conn(), page.page_size);

        let total = paginator.num_items().await?;
        let datasets = fetch_page(&paginator, page).await?;
        Ok((datasets, total))
    }

    pub async fn find_dataset(&self, id: Uuid) -> Result<Option<Dataset>> {
        DatasetEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn get_dataset(&self, id: Uuid) -> Result<Dataset> {
        self.find_dataset(id).await?.ok_or_else(|| AppError::DatasetNotFound {
            id: id.to_string(),
        })
    }

    pub async fn datasets_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Dataset>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        DatasetEntity::find()
            .filter(DatasetColumn::Id.is_in(ids.iter().copied()))
            .order_by_asc(DatasetColumn::Name)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Papers linked to a dataset, newest first
    pub async fn related_papers(&self, dataset: &Dataset) -> Result<Vec<Paper>> {
        dataset
            .find_related(PaperEntity)
            .order_by_desc(PaperColumn::CreatedAt)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Targets of the dataset's outgoing similarity edges
    pub async fn similar_datasets(&self, dataset_id: Uuid) -> Result<Vec<Dataset>> {
        let target_ids: Vec<Uuid> = SimilarDatasetEntity::find()
            .select_only()
            .column(SimilarDatasetColumn::ToDatasetId)
            .filter(SimilarDatasetColumn::FromDatasetId.eq(dataset_id))
            .into_tuple()
            .all(self.read_conn())
            .await?;

        self.datasets_by_ids(&target_ids).await
    }

    /// Number of linked papers per dataset
    pub async fn dataset_paper_counts(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, u64>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows: Vec<(Uuid, i64)> = DatasetPaperEntity::find()
            .select_only()
            .column(DatasetPaperColumn::DatasetId)
            .column_as(DatasetPaperColumn::PaperId.count(), "paper_count")
            .filter(DatasetPaperColumn::DatasetId.is_in(ids.iter().copied()))
            .group_by(DatasetPaperColumn::DatasetId)
            .into_tuple()
            .all(self.read_conn())
            .await?;

        Ok(rows.into_iter().map(|(id, n)| (id, n.max(0) as u64)).collect())
    }

    /// Add one similarity edge; false when it already existed
    pub async fn add_similar_dataset(&self, from: Uuid, to: Uuid) -> Result<bool> {
        if from == to {
            return Err(AppError::invalid_field(
                "similarDatasetId",
                "a dataset cannot be similar to itself",
            ));
        }
        self.get_dataset(from).await?;
        self.get_dataset(to).await?;

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"
            INSERT INTO dataset_similar_datasets (from_dataset_id, to_dataset_id, created_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT DO NOTHING
            "#,
            vec![from.into(), to.into()],
        );
        let result = self.write_conn().execute(stmt).await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn search_datasets(&self, q: &str, page: PageParams) -> Result<(Vec<Dataset>, u64)> {
        let paginator = DatasetEntity::find()
            .filter(search_condition(q))
            .order_by_asc(DatasetColumn::Name)
            .order_by_asc(DatasetColumn::Id)
            .paginate(self.read_conn(), page.page_size);

        let total = paginator.num_items().await?;
        let datasets = fetch_page(&paginator, page).await?;
        Ok((datasets, total))
    }

    pub async fn dataset_count(&self) -> Result<u64> {
        DatasetEntity::find().count(self.read_conn()).await.map_err(Into::into)
    }
}
