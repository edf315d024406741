//! Interesting/downloaded bookmarks

use super::{contains_ci, fetch_page, Repository};
use crate::db::models::*;
use crate::errors::Result;
use crate::pagination::PageParams;
use sea_orm::sea_query::Condition;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbBackend, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Statement,
};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookmarkKind {
    InterestingPaper,
    DownloadedPaper,
    InterestingDataset,
}

impl BookmarkKind {
    fn table(self) -> &'static str {
        match self {
            BookmarkKind::InterestingPaper => "interesting_papers",
            BookmarkKind::DownloadedPaper => "downloaded_papers",
            BookmarkKind::InterestingDataset => "interesting_datasets",
        }
    }

    fn item_column(self) -> &'static str {
        match self {
            BookmarkKind::InterestingDataset => "dataset_id",
            _ => "paper_id",
        }
    }

    /// Metric label
    pub fn label(self) -> &'static str {
        match self {
            BookmarkKind::InterestingPaper => "interesting_paper",
            BookmarkKind::DownloadedPaper => "downloaded_paper",
            BookmarkKind::InterestingDataset => "interesting_dataset",
        }
    }

    /// Human name of the bookmarked item
    pub fn item(self) -> &'static str {
        match self {
            BookmarkKind::InterestingDataset => "Dataset",
            _ => "Paper",
        }
    }

    /// Human name of the relation
    pub fn relation(self) -> &'static str {
        match self {
            BookmarkKind::DownloadedPaper => "downloaded",
            _ => "interesting",
        }
    }
}

impl Repository {
    /// Record a bookmark; false when it already existed
    pub async fn add_bookmark(&self, kind: BookmarkKind, user_id: Uuid, item_id: Uuid) -> Result<bool> {
        let sql = format!(
            "INSERT INTO {} (user_id, {}, created_at) VALUES ($1, $2, NOW()) ON CONFLICT DO NOTHING",
            kind.table(),
            kind.item_column()
        );
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            &sql,
            vec![user_id.into(), item_id.into()],
        );
        let result = self.write_conn().execute(stmt).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove a bookmark; false when there was none
    pub async fn remove_bookmark(&self, kind: BookmarkKind, user_id: Uuid, item_id: Uuid) -> Result<bool> {
        let sql = format!(
            "DELETE FROM {} WHERE user_id = $1 AND {} = $2",
            kind.table(),
            kind.item_column()
        );
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            &sql,
            vec![user_id.into(), item_id.into()],
        );
        let result = self.write_conn().execute(stmt).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Bookmarked item ids, most recent first
    pub async fn bookmarked_ids(&self, kind: BookmarkKind, user_id: Uuid) -> Result<Vec<Uuid>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE user_id = $1 ORDER BY created_at DESC",
            kind.item_column(),
            kind.table()
        );
        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, &sql, vec![user_id.into()]);

        let rows = self.read_conn().query_all(stmt).await?;
        let mut ids = Vec::with_capacity(rows.len());
        for row in rows {
            ids.push(row.try_get_by_index::<Uuid>(0)?);
        }
        Ok(ids)
    }

    /// Bookmarked papers, optionally filtered by title
    pub async fn bookmarked_papers(
        &self,
        kind: BookmarkKind,
        user_id: Uuid,
        search: Option<&str>,
        page: PageParams,
    ) -> Result<(Vec<Paper>, u64)> {
        let ids = self.bookmarked_ids(kind, user_id).await?;
        let mut query = PaperEntity::find().filter(PaperColumn::Id.is_in(ids));
        if let Some(search) = search.filter(|s| !s.trim().is_empty()) {
            query = query.filter(contains_ci(PaperColumn::Title, search));
        }

        let paginator = query
            .order_by_desc(PaperColumn::CreatedAt)
            .paginate(self.read_conn(), page.page_size);
        let total = paginator.num_items().await?;
        let papers = fetch_page(&paginator, page).await?;
        Ok((papers, total))
    }

    /// Datasets the user marked as interesting, optionally filtered by name/description
    pub async fn interesting_datasets(
        &self,
        user_id: Uuid,
        search: Option<&str>,
        page: PageParams,
    ) -> Result<(Vec<Dataset>, u64)> {
        let ids = self.bookmarked_ids(BookmarkKind::InterestingDataset, user_id).await?;
        let mut query = DatasetEntity::find().filter(DatasetColumn::Id.is_in(ids));
        if let Some(search) = search.filter(|s| !s.trim().is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(contains_ci(DatasetColumn::Name, search))
                    .add(contains_ci(DatasetColumn::Description, search)),
            );
        }

        let paginator = query
            .order_by_asc(DatasetColumn::Name)
            .paginate(self.read_conn(), page.page_size);
        let total = paginator.num_items().await?;
        let datasets = fetch_page(&paginator, page).await?;
        Ok((datasets, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tables() {
        assert_eq!(BookmarkKind::InterestingDataset.table(), "interesting_datasets");
        assert_eq!(BookmarkKind::InterestingDataset.item_column(), "dataset_id");
        assert_eq!(BookmarkKind::DownloadedPaper.item_column(), "paper_id");
        assert_eq!(BookmarkKind::DownloadedPaper.relation(), "downloaded");
        assert_eq!(BookmarkKind::InterestingPaper.item(), "Paper");
    }
}
