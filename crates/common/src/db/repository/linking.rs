//! Batch operations used by the offline jobs

use super::Repository;
use crate::db::models::*;
use crate::errors::Result;
use crate::similarity::{DatasetNode, SimilarityStore, Snapshot};
use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbBackend, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    Statement, TransactionTrait,
};
use std::collections::HashMap;
use uuid::Uuid;

/// Where a paper's venue string resolved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VenueTarget {
    Journal(Uuid),
    Conference(Uuid),
    /// No venue has this name yet; a conference will be created
    NewConference(String),
}

impl Repository {
    // ========================================================================
    // Dataset to paper linking
    // ========================================================================

    /// Datasets that declare paper titles, in table order
    pub async fn datasets_with_paper_titles(&self, limit: Option<u64>) -> Result<Vec<(Uuid, StringList)>> {
        let rows: Vec<(Uuid, StringList)> = DatasetEntity::find()
            .select_only()
            .column(DatasetColumn::Id)
            .column(DatasetColumn::LinkedPaperTitles)
            .filter(sea_orm::sea_query::Expr::cust("jsonb_array_length(linked_paper_titles) > 0"))
            .order_by_asc(DatasetColumn::CreatedAt)
            .order_by_asc(DatasetColumn::Id)
            .limit(limit)
            .into_tuple()
            .all(self.read_conn())
            .await?;
        Ok(rows)
    }

    /// `(id, title)` of every paper
    pub async fn paper_titles(&self) -> Result<Vec<(Uuid, String)>> {
        PaperEntity::find()
            .select_only()
            .column(PaperColumn::Id)
            .column(PaperColumn::Title)
            .order_by_asc(PaperColumn::CreatedAt)
            .into_tuple()
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Insert `(dataset_id, paper_id)` links in one transaction; returns rows created
    pub async fn insert_dataset_links(&self, links: &[(Uuid, Uuid)]) -> Result<u64> {
        if links.is_empty() {
            return Ok(0);
        }
        let txn = self.write_conn().begin().await?;
        let mut created = 0;
        for (dataset_id, paper_id) in links {
            let stmt = Statement::from_sql_and_values(
                DbBackend::Postgres,
                "INSERT INTO dataset_papers (dataset_id, paper_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
                vec![(*dataset_id).into(), (*paper_id).into()],
            );
            created += txn.execute(stmt).await?.rows_affected();
        }
        txn.commit().await?;
        Ok(created)
    }

    // ========================================================================
    // Paper to venue linking
    // ========================================================================

    /// Papers with a venue string but no venue reference
    pub async fn papers_without_venue(&self) -> Result<Vec<(Uuid, String)>> {
        PaperEntity::find()
            .select_only()
            .column(PaperColumn::Id)
            .column(PaperColumn::VenueName)
            .filter(PaperColumn::JournalId.is_null())
            .filter(PaperColumn::ConferenceId.is_null())
            .filter(PaperColumn::VenueName.ne(""))
            .order_by_asc(PaperColumn::CreatedAt)
            .into_tuple()
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Apply resolved venues in one transaction, creating missing conferences once per name.
    /// Returns `(papers_updated, conferences_created)`.
    pub async fn apply_venue_links(&self, plan: &[(Uuid, VenueTarget)]) -> Result<(u64, u64)> {
        let txn = self.write_conn().begin().await?;
        let mut created: HashMap<String, Uuid> = HashMap::new();
        let mut updated = 0;

        for (paper_id, target) in plan {
            let (journal_id, conference_id) = match target {
                VenueTarget::Journal(id) => (Some(*id), None),
                VenueTarget::Conference(id) => (None, Some(*id)),
                VenueTarget::NewConference(name) => {
                    let id = match created.get(name) {
                        Some(id) => *id,
                        None => {
                            let conference = self
                                .insert_conference(
                                    &txn,
                                    super::NewConference {
                                        name: name.clone(),
                                        abbreviation: name.chars().take(5).collect(),
                                        rank: String::new(),
                                        location: String::new(),
                                        url: String::new(),
                                    },
                                )
                                .await?;
                            created.insert(name.clone(), conference.id);
                            conference.id
                        }
                    };
                    (None, Some(id))
                }
            };

            let stmt = Statement::from_sql_and_values(
                DbBackend::Postgres,
                r#"
                UPDATE papers SET journal_id = $2, conference_id = $3, updated_at = NOW()
                WHERE id = $1 AND journal_id IS NULL AND conference_id IS NULL
                "#,
                vec![(*paper_id).into(), journal_id.into(), conference_id.into()],
            );
            updated += txn.execute(stmt).await?.rows_affected();
        }

        txn.commit().await?;
        Ok((updated, created.len() as u64))
    }
}

#[async_trait]
impl SimilarityStore for Repository {
    async fn load_snapshot(&self) -> Result<Snapshot> {
        let datasets: Vec<(Uuid, Option<String>)> = DatasetEntity::find()
            .select_only()
            .column(DatasetColumn::Id)
            .column(DatasetColumn::Category)
            .order_by_asc(DatasetColumn::CreatedAt)
            .order_by_asc(DatasetColumn::Id)
            .into_tuple()
            .all(self.read_conn())
            .await?;

        let associations: Vec<(Uuid, Uuid)> = DatasetPaperEntity::find()
            .select_only()
            .column(DatasetPaperColumn::PaperId)
            .column(DatasetPaperColumn::DatasetId)
            .into_tuple()
            .all(self.read_conn())
            .await?;

        Ok(Snapshot {
            datasets: datasets
                .into_iter()
                .map(|(id, category)| DatasetNode {
                    id,
                    category: category_label(category.as_deref()),
                })
                .collect(),
            associations,
        })
    }

    async fn replace_edges(&self, from: Uuid, to: &[Uuid]) -> Result<u64> {
        let txn = self.write_conn().begin().await?;

        txn.execute(Statement::from_sql_and_values(
            DbBackend::Postgres,
            "DELETE FROM dataset_similar_datasets WHERE from_dataset_id = $1",
            vec![from.into()],
        ))
        .await?;

        let mut written = 0;
        for target in to {
            let stmt = Statement::from_sql_and_values(
                DbBackend::Postgres,
                r#"
                INSERT INTO dataset_similar_datasets (from_dataset_id, to_dataset_id, created_at)
                VALUES ($1, $2, NOW())
                ON CONFLICT DO NOTHING
                "#,
                vec![from.into(), (*target).into()],
            );
            written += txn.execute(stmt).await?.rows_affected();
        }

        txn.commit().await?;
        Ok(written)
    }
}
