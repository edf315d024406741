//! Row fetches behind the statistics endpoints
//!
//! Aggregation itself lives in [`crate::analytics`]; these queries only
//! narrow rows by owner and date range.

use super::{within, Repository};
use crate::analytics::DateRange;
use crate::db::models::*;
use crate::errors::Result;
use chrono::{DateTime, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbBackend, EntityTrait, PaginatorTrait, QueryFilter,
    QuerySelect, Statement,
};
use uuid::Uuid;

/// The paper columns the aggregations need
#[derive(Debug, Clone)]
pub struct PaperStatRow {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub field: String,
    pub keywords: StringList,
    pub citation_count: i32,
}

/// One dataset/paper link, with the paper's creation time
#[derive(Debug, Clone)]
pub struct DatasetLinkRow {
    pub dataset_id: Uuid,
    pub dataset_name: String,
    pub paper_created_at: DateTime<Utc>,
}

impl Repository {
    /// Papers created by `owner` (all papers when `None`) within `range`
    pub async fn paper_stat_rows(&self, owner: Option<Uuid>, range: &DateRange) -> Result<Vec<PaperStatRow>> {
        let mut query = PaperEntity::find()
            .select_only()
            .column(PaperColumn::Id)
            .column(PaperColumn::CreatedAt)
            .column(PaperColumn::Field)
            .column(PaperColumn::Keywords)
            .column(PaperColumn::CitationCount);
        if let Some(owner) = owner {
            query = query.filter(PaperColumn::CreatedBy.eq(owner));
        }
        query = within(query, PaperColumn::CreatedAt, range);

        let rows: Vec<(Uuid, DateTimeWithTimeZone, String, StringList, i32)> =
            query.into_tuple().all(self.read_conn()).await?;

        Ok(rows
            .into_iter()
            .map(|(id, created_at, field, keywords, citation_count)| PaperStatRow {
                id,
                created_at: created_at.with_timezone(&Utc),
                field,
                keywords,
                citation_count,
            })
            .collect())
    }

    /// Dataset links whose paper matches owner and range
    pub async fn dataset_link_rows(&self, owner: Option<Uuid>, range: &DateRange) -> Result<Vec<DatasetLinkRow>> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"
            SELECT d.id, d.name, p.created_at
            FROM dataset_papers dp
            JOIN datasets d ON d.id = dp.dataset_id
            JOIN papers p ON p.id = dp.paper_id
            WHERE ($1::uuid IS NULL OR p.created_by = $1)
              AND ($2::timestamptz IS NULL OR p.created_at >= $2)
              AND ($3::timestamptz IS NULL OR p.created_at < $3)
            "#,
            vec![owner.into(), range.lower().into(), range.upper().into()],
        );

        let rows = self.read_conn().query_all(stmt).await?;
        let mut links = Vec::with_capacity(rows.len());
        for row in rows {
            let created_at: DateTimeWithTimeZone = row.try_get_by_index(2)?;
            links.push(DatasetLinkRow {
                dataset_id: row.try_get_by_index(0)?,
                dataset_name: row.try_get_by_index(1)?,
                paper_created_at: created_at.with_timezone(&Utc),
            });
        }
        Ok(links)
    }

    /// Papers by owner created at or after `since`
    pub async fn count_papers_since(&self, owner: Option<Uuid>, since: Option<DateTime<Utc>>) -> Result<u64> {
        let mut query = PaperEntity::find();
        if let Some(owner) = owner {
            query = query.filter(PaperColumn::CreatedBy.eq(owner));
        }
        if let Some(since) = since {
            query = query.filter(PaperColumn::CreatedAt.gte(since));
        }
        query.count(self.read_conn()).await.map_err(Into::into)
    }

    pub async fn count_datasets_created(&self, range: &DateRange) -> Result<u64> {
        within(DatasetEntity::find(), DatasetColumn::CreatedAt, range)
            .count(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Sum and mean of citation counts
    pub async fn citation_totals(&self, owner: Option<Uuid>, range: &DateRange) -> Result<(i64, f64)> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"
            SELECT COALESCE(SUM(citation_count), 0)::BIGINT,
                   COALESCE(AVG(citation_count), 0)::FLOAT8
            FROM papers
            WHERE ($1::uuid IS NULL OR created_by = $1)
              AND ($2::timestamptz IS NULL OR created_at >= $2)
              AND ($3::timestamptz IS NULL OR created_at < $3)
            "#,
            vec![owner.into(), range.lower().into(), range.upper().into()],
        );

        match self.read_conn().query_one(stmt).await? {
            Some(row) => Ok((row.try_get_by_index(0)?, row.try_get_by_index(1)?)),
            None => Ok((0, 0.0)),
        }
    }
}
