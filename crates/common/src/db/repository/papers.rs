//! Paper operations

use super::{contains_ci, fetch_page, json_contains_ci, within, Repository};
use crate::analytics::DateRange;
use crate::db::models::*;
use crate::errors::{AppError, Result};
use crate::pagination::PageParams;
use sea_orm::sea_query::Condition;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

/// Filters accepted by the paper listing
#[derive(Debug, Clone, Default)]
pub struct PaperFilter {
    pub search: Option<String>,
    pub year: Option<i32>,
    pub venue: Option<String>,
    pub range: DateRange,
}

/// Validated input for a new paper
#[derive(Debug, Clone)]
pub struct NewPaper {
    pub title: String,
    pub authors: StringList,
    pub abstract_text: String,
    pub year: i32,
    pub field: String,
    pub keywords: StringList,
    pub venue_name: String,
    pub journal_id: Option<Uuid>,
    pub conference_id: Option<Uuid>,
    pub citation_count: i32,
    pub download_url: String,
    pub doi: String,
    pub source_code_url: String,
    pub created_by: Option<Uuid>,
}

impl Repository {
    /// List papers, newest first
    pub async fn list_papers(&self, filter: &PaperFilter, page: PageParams) -> Result<(Vec<Paper>, u64)> {
        let mut query = PaperEntity::find();

        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            query = query.filter(contains_ci(PaperColumn::Title, search));
        }
        if let Some(year) = filter.year {
            query = query.filter(PaperColumn::Year.eq(year));
        }
        if let Some(venue) = filter.venue.as_deref().filter(|s| !s.trim().is_empty()) {
            query = query.filter(contains_ci(PaperColumn::VenueName, venue));
        }
        query = within(query, PaperColumn::CreatedAt, &filter.range);

        let paginator = query
            .order_by_desc(PaperColumn::CreatedAt)
            .order_by_asc(PaperColumn::Id)
            .paginate(self.read_conn(), page.page_size);

        let total = paginator.num_items().await?;
        let papers = fetch_page(&paginator, page).await?;

        Ok((papers, total))
    }

    /// Create a new paper; at most one venue reference may be set
    pub async fn create_paper(&self, input: NewPaper) -> Result<Paper> {
        if input.journal_id.is_some() && input.conference_id.is_some() {
            return Err(AppError::invalid_field(
                "venue",
                "a paper belongs to a journal or a conference, not both",
            ));
        }
        if let Some(journal_id) = input.journal_id {
            self.find_journal(journal_id).await?.ok_or(AppError::VenueNotFound {
                kind: "Journal",
                id: journal_id.to_string(),
            })?;
        }
        if let Some(conference_id) = input.conference_id {
            self.find_conference(conference_id).await?.ok_or(AppError::VenueNotFound {
                kind: "Conference",
                id: conference_id.to_string(),
            })?;
        }

        let now = chrono::Utc::now();
        let paper = PaperActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(input.title),
            authors: Set(input.authors),
            abstract_text: Set(input.abstract_text),
            year: Set(input.year),
            field: Set(input.field),
            keywords: Set(input.keywords),
            venue_name: Set(input.venue_name),
            journal_id: Set(input.journal_id),
            conference_id: Set(input.conference_id),
            citation_count: Set(input.citation_count),
            download_url: Set(input.download_url),
            doi: Set(input.doi),
            source_code_url: Set(input.source_code_url),
            created_by: Set(input.created_by),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        paper.insert(self.write_conn()).await.map_err(Into::into)
    }

    /// Find paper by ID
    pub async fn find_paper(&self, id: Uuid) -> Result<Option<Paper>> {
        PaperEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find paper by ID or fail with 404
    pub async fn get_paper(&self, id: Uuid) -> Result<Paper> {
        self.find_paper(id).await?.ok_or_else(|| AppError::PaperNotFound {
            id: id.to_string(),
        })
    }

    pub async fn papers_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Paper>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        PaperEntity::find()
            .filter(PaperColumn::Id.is_in(ids.iter().copied()))
            .order_by_desc(PaperColumn::CreatedAt)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// First paper (newest) whose title contains every word
    pub async fn find_paper_by_title_words(&self, words: &[String]) -> Result<Option<Paper>> {
        if words.is_empty() {
            return Ok(None);
        }
        let mut query = PaperEntity::find();
        for word in words {
            query = query.filter(contains_ci(PaperColumn::Title, word));
        }
        query
            .order_by_desc(PaperColumn::CreatedAt)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Datasets linked to a paper
    pub async fn datasets_for_paper(&self, paper: &Paper) -> Result<Vec<Dataset>> {
        paper
            .find_related(DatasetEntity)
            .order_by_asc(DatasetColumn::Name)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Per-year citation history, oldest first
    pub async fn citation_history(&self, paper_id: Uuid) -> Result<Vec<PaperCitation>> {
        PaperCitationEntity::find()
            .filter(PaperCitationColumn::PaperId.eq(paper_id))
            .order_by_asc(PaperCitationColumn::Year)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Catalog search over title, abstract, authors and keywords
    pub async fn search_papers(&self, q: &str, page: PageParams) -> Result<(Vec<Paper>, u64)> {
        let condition = Condition::any()
            .add(contains_ci(PaperColumn::Title, q))
            .add(contains_ci(PaperColumn::AbstractText, q))
            .add(json_contains_ci(PaperColumn::Authors, q))
            .add(json_contains_ci(PaperColumn::Keywords, q));

        let paginator = PaperEntity::find()
            .filter(condition)
            .order_by_desc(PaperColumn::CreatedAt)
            .order_by_asc(PaperColumn::Id)
            .paginate(self.read_conn(), page.page_size);

        let total = paginator.num_items().await?;
        let papers = fetch_page(&paginator, page).await?;
        Ok((papers, total))
    }

    /// Every keyword list in the catalog
    pub async fn all_keyword_lists(&self) -> Result<Vec<StringList>> {
        PaperEntity::find()
            .select_only()
            .column(PaperColumn::Keywords)
            .into_tuple::<StringList>()
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Papers created at or after `since`, newest first
    pub async fn papers_created_since(
        &self,
        since: chrono::DateTime<chrono::Utc>,
    ) -> Result<Vec<Paper>> {
        PaperEntity::find()
            .filter(PaperColumn::CreatedAt.gte(since))
            .order_by_desc(PaperColumn::CreatedAt)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn paper_count(&self) -> Result<u64> {
        PaperEntity::find().count(self.read_conn()).await.map_err(Into::into)
    }
}
