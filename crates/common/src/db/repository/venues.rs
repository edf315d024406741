//! Journal and conference operations

use super::{contains_ci, fetch_page, is_unique_violation, Repository};
use crate::db::models::*;
use crate::errors::{AppError, Result};
use crate::pagination::PageParams;
use sea_orm::sea_query::Condition;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct JournalFilter {
    pub search: Option<String>,
    pub quartile: Option<String>,
    pub impact_min: Option<f64>,
    pub impact_max: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct NewJournal {
    pub name: String,
    pub abbreviation: String,
    pub impact_factor: Option<f64>,
    pub quartile: String,
    pub publisher: String,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct NewConference {
    pub name: String,
    pub abbreviation: String,
    pub rank: String,
    pub location: String,
    pub url: String,
}

fn duplicate_name(kind: &str, name: &str) -> AppError {
    AppError::Duplicate {
        message: format!("{} '{}' already exists", kind, name),
    }
}

impl Repository {
    // ========================================================================
    // Journals
    // ========================================================================

    pub async fn list_journals(&self, filter: &JournalFilter, page: PageParams) -> Result<(Vec<Journal>, u64)> {
        let mut query = JournalEntity::find();

        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(contains_ci(JournalColumn::Name, search))
                    .add(contains_ci(JournalColumn::Abbreviation, search)),
            );
        }
        if let Some(quartile) = filter.quartile.as_deref().filter(|s| !s.trim().is_empty()) {
            query = query.filter(JournalColumn::Quartile.eq(quartile.trim()));
        }
        if let Some(min) = filter.impact_min {
            query = query.filter(JournalColumn::ImpactFactor.gte(min));
        }
        if let Some(max) = filter.impact_max {
            query = query.filter(JournalColumn::ImpactFactor.lte(max));
        }

        let paginator = query
            .order_by_asc(JournalColumn::Name)
            .paginate(self.read_conn(), page.page_size);

        let total = paginator.num_items().await?;
        let journals = fetch_page(&paginator, page).await?;
        Ok((journals, total))
    }

    pub async fn find_journal(&self, id: Uuid) -> Result<Option<Journal>> {
        JournalEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn get_journal(&self, id: Uuid) -> Result<Journal> {
        self.find_journal(id).await?.ok_or_else(|| AppError::VenueNotFound {
            kind: "Journal",
            id: id.to_string(),
        })
    }

    pub async fn journal_papers(&self, journal: &Journal) -> Result<Vec<Paper>> {
        journal
            .find_related(PaperEntity)
            .order_by_desc(PaperColumn::Year)
            .order_by_desc(PaperColumn::CreatedAt)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn create_journal(&self, input: NewJournal) -> Result<Journal> {
        let name = input.name.clone();
        let now = chrono::Utc::now();
        let journal = JournalActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            abbreviation: Set(input.abbreviation),
            impact_factor: Set(input.impact_factor),
            quartile: Set(input.quartile),
            publisher: Set(input.publisher),
            url: Set(input.url),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        journal.insert(self.write_conn()).await.map_err(|e| {
            if is_unique_violation(&e) {
                duplicate_name("Journal", &name)
            } else {
                e.into()
            }
        })
    }

    pub async fn update_journal(&self, id: Uuid, input: NewJournal) -> Result<Journal> {
        let mut journal: JournalActiveModel = self.get_journal(id).await?.into();
        let name = input.name.clone();

        journal.name = Set(input.name);
        journal.abbreviation = Set(input.abbreviation);
        journal.impact_factor = Set(input.impact_factor);
        journal.quartile = Set(input.quartile);
        journal.publisher = Set(input.publisher);
        journal.url = Set(input.url);
        journal.updated_at = Set(chrono::Utc::now().into());

        journal.update(self.write_conn()).await.map_err(|e| {
            if is_unique_violation(&e) {
                duplicate_name("Journal", &name)
            } else {
                e.into()
            }
        })
    }

    /// Exact-name lookup table for venue linking
    pub async fn journal_name_index(&self) -> Result<HashMap<String, Uuid>> {
        let rows: Vec<(Uuid, String)> = JournalEntity::find()
            .select_only()
            .column(JournalColumn::Id)
            .column(JournalColumn::Name)
            .into_tuple()
            .all(self.read_conn())
            .await?;
        Ok(rows.into_iter().map(|(id, name)| (name, id)).collect())
    }

    pub async fn journal_count(&self) -> Result<u64> {
        JournalEntity::find().count(self.read_conn()).await.map_err(Into::into)
    }

    // ========================================================================
    // Conferences
    // ========================================================================

    pub async fn list_conferences(
        &self,
        search: Option<&str>,
        rank: Option<&str>,
        page: PageParams,
    ) -> Result<(Vec<Conference>, u64)> {
        let mut query = ConferenceEntity::find();

        if let Some(search) = search.filter(|s| !s.trim().is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(contains_ci(ConferenceColumn::Name, search))
                    .add(contains_ci(ConferenceColumn::Abbreviation, search)),
            );
        }
        if let Some(rank) = rank.filter(|s| !s.trim().is_empty()) {
            query = query.filter(ConferenceColumn::Rank.eq(rank.trim()));
        }

        let paginator = query
            .order_by_asc(ConferenceColumn::Name)
            .paginate(self.read_conn(), page.page_size);

        let total = paginator.num_items().await?;
        let conferences = fetch_page(&paginator, page).await?;
        Ok((conferences, total))
    }

    pub async fn find_conference(&self, id: Uuid) -> Result<Option<Conference>> {
        ConferenceEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn get_conference(&self, id: Uuid) -> Result<Conference> {
        self.find_conference(id).await?.ok_or_else(|| AppError::VenueNotFound {
            kind: "Conference",
            id: id.to_string(),
        })
    }

    pub async fn conference_papers(&self, conference: &Conference) -> Result<Vec<Paper>> {
        conference
            .find_related(PaperEntity)
            .order_by_desc(PaperColumn::Year)
            .order_by_desc(PaperColumn::CreatedAt)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn create_conference(&self, input: NewConference) -> Result<Conference> {
        self.insert_conference(self.write_conn(), input).await
    }

    /// Insert on any connection so the venue linking job can use its transaction
    pub(super) async fn insert_conference<C: ConnectionTrait>(
        &self,
        conn: &C,
        input: NewConference,
    ) -> Result<Conference> {
        let name = input.name.clone();
        let now = chrono::Utc::now();
        let conference = ConferenceActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            abbreviation: Set(input.abbreviation),
            rank: Set(input.rank),
            location: Set(input.location),
            url: Set(input.url),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        conference.insert(conn).await.map_err(|e| {
            if is_unique_violation(&e) {
                duplicate_name("Conference", &name)
            } else {
                e.into()
            }
        })
    }

    pub async fn update_conference(&self, id: Uuid, input: NewConference) -> Result<Conference> {
        let mut conference: ConferenceActiveModel = self.get_conference(id).await?.into();
        let name = input.name.clone();

        conference.name = Set(input.name);
        conference.abbreviation = Set(input.abbreviation);
        conference.rank = Set(input.rank);
        conference.location = Set(input.location);
        conference.url = Set(input.url);
        conference.updated_at = Set(chrono::Utc::now().into());

        conference.update(self.write_conn()).await.map_err(|e| {
            if is_unique_violation(&e) {
                duplicate_name("Conference", &name)
            } else {
                e.into()
            }
        })
    }

    pub async fn conference_name_index(&self) -> Result<HashMap<String, Uuid>> {
        let rows: Vec<(Uuid, String)> = ConferenceEntity::find()
            .select_only()
            .column(ConferenceColumn::Id)
            .column(ConferenceColumn::Name)
            .into_tuple()
            .all(self.read_conn())
            .await?;
        Ok(rows.into_iter().map(|(id, name)| (name, id)).collect())
    }

    pub async fn conference_count(&self) -> Result<u64> {
        ConferenceEntity::find().count(self.read_conn()).await.map_err(Into::into)
    }

    // ========================================================================
    // Shared
    // ========================================================================

    /// Number of papers per journal (or conference when `conferences` is set)
    pub async fn venue_paper_counts(&self, ids: &[Uuid], conferences: bool) -> Result<HashMap<Uuid, u64>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let column = if conferences {
            PaperColumn::ConferenceId
        } else {
            PaperColumn::JournalId
        };

        let rows: Vec<(Uuid, i64)> = PaperEntity::find()
            .select_only()
            .column(column)
            .column_as(PaperColumn::Id.count(), "paper_count")
            .filter(column.is_in(ids.iter().copied()))
            .group_by(column)
            .into_tuple()
            .all(self.read_conn())
            .await?;

        Ok(rows.into_iter().map(|(id, n)| (id, n.max(0) as u64)).collect())
    }
}
