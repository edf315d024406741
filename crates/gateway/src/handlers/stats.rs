//! Statistics endpoints
//!
//! Rows come from the repository; counting, ranking and bucketing are done by
//! `scholarhub_common::analytics`. When the caller is authenticated the
//! paper-based statistics only cover papers they created.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{Datelike, NaiveDate, TimeZone, Utc};
use futures::try_join;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::AppState;
use scholarhub_common::{
    analytics::{
        self, ensure_bucket_limit, field_counts, monthly_histogram, period_tops, tally, timeline,
        top_counts, DateRange, NameCount, Period, PeriodTop, TimelineBucket, MONTH_NAMES,
    },
    auth::AuthContext,
    db::{DatasetLinkRow, PaperStatRow},
    errors::{AppError, Result},
};
use uuid::Uuid;

const TOP_CATEGORIES: usize = 10;
const TOP_KEYWORD_SETS: usize = 10;
const TOP_KEYWORDS: usize = 20;
const TOP_DATASETS: usize = 20;
const TOP_DATASETS_PER_PERIOD: usize = 5;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub period: Option<String>,
}

impl StatsQuery {
    fn range(&self) -> DateRange {
        DateRange::lenient(self.start_date.as_deref(), self.end_date.as_deref())
    }

    fn period(&self) -> Period {
        Period::parse_or_default(self.period.as_deref())
    }
}

fn owner(auth: &Option<AuthContext>) -> Option<Uuid> {
    auth.as_ref().map(|a| a.user_id)
}

// ============================================================================
// Paper totals
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperTotals {
    pub total_papers: u64,
    pub papers_this_month: u64,
    pub total_citations: i64,
    pub average_citations: f64,
}

async fn paper_totals(state: &AppState, owner: Option<Uuid>, range: &DateRange) -> Result<PaperTotals> {
    let repo = state.repo();
    let now = Utc::now();
    let month_start = Utc
        .with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single();

    let (total_papers, papers_this_month, (total_citations, average)) = try_join!(
        repo.count_papers_since(owner, None),
        repo.count_papers_since(owner, month_start),
        repo.citation_totals(owner, range),
    )?;

    Ok(PaperTotals {
        total_papers,
        papers_this_month,
        total_citations,
        average_citations: analytics::round1(average),
    })
}

/// Catalog-wide paper totals
pub async fn overall_stats(State(state): State<AppState>) -> Result<Json<PaperTotals>> {
    Ok(Json(paper_totals(&state, None, &DateRange::default()).await?))
}

/// Paper totals for the caller; the date range narrows the citation figures
pub async fn paper_stats(
    State(state): State<AppState>,
    auth: Option<AuthContext>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<PaperTotals>> {
    Ok(Json(paper_totals(&state, owner(&auth), &query.range()).await?))
}

// ============================================================================
// Dashboard charts
// ============================================================================

#[derive(Debug, Serialize, PartialEq)]
pub struct MonthCount {
    pub name: &'static str,
    pub papers: u64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct CategoryValue {
    pub name: String,
    pub value: u64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct KeywordSet {
    pub id: usize,
    pub name: String,
    pub count: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub monthly_papers: Vec<MonthCount>,
    pub category_data: Vec<CategoryValue>,
    pub keyword_sets: Vec<KeywordSet>,
}

/// `monthly` ignores the date range; the other charts use `in_range`
fn dashboard_charts(monthly: &[PaperStatRow], in_range: &[PaperStatRow]) -> DashboardStats {
    let months = monthly_histogram(monthly.iter().map(|r| r.created_at.date_naive()));
    let monthly_papers = MONTH_NAMES
        .into_iter()
        .zip(months)
        .map(|(name, papers)| MonthCount { name, papers })
        .collect();

    let categories = field_counts(in_range.iter().map(|r| r.field.as_str()));
    let category_data = top_counts(categories, TOP_CATEGORIES)
        .into_iter()
        .map(|NameCount { name, count }| CategoryValue { name, value: count })
        .collect();

    let keywords = tally(in_range.iter().flat_map(|r| r.keywords.iter()));
    let keyword_sets = top_counts(keywords, TOP_KEYWORD_SETS)
        .into_iter()
        .enumerate()
        .map(|(rank, NameCount { name, count })| KeywordSet {
            id: rank + 1,
            name,
            count,
        })
        .collect();

    DashboardStats {
        monthly_papers,
        category_data,
        keyword_sets,
    }
}

pub async fn dashboard_stats(
    State(state): State<AppState>,
    auth: Option<AuthContext>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<DashboardStats>> {
    let monthly = state.repo().paper_stat_rows(owner(&auth), &DateRange::default()).await?;
    let range = query.range();
    let in_range: Vec<PaperStatRow> = monthly
        .iter()
        .filter(|r| range.contains(r.created_at))
        .cloned()
        .collect();

    Ok(Json(dashboard_charts(&monthly, &in_range)))
}

// ============================================================================
// Keyword and dataset rankings
// ============================================================================

#[derive(Debug, Serialize)]
pub struct KeywordPeriod {
    pub period: String,
    pub keywords: Vec<NameCount>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordStats {
    pub total_keywords: usize,
    pub keywords: Vec<NameCount>,
    pub period_data: Vec<KeywordPeriod>,
}

fn keyword_stats_from(rows: &[PaperStatRow], period: Period) -> KeywordStats {
    let counts = tally(rows.iter().flat_map(|r| r.keywords.iter()));
    let total_keywords = counts.len();

    let observations = rows.iter().flat_map(|r| {
        let day = r.created_at.date_naive();
        r.keywords.iter().map(move |k| (day, k.clone()))
    });
    let period_data = period_tops(period, observations, 1)
        .into_iter()
        .map(|PeriodTop { period, top }| KeywordPeriod {
            period,
            keywords: top,
        })
        .collect();

    KeywordStats {
        total_keywords,
        keywords: top_counts(counts, TOP_KEYWORDS),
        period_data,
    }
}

pub async fn keyword_stats(
    State(state): State<AppState>,
    auth: Option<AuthContext>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<KeywordStats>> {
    let rows = state
        .repo()
        .paper_stat_rows(owner(&auth), &query.range())
        .await?;
    Ok(Json(keyword_stats_from(&rows, query.period())))
}

/// Linked papers of one dataset; names are not unique so datasets are keyed by id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetCount {
    pub id: Uuid,
    pub name: String,
    pub count: u64,
}

/// Count links per dataset, sort by count descending then name, keep the first `n`
fn dataset_counts<'a, I>(links: I, n: usize) -> Vec<DatasetCount>
where
    I: IntoIterator<Item = &'a DatasetLinkRow>,
{
    let mut counts: HashMap<Uuid, DatasetCount> = HashMap::new();
    for link in links {
        counts
            .entry(link.dataset_id)
            .or_insert_with(|| DatasetCount {
                id: link.dataset_id,
                name: link.dataset_name.clone(),
                count: 0,
            })
            .count += 1;
    }

    let mut entries: Vec<DatasetCount> = counts.into_values().collect();
    entries.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.id.cmp(&b.id))
    });
    entries.truncate(n);
    entries
}

#[derive(Debug, Serialize)]
pub struct DatasetPeriod {
    pub period: String,
    pub datasets: Vec<DatasetCount>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetStats {
    pub total_datasets: usize,
    pub datasets: Vec<DatasetCount>,
    pub period_data: Vec<DatasetPeriod>,
}

fn dataset_stats_from(links: &[DatasetLinkRow], period: Period) -> DatasetStats {
    let mut buckets: BTreeMap<String, Vec<&DatasetLinkRow>> = BTreeMap::new();
    for link in links {
        buckets
            .entry(period.key(link.paper_created_at.date_naive()))
            .or_default()
            .push(link);
    }
    let period_data = buckets
        .into_iter()
        .map(|(period, links)| DatasetPeriod {
            period,
            datasets: dataset_counts(links, TOP_DATASETS_PER_PERIOD),
        })
        .collect();

    let all = dataset_counts(links, usize::MAX);
    DatasetStats {
        total_datasets: all.len(),
        datasets: all.into_iter().take(TOP_DATASETS).collect(),
        period_data,
    }
}

pub async fn dataset_stats(
    State(state): State<AppState>,
    auth: Option<AuthContext>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<DatasetStats>> {
    let links = state
        .repo()
        .dataset_link_rows(owner(&auth), &query.range())
        .await?;
    Ok(Json(dataset_stats_from(&links, query.period())))
}

// ============================================================================
// Catalog counts
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeStats {
    pub total_papers: u64,
    pub total_users: u64,
    pub total_datasets: u64,
    pub total_venues: u64,
}

pub async fn home_stats(State(state): State<AppState>) -> Result<Json<HomeStats>> {
    let repo = state.repo();
    let (total_papers, total_users, total_datasets, journals, conferences) = try_join!(
        repo.paper_count(),
        repo.user_count(),
        repo.dataset_count(),
        repo.journal_count(),
        repo.conference_count(),
    )?;
    Ok(Json(HomeStats {
        total_papers,
        total_users,
        total_datasets,
        total_venues: journals + conferences,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VenueCounts {
    pub conferences_count: u64,
    pub journals_count: u64,
}

pub async fn venue_counts(State(state): State<AppState>) -> Result<Json<VenueCounts>> {
    let repo = state.repo();
    let (conferences_count, journals_count) =
        try_join!(repo.conference_count(), repo.journal_count())?;
    Ok(Json(VenueCounts {
        conferences_count,
        journals_count,
    }))
}

// ============================================================================
// Timeline
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub period: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TimelineResponse {
    pub paper_count: u64,
    pub dataset_count: u64,
    pub paper_count_detail: Vec<TimelineBucket>,
    pub papers_per_dataset: Vec<DatasetCount>,
}

fn timeline_params(query: &TimelineQuery, max_buckets: u64) -> Result<(NaiveDate, NaiveDate, Period)> {
    let (start, end) = DateRange::required(query.start_date.as_deref(), query.end_date.as_deref())?;
    let period = query
        .period
        .as_deref()
        .ok_or_else(|| AppError::MissingField {
            field: "period".to_string(),
        })?
        .parse::<Period>()?;
    ensure_bucket_limit(period, start, end, max_buckets)?;
    Ok((start, end, period))
}

/// Paper counts over time with zero-filled buckets; strict about its parameters
pub async fn dashboard(
    State(state): State<AppState>,
    Query(query): Query<TimelineQuery>,
) -> Result<Json<TimelineResponse>> {
    let (start, end, period) = timeline_params(&query, state.config.server.max_timeline_buckets)?;
    let range = DateRange::closed(start, end);
    let repo = state.repo();

    let (rows, dataset_count, links) = try_join!(
        repo.paper_stat_rows(None, &range),
        repo.count_datasets_created(&range),
        repo.dataset_link_rows(None, &range),
    )?;

    let papers_per_dataset = dataset_counts(&links, usize::MAX);

    Ok(Json(TimelineResponse {
        paper_count: rows.len() as u64,
        dataset_count,
        paper_count_detail: timeline(
            period,
            start,
            end,
            rows.iter().map(|r| r.created_at.date_naive()),
        ),
        papers_per_dataset,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use scholarhub_common::db::models::StringList;

    fn at(day: &str) -> DateTime<Utc> {
        NaiveDate::parse_from_str(day, "%Y-%m-%d")
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
            .and_utc()
    }

    fn row(day: &str, field: &str, keywords: &[&str]) -> PaperStatRow {
        PaperStatRow {
            id: Uuid::new_v4(),
            created_at: at(day),
            field: field.to_string(),
            keywords: StringList(keywords.iter().map(|s| s.to_string()).collect()),
            citation_count: 0,
        }
    }

    fn link(id: Uuid, name: &str, day: &str) -> DatasetLinkRow {
        DatasetLinkRow {
            dataset_id: id,
            dataset_name: name.to_string(),
            paper_created_at: at(day),
        }
    }

    #[test]
    fn test_dashboard_charts() {
        let rows = vec![
            row("2024-01-10", "AI, Vision", &["gan", "cnn"]),
            row("2024-01-20", "AI", &["gan"]),
            row("2023-03-05", "NLP", &["bert"]),
        ];
        let charts = dashboard_charts(&rows, &rows);

        assert_eq!(charts.monthly_papers.len(), 12);
        assert_eq!(charts.monthly_papers[0], MonthCount { name: "Jan", papers: 2 });
        assert_eq!(charts.monthly_papers[2].papers, 1);

        assert_eq!(
            charts.category_data[0],
            CategoryValue { name: "AI".to_string(), value: 2 }
        );
        assert_eq!(charts.category_data.len(), 3);

        assert_eq!(charts.keyword_sets[0].id, 1);
        assert_eq!(charts.keyword_sets[0].name, "gan");
        assert_eq!(charts.keyword_sets[1].name, "bert");
    }

    #[test]
    fn test_keyword_stats_period_tops() {
        let rows = vec![
            row("2024-01-10", "", &["gan", "cnn"]),
            row("2024-01-11", "", &["gan"]),
            row("2024-02-01", "", &["bert"]),
        ];
        let stats = keyword_stats_from(&rows, Period::Monthly);

        assert_eq!(stats.total_keywords, 3);
        assert_eq!(stats.keywords[0].name, "gan");
        assert_eq!(stats.period_data.len(), 2);
        assert_eq!(stats.period_data[0].period, "2024-01");
        assert_eq!(stats.period_data[0].keywords.len(), 1);
        assert_eq!(stats.period_data[0].keywords[0].name, "gan");
        assert_eq!(stats.period_data[1].keywords[0].name, "bert");
    }

    #[test]
    fn test_dataset_stats() {
        let imagenet = Uuid::new_v4();
        let links = vec![
            link(imagenet, "ImageNet", "2024-01-01"),
            link(imagenet, "ImageNet", "2024-01-02"),
            link(Uuid::new_v4(), "COCO", "2024-01-03"),
            link(Uuid::new_v4(), "SQuAD", "2025-06-01"),
        ];
        let stats = dataset_stats_from(&links, Period::Yearly);

        assert_eq!(stats.total_datasets, 3);
        assert_eq!(stats.datasets[0].id, imagenet);
        assert_eq!(stats.datasets[0].name, "ImageNet");
        assert_eq!(stats.datasets[0].count, 2);
        let years: Vec<&str> = stats.period_data.iter().map(|p| p.period.as_str()).collect();
        assert_eq!(years, vec!["2024", "2025"]);
        assert_eq!(stats.period_data[0].datasets.len(), 2);
    }

    #[test]
    fn test_same_named_datasets_are_counted_apart() {
        let (first, second) = (Uuid::new_v4(), Uuid::new_v4());
        let links = vec![
            link(first, "Census", "2024-01-01"),
            link(first, "Census", "2024-01-05"),
            link(second, "Census", "2024-01-09"),
        ];

        let stats = dataset_stats_from(&links, Period::Monthly);
        assert_eq!(stats.total_datasets, 2);
        assert_eq!(
            stats.datasets,
            vec![
                DatasetCount { id: first, name: "Census".to_string(), count: 2 },
                DatasetCount { id: second, name: "Census".to_string(), count: 1 },
            ]
        );
        assert_eq!(stats.period_data.len(), 1);
        assert_eq!(stats.period_data[0].datasets.len(), 2);

        let per_dataset = dataset_counts(&links, usize::MAX);
        assert_eq!(per_dataset.iter().map(|d| d.count).sum::<u64>(), 3);
        assert_eq!(per_dataset[1].id, second);
    }

    #[test]
    fn test_timeline_params_are_strict() {
        let ok = TimelineQuery {
            start_date: Some("2024-01-01".to_string()),
            end_date: Some("2024-03-31".to_string()),
            period: Some("weekly".to_string()),
        };
        let (start, end, period) = timeline_params(&ok, 1000).unwrap();
        assert!(start < end);
        assert_eq!(period, Period::Weekly);

        let missing_period = TimelineQuery {
            period: None,
            ..ok
        };
        assert!(timeline_params(&missing_period, 1000).is_err());

        let bad_period = TimelineQuery {
            start_date: Some("2024-01-01".to_string()),
            end_date: Some("2024-03-31".to_string()),
            period: Some("hourly".to_string()),
        };
        assert!(timeline_params(&bad_period, 1000).is_err());

        let bad_date = TimelineQuery {
            start_date: Some("01/01/2024".to_string()),
            end_date: Some("2024-03-31".to_string()),
            period: Some("daily".to_string()),
        };
        assert!(timeline_params(&bad_date, 1000).is_err());
    }

    #[test]
    fn test_timeline_bucket_cap() {
        let whole_calendar = TimelineQuery {
            start_date: Some("0001-01-01".to_string()),
            end_date: Some("9999-12-31".to_string()),
            period: Some("daily".to_string()),
        };
        let err = timeline_params(&whole_calendar, 1000).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);

        let yearly = TimelineQuery {
            period: Some("yearly".to_string()),
            ..whole_calendar
        };
        assert!(timeline_params(&yearly, 1000).is_err());
        assert!(timeline_params(&yearly, 10_000).is_ok());
    }

    #[test]
    fn test_dashboard_charts_range_filter() {
        let rows = vec![
            row("2024-01-10", "AI", &["gan"]),
            row("2024-02-20", "NLP", &["bert"]),
        ];
        let range = DateRange::lenient(Some("2024-02-01"), Some("2024-02-29"));
        let in_range: Vec<PaperStatRow> = rows
            .iter()
            .filter(|r| range.contains(r.created_at))
            .cloned()
            .collect();
        let charts = dashboard_charts(&rows, &in_range);

        assert_eq!(charts.monthly_papers[0].papers, 1);
        assert_eq!(
            charts.category_data,
            vec![CategoryValue { name: "NLP".to_string(), value: 1 }]
        );
    }
}
