//! Read-only aggregations behind the statistics endpoints
//!
//! The repository fetches rows; everything here is pure so the counting,
//! ranking and bucketing rules can be tested without a database.

mod period;

pub use period::{ensure_bucket_limit, timeline, Period, PeriodRange, TimelineBucket};

use crate::errors::{AppError, Result};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

pub const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameCount {
    pub name: String,
    pub count: u64,
}

/// Top entries of one period bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodTop {
    pub period: String,
    pub top: Vec<NameCount>,
}

/// Inclusive calendar-day range; either side may be open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// Strict form used by the dashboard timeline: both dates required
    pub fn required(start: Option<&str>, end: Option<&str>) -> Result<(NaiveDate, NaiveDate)> {
        let start = parse_day("startDate", start)?;
        let end = parse_day("endDate", end)?;
        if start > end {
            return Err(AppError::invalid_field("startDate", "startDate must not be after endDate"));
        }
        Ok((start, end))
    }

    /// Lenient form used by the statistics endpoints: unparseable values are ignored
    pub fn lenient(start: Option<&str>, end: Option<&str>) -> Self {
        Self {
            start: start.and_then(parse_lenient),
            end: end.and_then(parse_lenient),
        }
    }

    pub fn closed(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Lower bound (inclusive, midnight UTC of the start day)
    pub fn lower(&self) -> Option<DateTime<Utc>> {
        self.start.map(|d| d.and_time(chrono::NaiveTime::MIN).and_utc())
    }

    /// Upper bound (exclusive, midnight UTC after the end day)
    pub fn upper(&self) -> Option<DateTime<Utc>> {
        self.end
            .and_then(|d| d.checked_add_signed(Duration::days(1)))
            .map(|d| d.and_time(chrono::NaiveTime::MIN).and_utc())
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.lower().map_or(true, |lo| at >= lo) && self.upper().map_or(true, |hi| at < hi)
    }
}

fn parse_day(field: &str, value: Option<&str>) -> Result<NaiveDate> {
    let raw = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::MissingField {
            field: field.to_string(),
        })?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::invalid_field(field, format!("expected YYYY-MM-DD, got '{}'", raw)))
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp
fn parse_lenient(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}

/// Sort counts descending, ties by name ascending, keep the first `n`
pub fn top_counts(counts: HashMap<String, u64>, n: usize) -> Vec<NameCount> {
    let mut entries: Vec<NameCount> = counts
        .into_iter()
        .map(|(name, count)| NameCount { name, count })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    entries.truncate(n);
    entries
}

/// Count trimmed, non-blank items
pub fn tally<I, S>(items: I) -> HashMap<String, u64>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut counts = HashMap::new();
    for item in items {
        let item = item.as_ref().trim();
        if !item.is_empty() {
            *counts.entry(item.to_string()).or_insert(0) += 1;
        }
    }
    counts
}

/// Count comma separated research fields
pub fn field_counts<'a, I>(fields: I) -> HashMap<String, u64>
where
    I: IntoIterator<Item = &'a str>,
{
    tally(fields.into_iter().flat_map(|f| f.split(',')))
}

/// Papers per calendar month, January first, ignoring the year
pub fn monthly_histogram<I>(dates: I) -> [u64; 12]
where
    I: IntoIterator<Item = NaiveDate>,
{
    let mut months = [0u64; 12];
    for date in dates {
        months[date.month0() as usize] += 1;
    }
    months
}

/// Group `(date, name)` observations per period key (ascending) and keep the top `n` per bucket
pub fn period_tops<I>(period: Period, observations: I, n: usize) -> Vec<PeriodTop>
where
    I: IntoIterator<Item = (NaiveDate, String)>,
{
    let mut buckets: BTreeMap<String, HashMap<String, u64>> = BTreeMap::new();
    for (date, name) in observations {
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        *buckets
            .entry(period.key(date))
            .or_default()
            .entry(name.to_string())
            .or_insert(0) += 1;
    }

    buckets
        .into_iter()
        .filter(|(_, counts)| !counts.is_empty())
        .map(|(period, counts)| PeriodTop {
            period,
            top: top_counts(counts, n),
        })
        .collect()
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_top_counts_ties_broken_by_name() {
        let counts = tally(["nlp", "vision", "nlp", "audio", "vision", "graphs"]);
        let top = top_counts(counts, 3);
        let names: Vec<&str> = top.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["nlp", "vision", "audio"]);
        assert_eq!(top[0].count, 2);
    }

    #[test]
    fn test_tally_skips_blanks() {
        let counts = tally([" ml ", "", "  ", "ml"]);
        assert_eq!(counts.len(), 1);
        assert_eq!(counts["ml"], 2);
    }

    #[test]
    fn test_field_counts_split_on_commas() {
        let counts = field_counts(["AI, Robotics", "AI", ",Robotics,"]);
        assert_eq!(counts["AI"], 2);
        assert_eq!(counts["Robotics"], 2);
    }

    #[test]
    fn test_monthly_histogram() {
        let months = monthly_histogram([d(2023, 1, 5), d(2024, 1, 9), d(2024, 12, 31)]);
        assert_eq!(months[0], 2);
        assert_eq!(months[11], 1);
        assert_eq!(months.iter().sum::<u64>(), 3);
    }

    #[test]
    fn test_period_tops_sorted_and_truncated() {
        let obs = vec![
            (d(2024, 2, 1), "b".to_string()),
            (d(2024, 1, 3), "a".to_string()),
            (d(2024, 1, 4), "c".to_string()),
            (d(2024, 1, 5), "c".to_string()),
        ];
        let tops = period_tops(Period::Monthly, obs, 1);
        assert_eq!(tops.len(), 2);
        assert_eq!(tops[0].period, "2024-01");
        assert_eq!(tops[0].top, vec![NameCount { name: "c".into(), count: 2 }]);
        assert_eq!(tops[1].period, "2024-02");
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(2.345), 2.3);
        assert_eq!(round1(2.36), 2.4);
        assert_eq!(round1(0.0), 0.0);
    }

    #[test]
    fn test_required_range() {
        let (start, end) = DateRange::required(Some("2024-01-01"), Some("2024-01-31")).unwrap();
        assert_eq!(start, d(2024, 1, 1));
        assert_eq!(end, d(2024, 1, 31));

        assert!(DateRange::required(None, Some("2024-01-31")).is_err());
        assert!(DateRange::required(Some("01/01/2024"), Some("2024-01-31")).is_err());
        assert!(DateRange::required(Some("2024-02-01"), Some("2024-01-31")).is_err());
    }

    #[test]
    fn test_lenient_range_whole_days() {
        let range = DateRange::lenient(Some("2024-01-01"), Some("garbage"));
        assert_eq!(range.start, Some(d(2024, 1, 1)));
        assert!(range.end.is_none());

        let range = DateRange::lenient(Some("2024-01-01T10:00:00Z"), Some("2024-01-01"));
        let late = d(2024, 1, 1).and_hms_opt(23, 59, 0).unwrap().and_utc();
        let next = d(2024, 1, 2).and_hms_opt(0, 0, 0).unwrap().and_utc();
        assert!(range.contains(late));
        assert!(!range.contains(next));
    }
}
