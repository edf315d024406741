//! Calendar bucketing for time-series statistics

use crate::errors::{AppError, Result};
use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Daily,
    Weekly,
    #[default]
    Monthly,
    Yearly,
}

impl FromStr for Period {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Period::Daily),
            "weekly" => Ok(Period::Weekly),
            "monthly" => Ok(Period::Monthly),
            "yearly" => Ok(Period::Yearly),
            other => Err(AppError::invalid_field(
                "period",
                format!("Invalid period '{}': expected daily, weekly, monthly or yearly", other),
            )),
        }
    }
}

impl Period {
    pub fn as_str(self) -> &'static str {
        match self {
            Period::Daily => "daily",
            Period::Weekly => "weekly",
            Period::Monthly => "monthly",
            Period::Yearly => "yearly",
        }
    }

    /// Lenient parse used by the statistics endpoints: unknown values fall back to monthly
    pub fn parse_or_default(value: Option<&str>) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }

    /// First day of the bucket containing `date` (weeks start on Monday)
    pub fn bucket_start(self, date: NaiveDate) -> NaiveDate {
        match self {
            Period::Daily => date,
            Period::Weekly => date - Duration::days(date.weekday().num_days_from_monday() as i64),
            Period::Monthly => date - Duration::days(date.day0() as i64),
            Period::Yearly => date - Duration::days(date.ordinal0() as i64),
        }
    }

    /// First day of the following bucket
    pub fn next_start(self, start: NaiveDate) -> NaiveDate {
        let next = match self {
            Period::Daily => start.checked_add_signed(Duration::days(1)),
            Period::Weekly => start.checked_add_signed(Duration::days(7)),
            Period::Monthly => start.checked_add_months(Months::new(1)),
            Period::Yearly => start.checked_add_months(Months::new(12)),
        };
        next.unwrap_or(NaiveDate::MAX)
    }

    /// Last day of the bucket that starts at `start`
    pub fn bucket_end(self, start: NaiveDate) -> NaiveDate {
        self.next_start(start).pred_opt().unwrap_or(start)
    }

    /// Number of buckets [`timeline`] emits for `start..=end`
    pub fn bucket_count(self, start: NaiveDate, end: NaiveDate) -> u64 {
        let first = self.bucket_start(start);
        if end < first {
            return 0;
        }
        let months = |d: NaiveDate| d.year() as i64 * 12 + d.month0() as i64;
        let count = match self {
            Period::Daily => (end - first).num_days() + 1,
            Period::Weekly => (end - first).num_days() / 7 + 1,
            Period::Monthly => months(end) - months(first) + 1,
            Period::Yearly => (end.year() - first.year()) as i64 + 1,
        };
        count.max(0) as u64
    }

    /// Sortable label of the bucket containing `date`
    pub fn key(self, date: NaiveDate) -> String {
        match self {
            Period::Daily => date.format("%Y-%m-%d").to_string(),
            Period::Weekly => self.bucket_start(date).format("%Y-%m-%d").to_string(),
            Period::Monthly => date.format("%Y-%m").to_string(),
            Period::Yearly => date.format("%Y").to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineBucket {
    pub period: PeriodRange,
    pub count: u64,
}

/// Reject ranges that would produce more than `max` buckets
pub fn ensure_bucket_limit(period: Period, start: NaiveDate, end: NaiveDate, max: u64) -> Result<()> {
    let count = period.bucket_count(start, end);
    if count > max {
        return Err(AppError::invalid_field(
            "period",
            format!(
                "range spans {} {} buckets, at most {} are allowed",
                count,
                period.as_str(),
                max
            ),
        ));
    }
    Ok(())
}

/// Count `dates` into consecutive buckets covering `start..=end`.
///
/// Every bucket overlapping the range is emitted, including empty ones.
/// Dates outside the covered buckets are ignored.
pub fn timeline<I>(period: Period, start: NaiveDate, end: NaiveDate, dates: I) -> Vec<TimelineBucket>
where
    I: IntoIterator<Item = NaiveDate>,
{
    let mut counts: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for date in dates {
        *counts.entry(period.bucket_start(date)).or_default() += 1;
    }

    let mut buckets = Vec::new();
    let mut cursor = period.bucket_start(start);
    while cursor <= end {
        buckets.push(TimelineBucket {
            period: PeriodRange {
                start: cursor,
                end: period.bucket_end(cursor),
            },
            count: counts.get(&cursor).copied().unwrap_or(0),
        });
        let next = period.next_start(cursor);
        if next <= cursor {
            break;
        }
        cursor = next;
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_parse() {
        assert_eq!("Weekly".parse::<Period>().unwrap(), Period::Weekly);
        assert!("hourly".parse::<Period>().is_err());
        assert_eq!(Period::parse_or_default(Some("hourly")), Period::Monthly);
        assert_eq!(Period::parse_or_default(Some("yearly")), Period::Yearly);
        assert_eq!(Period::parse_or_default(None), Period::Monthly);
    }

    #[test]
    fn test_keys() {
        let date = d(2024, 3, 14); // Thursday
        assert_eq!(Period::Daily.key(date), "2024-03-14");
        assert_eq!(Period::Weekly.key(date), "2024-03-11");
        assert_eq!(Period::Monthly.key(date), "2024-03");
        assert_eq!(Period::Yearly.key(date), "2024");
    }

    #[test]
    fn test_bucket_bounds() {
        assert_eq!(Period::Monthly.bucket_end(d(2024, 2, 1)), d(2024, 2, 29));
        assert_eq!(Period::Monthly.bucket_end(d(2023, 12, 1)), d(2023, 12, 31));
        assert_eq!(Period::Weekly.bucket_end(d(2024, 3, 11)), d(2024, 3, 17));
        assert_eq!(Period::Yearly.bucket_start(d(2024, 7, 9)), d(2024, 1, 1));
        assert_eq!(Period::Yearly.bucket_end(d(2024, 1, 1)), d(2024, 12, 31));
    }

    #[test]
    fn test_daily_timeline_zero_filled() {
        let buckets = timeline(
            Period::Daily,
            d(2024, 1, 1),
            d(2024, 1, 3),
            vec![d(2024, 1, 1), d(2024, 1, 3), d(2024, 1, 3)],
        );
        let counts: Vec<u64> = buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 0, 2]);
        assert_eq!(buckets[0].period.start, buckets[0].period.end);
    }

    #[test]
    fn test_weekly_timeline_covers_partial_weeks() {
        // Wed 2024-01-03 .. Tue 2024-01-16 spans three Monday-aligned weeks
        let buckets = timeline(Period::Weekly, d(2024, 1, 3), d(2024, 1, 16), vec![d(2024, 1, 15)]);
        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets[0].period.start, d(2024, 1, 1));
        assert_eq!(buckets[2].period.end, d(2024, 1, 21));
        assert_eq!(buckets[2].count, 1);
    }

    #[test]
    fn test_monthly_and_yearly_timelines() {
        let months = timeline(Period::Monthly, d(2023, 11, 15), d(2024, 2, 2), vec![d(2024, 1, 20)]);
        assert_eq!(months.len(), 4);
        assert_eq!(months[2].period.start, d(2024, 1, 1));
        assert_eq!(months[2].count, 1);

        let years = timeline(Period::Yearly, d(2022, 6, 1), d(2024, 1, 1), Vec::new());
        assert_eq!(years.len(), 3);
        assert!(years.iter().all(|b| b.count == 0));
    }

    #[test]
    fn test_bucket_count_matches_timeline() {
        let cases = [
            (Period::Daily, d(2024, 1, 1), d(2024, 1, 3)),
            (Period::Weekly, d(2024, 1, 3), d(2024, 1, 16)),
            (Period::Weekly, d(2024, 1, 1), d(2024, 1, 7)),
            (Period::Monthly, d(2023, 11, 15), d(2024, 2, 2)),
            (Period::Yearly, d(2022, 6, 1), d(2024, 1, 1)),
            (Period::Daily, d(2024, 2, 2), d(2024, 2, 1)),
            (Period::Weekly, d(2024, 1, 3), d(2024, 1, 2)),
        ];
        for (period, start, end) in cases {
            let emitted = timeline(period, start, end, Vec::new()).len() as u64;
            assert_eq!(period.bucket_count(start, end), emitted, "{:?} {} {}", period, start, end);
        }
    }

    #[test]
    fn test_bucket_limit() {
        let (start, end) = (d(1, 1, 1), d(9999, 12, 31));
        assert!(Period::Daily.bucket_count(start, end) > 3_000_000);
        assert!(ensure_bucket_limit(Period::Daily, start, end, 1000).is_err());
        assert!(ensure_bucket_limit(Period::Yearly, d(2000, 1, 1), d(2024, 12, 31), 25).is_ok());
        assert!(ensure_bucket_limit(Period::Yearly, d(2000, 1, 1), d(2025, 1, 1), 25).is_err());

        let err = ensure_bucket_limit(Period::Monthly, d(2000, 1, 1), d(2024, 1, 1), 12).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_empty_when_start_after_end() {
        assert!(timeline(Period::Daily, d(2024, 2, 2), d(2024, 2, 1), Vec::new()).is_empty());
    }
}
