use crate::errors::StoreError;
use crate::store::ClassificationStore;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassCount {
    pub name: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_classifications: u64,
    pub distribution: Vec<ClassCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeframeStatistics {
    pub total_classifications: u64,
    pub timeframe: Timeframe,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub distribution: Vec<ClassCount>,
    pub daily_trend: Vec<DailyCount>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    Week,
    Month,
    All,
}

impl Timeframe {
    /// Unknown names fall back to `All`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "week" => Timeframe::Week,
            "month" => Timeframe::Month,
            _ => Timeframe::All,
        }
    }

    pub fn start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Timeframe::Week => now - Duration::days(7),
            Timeframe::Month => now - Duration::days(30),
            Timeframe::All => Utc
                .with_ymd_and_hms(2000, 1, 1, 0, 0, 0)
                .single()
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
        }
    }

    /// Number of calendar days in the daily trend.
    pub fn trend_days(&self) -> i64 {
        match self {
            Timeframe::Month => 30,
            Timeframe::Week | Timeframe::All => 7,
        }
    }
}

pub fn statistics<S>(store: &S) -> Result<Statistics, StoreError>
where
    S: ClassificationStore + ?Sized,
{
    let distribution = store
        .count_by_class()?
        .into_iter()
        .map(|(name, count)| ClassCount { name, count })
        .collect();

    Ok(Statistics {
        total_classifications: store.count()?,
        distribution,
    })
}

/// Statistics over `[timeframe.start(now), now]` with a per-day trend ending today (UTC).
pub fn timeframe_statistics<S>(
    store: &S,
    timeframe: Timeframe,
    now: DateTime<Utc>,
) -> Result<TimeframeStatistics, StoreError>
where
    S: ClassificationStore + ?Sized,
{
    let start = timeframe.start(now);
    let records = store.list_between(start, now)?;

    let mut by_class: BTreeMap<&str, u64> = BTreeMap::new();
    let mut by_day: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for record in &records {
        *by_class.entry(record.predicted_class.as_str()).or_default() += 1;
        *by_day.entry(record.created_at.date_naive()).or_default() += 1;
    }

    let distribution = by_class
        .into_iter()
        .map(|(name, count)| ClassCount {
            name: name.to_string(),
            count,
        })
        .collect();

    let daily_trend = (0..timeframe.trend_days())
        .rev()
        .map(|days_ago| {
            let date = (now - Duration::days(days_ago)).date_naive();
            DailyCount {
                date,
                count: by_day.get(&date).copied().unwrap_or(0),
            }
        })
        .collect();

    Ok(TimeframeStatistics {
        total_classifications: records.len() as u64,
        timeframe,
        start_date: start,
        end_date: now,
        distribution,
        daily_trend,
    })
}
