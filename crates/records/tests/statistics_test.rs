use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use records::{
    ClassificationStore, InMemoryStore, NewClassification, Timeframe, statistics,
    timeframe_statistics,
};
use std::sync::{Arc, Mutex};

/// Store whose clock is set explicitly before each save
fn manual_store() -> (InMemoryStore, Arc<Mutex<DateTime<Utc>>>) {
    let now = Arc::new(Mutex::new(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()));
    let clock = Arc::clone(&now);
    let store = InMemoryStore::with_clock(move || *clock.lock().unwrap());
    (store, now)
}

fn save_at(store: &InMemoryStore, clock: &Mutex<DateTime<Utc>>, at: DateTime<Utc>, class: &str) {
    *clock.lock().unwrap() = at;
    store
        .save(NewClassification::new(
            class,
            0.8,
            Some(format!("{}.jpg", class)),
            vec![(class.to_string(), 0.8)],
        ))
        .unwrap();
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_overall_statistics() {
    let (store, clock) = manual_store();
    let base = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap();
    for (i, class) in ["glass", "paper", "glass", "trash"].iter().enumerate() {
        save_at(&store, &clock, base + Duration::minutes(i as i64), class);
    }

    let stats = statistics(&store).unwrap();
    assert_eq!(stats.total_classifications, 4);

    let distribution: Vec<(&str, u64)> = stats
        .distribution
        .iter()
        .map(|c| (c.name.as_str(), c.count))
        .collect();
    assert_eq!(distribution, vec![("glass", 2), ("paper", 1), ("trash", 1)]);
}

#[test]
fn test_statistics_on_empty_store() {
    let store = InMemoryStore::new();
    let stats = statistics(&store).unwrap();
    assert_eq!(stats.total_classifications, 0);
    assert!(stats.distribution.is_empty());
}

#[test]
fn test_week_excludes_older_records() {
    let (store, clock) = manual_store();
    let now = Utc.with_ymd_and_hms(2025, 6, 15, 18, 0, 0).unwrap();

    save_at(&store, &clock, now - Duration::days(10), "metal");
    save_at(&store, &clock, now - Duration::days(3), "glass");
    save_at(&store, &clock, now - Duration::hours(2), "glass");
    save_at(&store, &clock, now - Duration::hours(1), "paper");

    let stats = timeframe_statistics(&store, Timeframe::Week, now).unwrap();

    assert_eq!(stats.total_classifications, 3);
    assert_eq!(stats.start_date, now - Duration::days(7));
    assert_eq!(stats.end_date, now);
    assert!(stats.distribution.iter().all(|c| c.name != "metal"));
}

#[test]
fn test_daily_trend_counts_calendar_days() {
    let (store, clock) = manual_store();
    let now = Utc.with_ymd_and_hms(2025, 6, 15, 18, 0, 0).unwrap();

    save_at(&store, &clock, Utc.with_ymd_and_hms(2025, 6, 13, 0, 0, 0).unwrap(), "glass");
    save_at(&store, &clock, Utc.with_ymd_and_hms(2025, 6, 13, 23, 59, 59).unwrap(), "glass");
    save_at(&store, &clock, Utc.with_ymd_and_hms(2025, 6, 15, 8, 0, 0).unwrap(), "paper");

    let stats = timeframe_statistics(&store, Timeframe::Week, now).unwrap();

    assert_eq!(stats.daily_trend.len(), 7);
    assert_eq!(stats.daily_trend.first().unwrap().date, date(2025, 6, 9));
    assert_eq!(stats.daily_trend.last().unwrap().date, date(2025, 6, 15));

    let counts: Vec<u64> = stats.daily_trend.iter().map(|d| d.count).collect();
    assert_eq!(counts, vec![0, 0, 0, 0, 2, 0, 1]);
}

#[test]
fn test_month_trend_has_thirty_days() {
    let store = InMemoryStore::new();
    let now = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();

    let stats = timeframe_statistics(&store, Timeframe::Month, now).unwrap();

    assert_eq!(stats.daily_trend.len(), 30);
    assert_eq!(stats.daily_trend[0].date, date(2025, 2, 9));
    assert_eq!(stats.total_classifications, 0);
}

#[test]
fn test_all_covers_old_records_with_weekly_trend() {
    let (store, clock) = manual_store();
    let now = Utc.with_ymd_and_hms(2025, 6, 15, 18, 0, 0).unwrap();
    save_at(&store, &clock, Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).unwrap(), "cardboard");
    save_at(&store, &clock, now, "plastic");

    let stats = timeframe_statistics(&store, Timeframe::parse("unknown"), now).unwrap();

    assert_eq!(stats.timeframe, Timeframe::All);
    assert_eq!(stats.total_classifications, 2);
    assert_eq!(stats.daily_trend.len(), 7);
    assert_eq!(stats.daily_trend.last().unwrap().count, 1);
}

#[test]
fn test_timeframe_statistics_json_shape() {
    let store = InMemoryStore::new();
    let now = Utc.with_ymd_and_hms(2025, 6, 15, 18, 0, 0).unwrap();

    let json = serde_json::to_value(timeframe_statistics(&store, Timeframe::Week, now).unwrap())
        .unwrap();

    assert_eq!(json["timeframe"], "week");
    assert_eq!(json["totalClassifications"], 0);
    assert_eq!(json["endDate"], "2025-06-15T18:00:00Z");
    assert_eq!(json["dailyTrend"][6]["date"], "2025-06-15");
    assert!(json["distribution"].as_array().unwrap().is_empty());
}
