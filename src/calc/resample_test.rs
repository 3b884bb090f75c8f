use super::resample::resample_mean;
use crate::util::rounding::{Frequency, Period};
use chrono::{Duration, NaiveDateTime};

fn minutes_from(start: &str, count: usize) -> Vec<NaiveDateTime> {
    let start = NaiveDateTime::parse_from_str(start, "%Y-%m-%d %H:%M:%S").unwrap();
    (0..count)
        .map(|i| start + Duration::minutes(i as i64))
        .collect()
}

fn ts(value: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").unwrap()
}

#[test]
fn test_constant_volatility_reports_same_value() {
    let timestamps = minutes_from("2024-01-01 00:00:00", 1440);
    let volatility = vec![Some(0.25); 1440];

    let report = resample_mean(&timestamps, &volatility, Frequency::new(1, Period::Day)).unwrap();

    assert_eq!(report.len(), 1);
    assert_eq!(report.get(ts("2024-01-01 00:00:00")), Some(Some(0.25)));
}

#[test]
fn test_mean_ignores_absent_values() {
    let timestamps = minutes_from("2024-01-01 23:58:00", 4);
    let volatility = vec![None, Some(0.5), Some(1.0), Some(2.0)];

    let report = resample_mean(&timestamps, &volatility, Frequency::new(1, Period::Day)).unwrap();

    assert_eq!(report.len(), 2);
    assert_eq!(report.buckets[0].start, ts("2024-01-01 00:00:00"));
    assert_eq!(report.buckets[0].volatility, Some(0.5));
    assert_eq!(report.buckets[1].start, ts("2024-01-02 00:00:00"));
    assert_eq!(report.buckets[1].volatility, Some(1.5));
}

#[test]
fn test_buckets_without_values_are_absent() {
    let timestamps = vec![
        ts("2024-01-01 10:00:00"),
        ts("2024-01-02 10:00:00"),
        ts("2024-01-04 10:00:00"),
    ];
    let volatility = vec![Some(1.0), None, Some(3.0)];

    let report = resample_mean(&timestamps, &volatility, Frequency::new(1, Period::Day)).unwrap();

    // Jan 2 has only an absent value and Jan 3 has no data at all
    let means: Vec<Option<f64>> = report.buckets.iter().map(|b| b.volatility).collect();
    assert_eq!(means, vec![Some(1.0), None, None, Some(3.0)]);
}

#[test]
fn test_weekly_buckets() {
    // Sunday then the following Monday
    let timestamps = vec![ts("2024-03-10 12:00:00"), ts("2024-03-11 12:00:00")];
    let volatility = vec![Some(1.0), Some(2.0)];

    let report = resample_mean(&timestamps, &volatility, Frequency::new(1, Period::Week)).unwrap();

    assert_eq!(report.get(ts("2024-03-04 00:00:00")), Some(Some(1.0)));
    assert_eq!(report.get(ts("2024-03-11 00:00:00")), Some(Some(2.0)));
}

#[test]
fn test_empty_series_gives_empty_report() {
    let report = resample_mean(&[], &[], Frequency::new(1, Period::Day)).unwrap();
    assert!(report.is_empty());
}
