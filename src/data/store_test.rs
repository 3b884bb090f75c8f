use super::dataset::{Dataset, Table};
use super::store::{
    discover_raw_feed, is_minute_file, staging_path, write_report, CsvStore, DataStore,
};
use crate::calc::resample::{ReportBucket, ReportingSeries};
use chrono::NaiveDateTime;
use std::fs;
use tempfile::TempDir;

fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[test]
fn test_is_minute_file() {
    assert!(is_minute_file("1min_general.csv"));
    assert!(is_minute_file("1min_btc_usd.csv"));
    assert!(!is_minute_file("1minute_general.csv"));
    assert!(!is_minute_file("5min_general.csv"));
    assert!(!is_minute_file("1min_general.txt"));
}

#[test]
fn test_discover_prefers_feed_over_dataset() {
    let dataset = "1min_general.csv";

    assert_eq!(
        discover_raw_feed(&names(&["1min_general.csv", "1min_btc.csv", "notes.md"]), dataset),
        Some("1min_btc.csv".to_string())
    );
    assert_eq!(
        discover_raw_feed(&names(&["1min_general.csv", "daily.csv"]), dataset),
        Some("1min_general.csv".to_string())
    );
    assert_eq!(discover_raw_feed(&names(&["daily.csv"]), dataset), None);
    assert_eq!(discover_raw_feed(&[], dataset), None);
}

#[test]
fn test_csv_store_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let mut store = CsvStore::new(temp_dir.path());

    assert!(store.read_table("1min_general.csv").unwrap().is_none());

    let table = Table {
        headers: vec!["Timestamp".to_string(), "Close".to_string(), "Volatility".to_string()],
        rows: vec![
            vec!["2024-01-01 00:00:00".to_string(), "100".to_string(), "".to_string()],
            vec!["2024-01-01 00:01:00".to_string(), "100.25".to_string(), "0".to_string()],
        ],
    };
    store.write_table("1min_general.csv", &table).unwrap();

    assert_eq!(store.list_candidates().unwrap(), names(&["1min_general.csv"]));
    assert_eq!(store.read_table("1min_general.csv").unwrap(), Some(table.clone()));

    // Rewriting the same table leaves the file byte-identical
    let path = temp_dir.path().join("1min_general.csv");
    let first = fs::read(&path).unwrap();
    store.write_table("1min_general.csv", &table).unwrap();
    assert_eq!(fs::read(&path).unwrap(), first);
}

#[test]
fn test_reads_row_appended_without_volatility_cell() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("1min_general.csv"),
        "Timestamp,Close,Volatility\n2024-01-01 00:00:00,100,0.1\n2024-01-01 00:01:00,101\n",
    )
    .unwrap();
    let store = CsvStore::new(temp_dir.path());

    let table = store.read_table("1min_general.csv").unwrap().unwrap();
    assert_eq!(table.rows[1], names(&["2024-01-01 00:01:00", "101"]));

    let dataset = Dataset::from_table(&table).unwrap();
    assert_eq!(dataset.volatility(), vec![Some(0.1), None]);
    assert_eq!(dataset.records()[1].close, Some(101.0));
}

#[test]
fn test_write_replaces_file_without_leftover_staging() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("1min_general.csv");
    fs::write(&path, "Timestamp,Close\n2024-01-01 00:00:00,99\n").unwrap();
    let mut store = CsvStore::new(temp_dir.path());

    let table = Table {
        headers: names(&["Timestamp", "Close", "Volatility"]),
        rows: vec![names(&["2024-01-01 00:00:00", "100", ""])],
    };
    store.write_table("1min_general.csv", &table).unwrap();

    assert!(!staging_path(&path).exists());
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "Timestamp,Close,Volatility\n2024-01-01 00:00:00,100,\n"
    );
    assert_eq!(store.list_candidates().unwrap(), names(&["1min_general.csv"]));
}

#[test]
fn test_missing_directory_has_no_candidates() {
    let temp_dir = TempDir::new().unwrap();
    let store = CsvStore::new(temp_dir.path().join("absent"));

    assert!(store.list_candidates().unwrap().is_empty());
}

#[test]
fn test_write_report() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("report.csv");
    let start = |value: &str| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").unwrap();

    let report = ReportingSeries {
        buckets: vec![
            ReportBucket {
                start: start("2024-01-01 00:00:00"),
                volatility: Some(0.5),
            },
            ReportBucket {
                start: start("2024-01-02 00:00:00"),
                volatility: None,
            },
        ],
    };
    write_report(&path, &report).unwrap();

    let written = fs::read_to_string(&path).unwrap();
    assert_eq!(
        written,
        "Timestamp,Volatility\n2024-01-01 00:00:00,0.5\n2024-01-02 00:00:00,\n"
    );
}
