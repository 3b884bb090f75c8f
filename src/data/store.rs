use log::debug;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use super::dataset::{Table, TIMESTAMP_FORMAT};
use crate::calc::resample::ReportingSeries;
use crate::error::Result;

/// File name token that marks a 1 minute closing price file.
pub const MINUTE_FILE_TOKEN: &str = "1min";

/// Data access used by the updater: list candidate files, read and write tables.
pub trait DataStore {
    /// Where the data lives, for user-facing messages.
    fn location(&self) -> PathBuf;

    /// Names of every stored file, in any order.
    fn list_candidates(&self) -> Result<Vec<String>>;

    /// Reads a whole table, `None` when no file with that name exists.
    fn read_table(&self, name: &str) -> Result<Option<Table>>;

    /// Overwrites (or creates) a whole table.
    fn write_table(&mut self, name: &str, table: &Table) -> Result<()>;
}

/// True for `.csv` files whose first `_`-separated token is `1min`.
pub fn is_minute_file(name: &str) -> bool {
    name.ends_with(".csv") && name.split('_').next() == Some(MINUTE_FILE_TOKEN)
}

/// Picks the raw price feed among the store's files.
///
/// The persisted dataset is only used as the feed when it is the sole minute
/// file, which is the layout where new rows are appended to it directly.
pub fn discover_raw_feed(candidates: &[String], dataset_file: &str) -> Option<String> {
    let mut minute_files: Vec<&String> = candidates
        .iter()
        .filter(|name| is_minute_file(name))
        .collect();
    minute_files.sort();

    minute_files
        .iter()
        .find(|name| name.as_str() != dataset_file)
        .or_else(|| minute_files.first())
        .map(|name| name.to_string())
}

/// Flat CSV files in a single directory.
#[derive(Debug, Clone)]
pub struct CsvStore {
    dir: PathBuf,
}

impl CsvStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}

impl DataStore for CsvStore {
    fn location(&self) -> PathBuf {
        self.dir.clone()
    }

    fn list_candidates(&self) -> Result<Vec<String>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    fn read_table(&self, name: &str) -> Result<Option<Table>> {
        let path = self.path(name);
        if !path.is_file() {
            return Ok(None);
        }
        read_csv(&path).map(Some)
    }

    fn write_table(&mut self, name: &str, table: &Table) -> Result<()> {
        write_csv(&self.path(name), table)
    }
}

fn read_csv(path: &Path) -> Result<Table> {
    // Rows appended by hand may omit the trailing Volatility cell
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    debug!("Read {} rows from {}", rows.len(), path.display());
    Ok(Table { headers, rows })
}

/// Sibling file a table is staged in before it replaces `path`.
pub fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_csv(path: &Path, table: &Table) -> Result<()> {
    let staging = staging_path(path);
    if let Err(e) = write_rows(&staging, table) {
        let _ = fs::remove_file(&staging);
        return Err(e);
    }

    // The previous file stays intact until the rename
    fs::rename(&staging, path)?;

    debug!("Wrote {} rows to {}", table.rows.len(), path.display());
    Ok(())
}

fn write_rows(path: &Path, table: &Table) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct ReportRow {
    #[serde(rename = "Timestamp")]
    timestamp: String,
    #[serde(rename = "Volatility")]
    volatility: Option<f64>,
}

/// Exports a reporting series as `Timestamp,Volatility` rows.
pub fn write_report(path: &Path, report: &ReportingSeries) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for bucket in &report.buckets {
        writer.serialize(ReportRow {
            timestamp: bucket.start.format(TIMESTAMP_FORMAT).to_string(),
            volatility: bucket.volatility,
        })?;
    }
    writer.flush()?;
    Ok(())
}
