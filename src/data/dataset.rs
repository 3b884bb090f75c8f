use chrono::NaiveDateTime;
use std::num::ParseFloatError;

use super::price_series::PricePoint;
use crate::error::{Result, VolatilityError};

pub const TIMESTAMP_COLUMN: &str = "Timestamp";
pub const CLOSE_COLUMN: &str = "Close";
pub const VOLATILITY_COLUMN: &str = "Volatility";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Untyped delimited table exactly as stored: a header row and text cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// One minute of the persisted dataset.
///
/// `cells` keeps every input column verbatim (without `Volatility`) so that a
/// rewrite never alters data this crate does not own. `volatility_cell` is the
/// stored text of `volatility`, written back while the value is unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct VolatilityRecord {
    pub timestamp: NaiveDateTime,
    pub close: Option<f64>,
    pub volatility: Option<f64>,
    cells: Vec<String>,
    volatility_cell: Option<String>,
}

impl VolatilityRecord {
    fn volatility_text(&self) -> String {
        let value = match self.volatility {
            Some(value) => value,
            None => return String::new(),
        };
        match &self.volatility_cell {
            Some(cell) if cell.trim().parse::<f64>().ok() == Some(value) => cell.clone(),
            _ => value.to_string(),
        }
    }
}

/// The full historical record sequence, the durable owner of volatility state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    headers: Vec<String>,
    records: Vec<VolatilityRecord>,
    has_volatility: bool,
}

fn column_index(headers: &[String], column: &str) -> Option<usize> {
    headers.iter().position(|header| header.trim() == column)
}

fn parse_optional_f64(cell: &str) -> std::result::Result<Option<f64>, ParseFloatError> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(None);
    }
    cell.parse::<f64>().map(Some)
}

impl Dataset {
    /// Parses a stored table. `Timestamp` and `Close` are required; a missing
    /// `Volatility` column means volatility was never computed.
    pub fn from_table(table: &Table) -> Result<Self> {
        let timestamp_index =
            column_index(&table.headers, TIMESTAMP_COLUMN).ok_or_else(|| {
                VolatilityError::MissingColumn {
                    column: TIMESTAMP_COLUMN.to_string(),
                }
            })?;
        let close_index = column_index(&table.headers, CLOSE_COLUMN).ok_or_else(|| {
            VolatilityError::MissingColumn {
                column: CLOSE_COLUMN.to_string(),
            }
        })?;
        let volatility_index = column_index(&table.headers, VOLATILITY_COLUMN);

        let headers: Vec<String> = table
            .headers
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != volatility_index)
            .map(|(_, header)| header.clone())
            .collect();

        let mut records = Vec::with_capacity(table.rows.len());
        for (i, row) in table.rows.iter().enumerate() {
            let row_number = i + 1;
            let cell = |index: usize| row.get(index).map(String::as_str).unwrap_or("");

            let raw_timestamp = cell(timestamp_index);
            let timestamp = NaiveDateTime::parse_from_str(raw_timestamp.trim(), TIMESTAMP_FORMAT)
                .map_err(|_| VolatilityError::InvalidTimestamp {
                    row: row_number,
                    value: raw_timestamp.to_string(),
                })?;

            let raw_close = cell(close_index);
            let close = parse_optional_f64(raw_close)
                .ok()
                .filter(|value| value.map_or(true, f64::is_finite))
                .ok_or_else(|| VolatilityError::InvalidPrice {
                    row: row_number,
                    value: raw_close.to_string(),
                })?;

            let (volatility, volatility_cell) = match volatility_index {
                Some(index) => {
                    let raw_volatility = cell(index);
                    let value = parse_optional_f64(raw_volatility).map_err(|_| {
                        VolatilityError::InvalidVolatility {
                            row: row_number,
                            value: raw_volatility.to_string(),
                        }
                    })?;
                    (value, value.map(|_| raw_volatility.to_string()))
                }
                None => (None, None),
            };

            let cells = (0..table.headers.len())
                .filter(|index| Some(*index) != volatility_index)
                .map(|index| cell(index).to_string())
                .collect();

            records.push(VolatilityRecord {
                timestamp,
                close,
                volatility,
                cells,
                volatility_cell,
            });
        }

        Ok(Self {
            headers,
            records,
            has_volatility: volatility_index.is_some(),
        })
    }

    /// Serializes the dataset with `Volatility` as the last column. Absent
    /// values are empty cells; a stored value keeps its original text, so
    /// `1e-05` is not rewritten as `0.00001`.
    pub fn to_table(&self) -> Table {
        let mut headers = self.headers.clone();
        headers.push(VOLATILITY_COLUMN.to_string());

        let rows = self
            .records
            .iter()
            .map(|record| {
                let mut row = record.cells.clone();
                row.push(record.volatility_text());
                row
            })
            .collect();

        Table { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_volatility(&self) -> bool {
        self.has_volatility
    }

    pub fn records(&self) -> &[VolatilityRecord] {
        &self.records
    }

    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.records.last().map(|record| record.timestamp)
    }

    pub fn price_points(&self) -> Vec<PricePoint> {
        self.records
            .iter()
            .map(|record| PricePoint::new(record.timestamp, record.close))
            .collect()
    }

    pub fn volatility(&self) -> Vec<Option<f64>> {
        self.records.iter().map(|record| record.volatility).collect()
    }

    /// Drops the volatility column, as if it had never been computed.
    pub fn clear_volatility(&mut self) {
        for record in &mut self.records {
            record.volatility = None;
            record.volatility_cell = None;
        }
        self.has_volatility = false;
    }

    /// Replaces the whole volatility column, which from now on exists.
    pub fn set_volatility(&mut self, volatility: &[Option<f64>]) -> Result<()> {
        if volatility.len() != self.records.len() {
            return Err(VolatilityError::MalformedDataset {
                reason: format!(
                    "volatility column has {} values for {} records",
                    volatility.len(),
                    self.records.len()
                ),
            });
        }
        for (record, value) in self.records.iter_mut().zip(volatility) {
            record.volatility = *value;
        }
        self.has_volatility = true;
        Ok(())
    }

    /// Appends the raw records that are newer than the last stored one, with
    /// absent volatility. Cells are matched by column name; columns the raw
    /// feed lacks stay empty. Returns the number of appended records.
    pub fn append_newer(&mut self, raw: &Dataset) -> usize {
        let last = self.last_timestamp();
        let mapping: Vec<Option<usize>> = self
            .headers
            .iter()
            .map(|header| column_index(&raw.headers, header.trim()))
            .collect();

        let mut appended = 0;
        for record in &raw.records {
            if last.is_some_and(|last| record.timestamp <= last) {
                continue;
            }
            let cells = mapping
                .iter()
                .map(|index| {
                    index
                        .and_then(|index| record.cells.get(index).cloned())
                        .unwrap_or_default()
                })
                .collect();
            self.records.push(VolatilityRecord {
                timestamp: record.timestamp,
                close: record.close,
                volatility: None,
                cells,
                volatility_cell: None,
            });
            appended += 1;
        }
        appended
    }
}
