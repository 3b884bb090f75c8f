use log::{debug, info, warn};

use super::calculate_volatility::{rolling_volatility, Window};
use super::resample::{resample_mean, ReportingSeries};
use crate::data::dataset::Dataset;
use crate::data::price_series::PriceSeries;
use crate::data::store::{discover_raw_feed, DataStore};
use crate::error::{Result, VolatilityError};
use crate::util::rounding::Frequency;

/// Where volatility computation has to resume in a persisted dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Boundary {
    /// Position of the first absent value at or after the read window offset.
    Found(usize),
    /// Every position past the offset already holds a value.
    NotFound,
    /// The stored volatility cannot be trusted.
    Malformed(String),
}

/// What a run did to the persisted dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// No volatility column existed; the whole series was computed.
    FullRecompute { computed: usize },
    /// Values from `boundary` onwards were filled in.
    PartialUpdate { boundary: usize, filled: usize },
    /// Nothing to compute.
    UpToDate,
}

#[derive(Debug, Clone)]
pub struct UpdateReport {
    pub outcome: UpdateOutcome,
    /// Raw records appended to the persisted dataset during this run.
    pub appended: usize,
    /// Whether the persisted dataset was rewritten.
    pub written: bool,
    pub dataset: Dataset,
    pub report: ReportingSeries,
}

/// Finds the first absent volatility at or after the scan offset.
///
/// The offset is `window.read_window()`, pushed later by a leading run of
/// missing closes: positions before the first full window of quotes are
/// expected to be absent and are not scanned.
pub fn detect_boundary(dataset: &Dataset, window: Window) -> Boundary {
    if !dataset.has_volatility() {
        return Boundary::Malformed("dataset has no Volatility column".to_string());
    }

    let records = dataset.records();
    if let Some(row) = records
        .windows(2)
        .position(|pair| pair[1].timestamp <= pair[0].timestamp)
    {
        return Boundary::Malformed(format!("timestamps are not ascending at row {}", row + 2));
    }

    if let Some((row, value)) = records.iter().enumerate().find_map(|(row, record)| {
        record
            .volatility
            .filter(|value| !value.is_finite() || *value < 0.0)
            .map(|value| (row, value))
    }) {
        return Boundary::Malformed(format!("invalid volatility {} at row {}", value, row + 1));
    }

    // Nothing is computable before a full read window of quoted closes
    let first_close = match records.iter().position(|record| record.close.is_some()) {
        Some(first_close) => first_close,
        None => return Boundary::NotFound,
    };
    let offset = window
        .read_window()
        .max(first_close + window.read_window() - 1);

    records
        .iter()
        .enumerate()
        .skip(offset)
        .find(|(_, record)| record.volatility.is_none())
        .map(|(index, _)| Boundary::Found(index))
        .unwrap_or(Boundary::NotFound)
}

/// Combines the stored column with freshly computed values that start at
/// position `offset`: the stored value wins where present, otherwise the
/// fresh one, otherwise absent.
pub fn merge_volatility(
    stored: &[Option<f64>],
    fresh: &[Option<f64>],
    offset: usize,
) -> Vec<Option<f64>> {
    stored
        .iter()
        .enumerate()
        .map(|(position, value)| {
            value.or_else(|| {
                position
                    .checked_sub(offset)
                    .and_then(|local| fresh.get(local).copied().flatten())
            })
        })
        .collect()
}

/// Keeps the persisted volatility column of a minute price dataset current.
pub struct IncrementalUpdater<S: DataStore> {
    store: S,
    dataset_file: String,
    window: Window,
    frequency: Frequency,
}

impl<S: DataStore> IncrementalUpdater<S> {
    pub fn new(store: S, dataset_file: impl Into<String>, window: Window, frequency: Frequency) -> Self {
        Self {
            store,
            dataset_file: dataset_file.into(),
            window,
            frequency,
        }
    }

    #[cfg(test)]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[cfg(test)]
    pub fn into_store(self) -> S {
        self.store
    }

    /// One batch run: load, compute what is missing, persist, and report.
    ///
    /// Fails with `MissingInput` before touching any file when there is no
    /// minute price data.
    pub fn run(&mut self) -> Result<UpdateReport> {
        let (mut dataset, appended) = self.load()?;

        let outcome = if dataset.has_volatility() {
            info!("There is volatility. Checking if an update is needed...");
            match detect_boundary(&dataset, self.window) {
                Boundary::Found(index) => {
                    info!("First missing volatility is at position {}", index);
                    let filled = self.update_from(&mut dataset, index)?;
                    UpdateOutcome::PartialUpdate {
                        boundary: index,
                        filled,
                    }
                }
                Boundary::NotFound => {
                    info!("Seems you are up to date! No missing volatility found.");
                    UpdateOutcome::UpToDate
                }
                Boundary::Malformed(reason) => {
                    warn!("Cannot detect the update boundary: {}", reason);
                    return Err(VolatilityError::MalformedDataset { reason });
                }
            }
        } else {
            info!("Calculating volatility from scratch!");
            let computed = self.compute_full(&mut dataset)?;
            UpdateOutcome::FullRecompute { computed }
        };

        // Nothing changed unless values were computed or raw records appended
        let written = match outcome {
            UpdateOutcome::FullRecompute { .. } => true,
            UpdateOutcome::PartialUpdate { filled, .. } => filled > 0 || appended > 0,
            UpdateOutcome::UpToDate => appended > 0,
        };
        if written {
            self.store
                .write_table(&self.dataset_file, &dataset.to_table())?;
            info!("Volatility written to {}", self.dataset_file);
        }

        let timestamps: Vec<_> = dataset.records().iter().map(|record| record.timestamp).collect();
        let report = resample_mean(&timestamps, &dataset.volatility(), self.frequency)?;

        Ok(UpdateReport {
            outcome,
            appended,
            written,
            dataset,
            report,
        })
    }

    /// Reads the persisted dataset (creating it from the raw feed on the first
    /// run) and appends raw records newer than its last timestamp.
    fn load(&self) -> Result<(Dataset, usize)> {
        let missing = || VolatilityError::MissingInput {
            dir: self.store.location(),
        };

        let candidates = self.store.list_candidates()?;
        let raw_name = discover_raw_feed(&candidates, &self.dataset_file).ok_or_else(missing)?;
        info!("Perfect! You have a file containing 1min closing price data: {}", raw_name);

        let raw = self.read_dataset(&raw_name)?.ok_or_else(missing)?;
        if raw.is_empty() {
            return Err(missing());
        }

        if raw_name == self.dataset_file {
            return Ok((raw, 0));
        }

        match self.read_dataset(&self.dataset_file)? {
            Some(mut dataset) => {
                let appended = dataset.append_newer(&raw);
                if appended > 0 {
                    info!("Appended {} new records from {}", appended, raw_name);
                }
                Ok((dataset, appended))
            }
            None => {
                let mut dataset = raw;
                dataset.clear_volatility();
                Ok((dataset, 0))
            }
        }
    }

    fn read_dataset(&self, name: &str) -> Result<Option<Dataset>> {
        self.store
            .read_table(name)?
            .as_ref()
            .map(Dataset::from_table)
            .transpose()
    }

    fn compute_full(&self, dataset: &mut Dataset) -> Result<usize> {
        let series = PriceSeries::from_points(&dataset.price_points())?;
        let volatility = rolling_volatility(series.closes(), self.window);
        let computed = volatility.iter().filter(|value| value.is_some()).count();

        dataset.set_volatility(&volatility)?;
        Ok(computed)
    }

    /// Recomputes from `index - read_window` to the end and merges the result
    /// into the stored column. Returns how many absent values were filled.
    fn update_from(&self, dataset: &mut Dataset, index: usize) -> Result<usize> {
        let series = PriceSeries::from_points(&dataset.price_points())?;
        let start = index.saturating_sub(self.window.read_window());

        let fresh = rolling_volatility(&series.closes()[start..], self.window);
        debug!(
            "Recomputed {} positions starting at {}",
            fresh.len(),
            start
        );

        let stored = dataset.volatility();
        let merged = merge_volatility(&stored, &fresh, start);
        let filled = stored
            .iter()
            .zip(&merged)
            .filter(|(old, new)| old.is_none() && new.is_some())
            .count();

        dataset.set_volatility(&merged)?;
        Ok(filled)
    }
}

