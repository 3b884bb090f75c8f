use dotenv::dotenv;
use std::env;
use std::path::PathBuf;

use crate::calc::calculate_volatility::Window;
use crate::error::{Result, VolatilityError};
use crate::util::rounding::Frequency;

pub const DEFAULT_DATA_DIR: &str = "./data.nosync/raw_data";
pub const DEFAULT_DATASET_FILE: &str = "1min_general.csv";
pub const DEFAULT_FREQUENCY: &str = "1D";

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the raw feed and the persisted dataset
    pub data_dir: PathBuf,
    /// Persisted dataset file name inside `data_dir`
    pub dataset_file: String,
    pub frequency: Frequency,
    pub window: Window,
    /// Where to export the reporting series, if anywhere
    pub report_file: Option<PathBuf>,
}

impl Config {
    /// Loads the configuration from the environment (and `.env` if present).
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let data_dir = lookup("VOLATILITY_DATA_DIR").unwrap_or(DEFAULT_DATA_DIR.to_string());
        let dataset_file =
            lookup("VOLATILITY_DATASET_FILE").unwrap_or(DEFAULT_DATASET_FILE.to_string());

        // Resampling code, e.g. 1D for daily or 1W for weekly
        let frequency: Frequency = lookup("VOLATILITY_FREQUENCY")
            .unwrap_or(DEFAULT_FREQUENCY.to_string())
            .parse()?;

        // Estimator window in samples, defaults to one day of minutes
        let window = match lookup("VOLATILITY_WINDOW") {
            Some(value) => {
                let samples = value.trim().parse::<usize>().map_err(|_| VolatilityError::Config {
                    key: "VOLATILITY_WINDOW".to_string(),
                    reason: format!("`{}` is not a valid integer", value),
                })?;
                Window::new(samples)?
            }
            None => Window::default(),
        };

        let report_file = lookup("VOLATILITY_REPORT_FILE")
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            data_dir: PathBuf::from(data_dir),
            dataset_file,
            frequency,
            window,
            report_file,
        })
    }
}
