use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VolatilityError {
    #[error("no 1 minute closing price data found in {}", .dir.display())]
    MissingInput { dir: PathBuf },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing required column `{column}`")]
    MissingColumn { column: String },
    #[error("row {row}: invalid timestamp `{value}` (expected YYYY-MM-DD HH:MM:SS)")]
    InvalidTimestamp { row: usize, value: String },
    #[error("row {row}: invalid price `{value}`")]
    InvalidPrice { row: usize, value: String },
    #[error("row {row}: price must be positive, got {value}")]
    NonPositivePrice { row: usize, value: f64 },
    #[error("row {row}: invalid volatility `{value}`")]
    InvalidVolatility { row: usize, value: String },
    #[error("row {row}: timestamps must be strictly ascending")]
    UnorderedTimestamps { row: usize },
    #[error("malformed dataset: {reason}")]
    MalformedDataset { reason: String },
    #[error("unsupported resampling frequency `{code}`")]
    InvalidFrequency { code: String },
    #[error("invalid configuration for {key}: {reason}")]
    Config { key: String, reason: String },
}

pub type Result<T> = std::result::Result<T, VolatilityError>;
