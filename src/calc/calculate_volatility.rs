use crate::data::price_series::lagged_closes;
use crate::error::{Result, VolatilityError};

/// Minutes in a day, the default estimator window for 1 minute closes.
pub const MINUTES_PER_DAY: usize = 1440;

/// Estimator window: the number of log-return samples behind each value.
///
/// Producing `samples` log returns consumes one extra close for the lag, so
/// the rolling computation reads `read_window() == samples() + 1` closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    samples: usize,
}

impl Window {
    /// A sample standard deviation needs at least two observations.
    pub fn new(samples: usize) -> Result<Self> {
        if samples < 2 {
            return Err(VolatilityError::Config {
                key: "window".to_string(),
                reason: format!("must be at least 2 samples, got {}", samples),
            });
        }
        Ok(Self { samples })
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    pub fn read_window(&self) -> usize {
        self.samples + 1
    }
}

impl Default for Window {
    fn default() -> Self {
        Self {
            samples: MINUTES_PER_DAY,
        }
    }
}

/// Volatility of the trailing `window.read_window()` closes:
/// `stdev(ln(lag_close / close)) * sqrt(window)` with the n - 1 denominator.
///
/// Returns `None` when fewer closes are available. Prices must be positive.
pub fn calculate_volatility(closes: &[f64], window: Window) -> Option<f64> {
    let read_window = window.read_window();
    if closes.len() < read_window {
        return None;
    }
    let trailing = &closes[closes.len() - read_window..];

    // Log returns of each close against the one before it
    let returns: Vec<f64> = lagged_closes(trailing)
        .into_iter()
        .map(|(lag_close, close)| (lag_close / close).ln())
        .collect();
    let n = returns.len();

    // Calculate mean
    let mean = returns.iter().sum::<f64>() / n as f64;

    // Calculate variance
    let variance = returns.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;

    // Scale the per-minute deviation to the window's timescale
    Some(variance.sqrt() * (window.samples() as f64).sqrt())
}

/// Applies the estimator at every position of `closes`.
///
/// Position `p` gets a value only when the `read_window` closes ending at `p`
/// are all present; earlier positions and windows touching a missing close are
/// `None`.
pub fn rolling_volatility(closes: &[Option<f64>], window: Window) -> Vec<Option<f64>> {
    let read_window = window.read_window();
    let mut buffer: Vec<f64> = Vec::with_capacity(read_window);

    (0..closes.len())
        .map(|position| {
            if position + 1 < read_window {
                return None;
            }
            let start = position + 1 - read_window;

            buffer.clear();
            for close in &closes[start..=position] {
                buffer.push((*close)?);
            }
            calculate_volatility(&buffer, window)
        })
        .collect()
}
