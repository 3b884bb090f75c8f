use chrono::NaiveDateTime;

use crate::error::{Result, VolatilityError};

/// One raw minute bar. A `None` close is a missing quote to be forward-filled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub timestamp: NaiveDateTime,
    pub close: Option<f64>,
}

impl PricePoint {
    pub fn new(timestamp: NaiveDateTime, close: Option<f64>) -> Self {
        Self { timestamp, close }
    }
}

/// Forward-filled closing prices of an ascending minute series.
///
/// After construction every close is present except a possible leading prefix
/// that precedes the first quote.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    closes: Vec<Option<f64>>,
}

impl PriceSeries {
    /// Builds the series, rejecting unordered timestamps and non-positive prices.
    ///
    /// An empty input gives an empty series.
    pub fn from_points(points: &[PricePoint]) -> Result<Self> {
        let mut previous: Option<NaiveDateTime> = None;
        let mut closes = Vec::with_capacity(points.len());
        let mut last_close: Option<f64> = None;

        for (row, point) in points.iter().enumerate() {
            if previous.is_some_and(|previous| point.timestamp <= previous) {
                return Err(VolatilityError::UnorderedTimestamps { row: row + 1 });
            }
            previous = Some(point.timestamp);

            if let Some(close) = point.close {
                if !close.is_finite() || close <= 0.0 {
                    return Err(VolatilityError::NonPositivePrice {
                        row: row + 1,
                        value: close,
                    });
                }
                last_close = Some(close);
            }

            // Forward-fill with the most recent known price
            closes.push(point.close.or(last_close));
        }

        Ok(Self { closes })
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.closes.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    pub fn closes(&self) -> &[Option<f64>] {
        &self.closes
    }
}

/// Pairs every close with the previous one as `(lag_close, close)`.
///
/// The lag is back-filled at the start and the first row is then dropped, so a
/// slice of `n` closes yields `n - 1` pairs.
pub fn lagged_closes(closes: &[f64]) -> Vec<(f64, f64)> {
    closes.windows(2).map(|pair| (pair[0], pair[1])).collect()
}
