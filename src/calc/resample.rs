use chrono::NaiveDateTime;
use std::collections::BTreeMap;

use crate::error::{Result, VolatilityError};
use crate::util::rounding::{next_period, round_to_period, Frequency};

/// Mean volatility of one calendar bucket, labelled by the bucket start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportBucket {
    pub start: NaiveDateTime,
    pub volatility: Option<f64>,
}

/// Lower resolution view of the per-minute volatility series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportingSeries {
    pub buckets: Vec<ReportBucket>,
}

impl ReportingSeries {
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    #[cfg(test)]
    pub fn get(&self, start: NaiveDateTime) -> Option<Option<f64>> {
        self.buckets
            .iter()
            .find(|bucket| bucket.start == start)
            .map(|bucket| bucket.volatility)
    }
}

/// Groups `(timestamp, volatility)` pairs into buckets at `frequency` and
/// reduces each bucket to the mean of its present values.
///
/// Every bucket between the first and the last timestamp is reported; a bucket
/// without computed values has a `None` mean.
pub fn resample_mean(
    timestamps: &[NaiveDateTime],
    volatility: &[Option<f64>],
    frequency: Frequency,
) -> Result<ReportingSeries> {
    let out_of_range = |timestamp: NaiveDateTime| VolatilityError::MalformedDataset {
        reason: format!("{} cannot be grouped at {}", timestamp, frequency),
    };

    let mut sums: BTreeMap<NaiveDateTime, (f64, usize)> = BTreeMap::new();
    for (timestamp, value) in timestamps.iter().zip(volatility) {
        let start = round_to_period(*timestamp, frequency).ok_or_else(|| out_of_range(*timestamp))?;
        let entry = sums.entry(start).or_insert((0.0, 0));
        if let Some(value) = value.filter(|value| value.is_finite()) {
            entry.0 += value;
            entry.1 += 1;
        }
    }

    let (first, last) = match (sums.keys().next(), sums.keys().next_back()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Ok(ReportingSeries::default()),
    };

    // Walk the calendar so empty buckets show up as absent
    let mut buckets = Vec::with_capacity(sums.len());
    let mut start = first;
    while start <= last {
        let volatility = sums
            .get(&start)
            .filter(|(_, count)| *count > 0)
            .map(|(sum, count)| sum / *count as f64);
        buckets.push(ReportBucket { start, volatility });
        start = next_period(start, frequency).ok_or_else(|| out_of_range(start))?;
    }

    Ok(ReportingSeries { buckets })
}
