use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveDateTime};
use std::fmt;
use std::str::FromStr;

use crate::error::VolatilityError;

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 60 * SECONDS_PER_MINUTE;
const SECONDS_PER_DAY: i64 = 24 * SECONDS_PER_HOUR;
const SECONDS_PER_WEEK: i64 = 7 * SECONDS_PER_DAY;

// 1970-01-05 was the first Monday after the Unix epoch
const FIRST_MONDAY_OFFSET: i64 = 4 * SECONDS_PER_DAY;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Minute,
    Hour,
    Day,
    Week,
    Month,
}

/// A calendar bucket size such as `1D`, `4H`, `1W` or `1M`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frequency {
    pub multiple: u32,
    pub period: Period,
}

impl Frequency {
    pub fn new(multiple: u32, period: Period) -> Self {
        Self { multiple, period }
    }

    /// Fixed bucket length in seconds, `None` for calendar months.
    fn fixed_seconds(&self) -> Option<i64> {
        let unit = match self.period {
            Period::Minute => SECONDS_PER_MINUTE,
            Period::Hour => SECONDS_PER_HOUR,
            Period::Day => SECONDS_PER_DAY,
            Period::Week => SECONDS_PER_WEEK,
            Period::Month => return None,
        };
        Some(unit * i64::from(self.multiple))
    }
}

impl FromStr for Frequency {
    type Err = VolatilityError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        let invalid = || VolatilityError::InvalidFrequency {
            code: code.to_string(),
        };

        let trimmed = code.trim();
        let split = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(invalid)?;
        let (digits, unit) = trimmed.split_at(split);

        // A bare unit ("D", "W") means a multiple of one
        let multiple = if digits.is_empty() {
            1
        } else {
            digits.parse::<u32>().map_err(|_| invalid())?
        };
        if multiple == 0 {
            return Err(invalid());
        }

        let period = match unit {
            "T" | "min" => Period::Minute,
            "H" | "h" => Period::Hour,
            "D" | "d" => Period::Day,
            "W" | "w" => Period::Week,
            "M" | "MS" => Period::Month,
            _ => return Err(invalid()),
        };

        Ok(Frequency::new(multiple, period))
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self.period {
            Period::Minute => "min",
            Period::Hour => "H",
            Period::Day => "D",
            Period::Week => "W",
            Period::Month => "M",
        };
        write!(f, "{}{}", self.multiple, unit)
    }
}

/// Rounds the timestamp down to the start of its bucket at `frequency`.
///
/// Minute, hour and day buckets are aligned to the Unix epoch, week buckets to
/// Monday 00:00 and month buckets to January of year 0. Returns `None` only when
/// the bucket start falls outside chrono's representable range.
pub fn round_to_period(timestamp: NaiveDateTime, frequency: Frequency) -> Option<NaiveDateTime> {
    match frequency.fixed_seconds() {
        Some(bucket) => {
            let anchor = if frequency.period == Period::Week {
                FIRST_MONDAY_OFFSET
            } else {
                0
            };
            let seconds = timestamp.and_utc().timestamp() - anchor;
            let floored = seconds.div_euclid(bucket) * bucket + anchor;
            DateTime::from_timestamp(floored, 0).map(|dt| dt.naive_utc())
        }
        None => {
            let multiple = i64::from(frequency.multiple);
            let months = i64::from(timestamp.year()) * 12 + i64::from(timestamp.month0());
            let floored = months.div_euclid(multiple) * multiple;
            let year = i32::try_from(floored.div_euclid(12)).ok()?;
            let month = u32::try_from(floored.rem_euclid(12)).ok()? + 1;
            NaiveDate::from_ymd_opt(year, month, 1)?.and_hms_opt(0, 0, 0)
        }
    }
}

/// Start of the bucket following the one starting at `bucket_start`.
pub fn next_period(bucket_start: NaiveDateTime, frequency: Frequency) -> Option<NaiveDateTime> {
    match frequency.fixed_seconds() {
        Some(bucket) => bucket_start.checked_add_signed(chrono::Duration::seconds(bucket)),
        None => bucket_start.checked_add_months(Months::new(frequency.multiple)),
    }
}
