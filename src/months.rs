use std::fmt;
use std::str::FromStr;

use chrono::{TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::PipelineError;

/// A calendar month. Ordering is lexicographic on (year, month), so later
/// months always compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    pub fn new(year: i32, month: u32) -> Result<Self, PipelineError> {
        if !(1..=12).contains(&month) {
            return Err(PipelineError::InvalidMonth(format!("{year:04}-{month:02}")));
        }
        Ok(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// The following calendar month, wrapping December into January.
    pub fn next(&self) -> Month {
        if self.month == 12 {
            Month {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Month {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// First instant of the month, UTC, in milliseconds since the epoch.
    pub fn start_ms(&self) -> i64 {
        // month is validated at construction, so day 1 always exists
        Utc.with_ymd_and_hms(self.year, self.month, 1, 0, 0, 0)
            .single()
            .expect("first of a valid UTC month")
            .timestamp_millis()
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Month {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PipelineError::InvalidMonth(s.to_string());
        let (y, m) = s.split_once('-').ok_or_else(invalid)?;
        let year = y.parse::<i32>().map_err(|_| invalid())?;
        let month = m.parse::<u32>().map_err(|_| invalid())?;
        Month::new(year, month).map_err(|_| invalid())
    }
}

impl Serialize for Month {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Month {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One month's query window. `end_ms` is the last millisecond of the month,
/// i.e. the next month's `start_ms` minus one.
#[derive(Debug, Clone, Copy)]
pub struct MonthWindow {
    pub month: Month,
    pub start_ms: i64,
    pub end_ms: i64,
}

/// All month windows from `start` through `end` inclusive, ascending.
pub fn months_between(start: Month, end: Month) -> Result<Vec<MonthWindow>, PipelineError> {
    if start > end {
        return Err(PipelineError::InvalidRange { start, end });
    }

    let mut windows = Vec::new();
    let mut current = start;
    loop {
        let next = current.next();
        windows.push(MonthWindow {
            month: current,
            start_ms: current.start_ms(),
            end_ms: next.start_ms() - 1,
        });
        if current == end {
            break;
        }
        current = next;
    }
    Ok(windows)
}
