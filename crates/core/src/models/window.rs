use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// An inclusive range of calendar days.
///
/// Invariant: `start_date <= end_date`. The only way to build one is
/// through [`DateWindow::new`], which enforces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DateWindow {
    /// First day in the window
    pub start_date: NaiveDate,

    /// Last day in the window (inclusive)
    pub end_date: NaiveDate,
}

impl DateWindow {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Result<Self, CoreError> {
        if start_date > end_date {
            return Err(CoreError::InvalidWindow {
                start: start_date,
                end: end_date,
            });
        }
        Ok(Self {
            start_date,
            end_date,
        })
    }

    /// Build a window from two dates in either order.
    pub fn spanning(a: NaiveDate, b: NaiveDate) -> Self {
        Self {
            start_date: a.min(b),
            end_date: a.max(b),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// True when `other` lies entirely inside this window.
    pub fn covers(&self, other: &DateWindow) -> bool {
        self.contains(other.start_date) && self.contains(other.end_date)
    }

    /// Number of days in the window, both ends included.
    pub fn num_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    /// Smallest window containing both `self` and `other`.
    pub fn union(&self, other: &DateWindow) -> DateWindow {
        DateWindow {
            start_date: self.start_date.min(other.start_date),
            end_date: self.end_date.max(other.end_date),
        }
    }
}

impl std::fmt::Display for DateWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..={}", self.start_date, self.end_date)
    }
}

// Deserialization goes through `new` so the ordering invariant holds for
// windows coming from JSON as well.
impl<'de> Deserialize<'de> for DateWindow {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            start_date: NaiveDate,
            end_date: NaiveDate,
        }

        let raw = Raw::deserialize(deserializer)?;
        DateWindow::new(raw.start_date, raw.end_date).map_err(serde::de::Error::custom)
    }
}
