use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// The selectable time span of the charts.
/// Determines both the window length and the bucket granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    /// One Sunday–Saturday week, daily buckets
    #[serde(rename = "1week")]
    OneWeek,
    /// One calendar month, daily buckets
    #[serde(rename = "1month")]
    OneMonth,
    /// Six calendar months, monthly buckets
    #[serde(rename = "6months")]
    SixMonths,
    /// Twelve calendar months, monthly buckets
    #[serde(rename = "1year")]
    OneYear,
}

/// Size of one bucket in a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Day,
    Month,
}

impl Period {
    /// All periods, shortest first.
    pub const ALL: [Period; 4] = [
        Period::OneWeek,
        Period::OneMonth,
        Period::SixMonths,
        Period::OneYear,
    ];

    pub fn granularity(self) -> Granularity {
        match self {
            Period::OneWeek | Period::OneMonth => Granularity::Day,
            Period::SixMonths | Period::OneYear => Granularity::Month,
        }
    }

    /// Number of calendar months covered by month-based periods.
    /// `None` for the week period, which is measured in days.
    pub fn months(self) -> Option<u32> {
        match self {
            Period::OneWeek => None,
            Period::OneMonth => Some(1),
            Period::SixMonths => Some(6),
            Period::OneYear => Some(12),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Period::OneWeek => "1week",
            Period::OneMonth => "1month",
            Period::SixMonths => "6months",
            Period::OneYear => "1year",
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Period {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Period::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| CoreError::Config(format!("Unknown period '{s}'")))
    }
}
