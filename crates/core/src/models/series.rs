use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::period::{Granularity, Period};
use super::window::DateWindow;

/// One aggregated time slot (a day or a month) in a series.
///
/// A bucket with no contributing records is still present: every field
/// maps to `None` and `sample_count` is 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    /// First day of the slot
    pub bucket_start: NaiveDate,

    /// `YYYY-MM-DD` for daily buckets, `YYYY-MM` for monthly ones
    pub key: String,

    /// Averaged value per output field, `None` when nothing was recorded
    pub values: BTreeMap<String, Option<f64>>,

    /// Number of records (across all streams) that landed in this slot
    pub sample_count: usize,
}

impl Bucket {
    pub fn value(&self, field: &str) -> Option<f64> {
        self.values.get(field).copied().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.sample_count == 0
    }
}

/// An ordered, gap-filled sequence of buckets covering a whole window.
///
/// The frontend renders this directly. A series is rebuilt from scratch
/// whenever its inputs change; it is never patched in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub period: Period,
    pub granularity: Granularity,
    pub window: DateWindow,
    pub buckets: Vec<Bucket>,

    /// Records dropped because of a bad timestamp or missing fields
    pub skipped_records: usize,
}

impl Series {
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn keys(&self) -> Vec<&str> {
        self.buckets.iter().map(|b| b.key.as_str()).collect()
    }

    /// Values of one field in bucket order, gaps included.
    pub fn column(&self, field: &str) -> Vec<Option<f64>> {
        self.buckets.iter().map(|b| b.value(field)).collect()
    }

    pub fn bucket(&self, key: &str) -> Option<&Bucket> {
        self.buckets.iter().find(|b| b.key == key)
    }

    /// Most recent non-empty value of a field.
    pub fn latest(&self, field: &str) -> Option<(NaiveDate, f64)> {
        self.buckets
            .iter()
            .rev()
            .find_map(|b| b.value(field).map(|v| (b.bucket_start, v)))
    }

    /// Total records that contributed to any bucket.
    pub fn total_samples(&self) -> usize {
        self.buckets.iter().map(|b| b.sample_count).sum()
    }
}
