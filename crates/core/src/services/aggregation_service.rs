use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::errors::CoreError;
use crate::models::chart::{SeriesSpec, StreamSpec};
use crate::models::period::{Granularity, Period};
use crate::models::record::VitalRecord;
use crate::models::series::{Bucket, Series};
use crate::models::window::DateWindow;
use crate::services::window_service::{first_of_month, month_index};

/// Running arithmetic mean of one field in one bucket.
///
/// Keeps the exact sum rather than the rounded average, so
/// `(a·n + v) / (n + 1)` never accumulates rounding error and the final
/// value does not depend on the order samples arrive in.
#[derive(Debug, Clone, Copy, Default)]
struct RunningMean {
    sum: f64,
    count: u32,
}

impl RunningMean {
    fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / f64::from(self.count))
    }
}

#[derive(Debug, Default)]
struct BucketAccumulator {
    fields: HashMap<String, RunningMean>,
    samples: usize,
}

/// Buckets and averages raw records into gap-filled series.
///
/// One engine serves every chart: the per-chart differences live entirely
/// in the [`SeriesSpec`] (which streams, which fields, what precision).
/// Cost is one pass over the records plus one pass over the window.
pub struct AggregationService;

impl AggregationService {
    pub fn new() -> Self {
        Self
    }

    /// Aggregate a single record stream (the first stream of `spec`).
    pub fn aggregate(
        &self,
        records: &[VitalRecord],
        window: DateWindow,
        period: Period,
        spec: &SeriesSpec,
    ) -> Series {
        self.aggregate_streams(&[records], window, period, spec)
    }

    /// Aggregate several record streams into one series sharing a single
    /// bucket key set.
    ///
    /// `streams[i]` holds the records for `spec.streams[i]`; streams without
    /// records are treated as empty. Each output bucket has one value per
    /// column of `spec`:
    /// 1. Records with an unparseable timestamp or a missing required field
    ///    are skipped (and counted), never failing the batch
    /// 2. Records outside `window` are ignored
    /// 3. Each field is averaged per bucket and rounded to `spec.precision`
    /// 4. Every day/month of the window gets a bucket, empty ones with `None`
    pub fn aggregate_streams(
        &self,
        streams: &[&[VitalRecord]],
        window: DateWindow,
        period: Period,
        spec: &SeriesSpec,
    ) -> Series {
        let granularity = period.granularity();
        let mut accumulators: HashMap<NaiveDate, BucketAccumulator> = HashMap::new();
        let mut skipped = 0;

        for (stream, records) in spec.streams.iter().zip(streams) {
            for record in *records {
                match Self::extract(stream, record) {
                    Ok((date, values)) => {
                        if !window.contains(date) {
                            continue;
                        }
                        let acc = accumulators
                            .entry(bucket_start(date, granularity))
                            .or_default();
                        acc.samples += 1;
                        for (field, value) in values {
                            acc.fields.entry(field.to_string()).or_default().push(value);
                        }
                    }
                    Err(e) => {
                        debug!(vital = %stream.vital, error = %e, "skipping record");
                        skipped += 1;
                    }
                }
            }
        }

        let columns = spec.columns();
        let buckets: Vec<Bucket> = bucket_starts(window, granularity)
            .map(|start| {
                let acc = accumulators.get(&start);
                let values = columns
                    .iter()
                    .map(|field| {
                        let value = acc
                            .and_then(|a| a.fields.get(*field))
                            .and_then(RunningMean::mean)
                            .map(|mean| round_to(mean, spec.precision));
                        (field.to_string(), value)
                    })
                    .collect::<BTreeMap<_, _>>();
                Bucket {
                    bucket_start: start,
                    key: bucket_key(start, granularity),
                    values,
                    sample_count: acc.map_or(0, |a| a.samples),
                }
            })
            .collect();

        debug!(
            %period,
            %window,
            buckets = buckets.len(),
            filled = accumulators.len(),
            skipped,
            "aggregated series"
        );

        Series {
            period,
            granularity,
            window,
            buckets,
            skipped_records: skipped,
        }
    }

    /// Pull the timestamp and the configured numeric fields out of a record.
    fn extract<'a>(
        stream: &'a StreamSpec,
        record: &VitalRecord,
    ) -> Result<(NaiveDate, Vec<(&'a str, f64)>), CoreError> {
        let date = record.timestamp()?.date();
        let mut values = Vec::with_capacity(stream.required.len() + stream.optional.len());

        for field in &stream.required {
            let value = record.numeric(field).ok_or_else(|| {
                CoreError::MalformedRecord(format!(
                    "record at '{}' has no numeric '{field}'",
                    record.recorded_at
                ))
            })?;
            values.push((field.as_str(), value));
        }
        for field in &stream.optional {
            if let Some(value) = record.numeric(field) {
                values.push((field.as_str(), value));
            }
        }

        Ok((date, values))
    }
}

impl Default for AggregationService {
    fn default() -> Self {
        Self::new()
    }
}

/// First day of the bucket that `date` falls into.
pub fn bucket_start(date: NaiveDate, granularity: Granularity) -> NaiveDate {
    match granularity {
        Granularity::Day => date,
        Granularity::Month => date.with_day(1).unwrap_or(date),
    }
}

/// `YYYY-MM-DD` for daily buckets, `YYYY-MM` for monthly ones.
pub fn bucket_key(start: NaiveDate, granularity: Granularity) -> String {
    match granularity {
        Granularity::Day => start.format("%Y-%m-%d").to_string(),
        Granularity::Month => start.format("%Y-%m").to_string(),
    }
}

/// Start of every bucket touching `window`, in chronological order.
pub fn bucket_starts(
    window: DateWindow,
    granularity: Granularity,
) -> impl Iterator<Item = NaiveDate> {
    let first = bucket_start(window.start_date, granularity);
    std::iter::successors(Some(first), move |current| match granularity {
        Granularity::Day => current.succ_opt(),
        Granularity::Month => first_of_month(month_index(*current) + 1),
    })
    .take_while(move |start| *start <= window.end_date)
}

/// Round to `precision` decimal places.
pub fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}
