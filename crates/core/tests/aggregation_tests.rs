use chrono::NaiveDate;
use proptest::prelude::*;
use vitals_chart_core::models::chart::{ChartKind, SeriesSpec, StreamSpec};
use vitals_chart_core::models::period::{Granularity, Period};
use vitals_chart_core::models::record::{VitalRecord, VitalType};
use vitals_chart_core::models::window::DateWindow;
use vitals_chart_core::services::aggregation_service::{round_to, AggregationService};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn window(a: NaiveDate, b: NaiveDate) -> DateWindow {
    DateWindow::new(a, b).unwrap()
}

fn bp(at: &str, systolic: f64, diastolic: f64) -> VitalRecord {
    VitalRecord::new(at)
        .with_value("systolic", systolic)
        .with_value("diastolic", diastolic)
}

fn single(at: &str, field: &str, value: f64) -> VitalRecord {
    VitalRecord::new(at).with_value(field, value)
}

fn systolic_spec() -> SeriesSpec {
    SeriesSpec {
        streams: vec![StreamSpec {
            vital: VitalType::BloodPressure,
            required: vec!["systolic".into()],
            optional: vec![],
        }],
        precision: 1,
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Averaging
// ═══════════════════════════════════════════════════════════════════

mod averaging {
    use super::*;

    #[test]
    fn two_readings_on_one_day_average_into_one_bucket() {
        let records = vec![
            single("2024-01-03T08:00", "systolic", 120.0),
            single("2024-01-03T20:00", "systolic", 130.0),
        ];
        let series = AggregationService::new().aggregate(
            &records,
            window(d(2024, 1, 1), d(2024, 1, 7)),
            Period::OneWeek,
            &systolic_spec(),
        );

        assert_eq!(series.len(), 7);
        let jan3 = series.bucket("2024-01-03").unwrap();
        assert_eq!(jan3.value("systolic"), Some(125.0));
        assert_eq!(jan3.sample_count, 2);

        let others: Vec<_> = series
            .buckets
            .iter()
            .filter(|b| b.key != "2024-01-03")
            .collect();
        assert_eq!(others.len(), 6);
        for bucket in others {
            assert_eq!(bucket.values.get("systolic"), Some(&None));
            assert_eq!(bucket.sample_count, 0);
        }
    }

    #[test]
    fn averages_round_to_one_decimal() {
        let records = vec![
            single("2024-01-03T08:00", "systolic", 120.0),
            single("2024-01-03T12:00", "systolic", 121.0),
            single("2024-01-03T20:00", "systolic", 121.0),
        ];
        let series = AggregationService::new().aggregate(
            &records,
            window(d(2024, 1, 1), d(2024, 1, 7)),
            Period::OneWeek,
            &systolic_spec(),
        );
        assert_eq!(series.bucket("2024-01-03").unwrap().value("systolic"), Some(120.7));
    }

    #[test]
    fn precision_is_configurable() {
        let records = vec![
            single("2024-01-03T08:00", "systolic", 120.0),
            single("2024-01-03T12:00", "systolic", 121.0),
            single("2024-01-03T20:00", "systolic", 121.0),
        ];
        let spec = SeriesSpec {
            precision: 2,
            ..systolic_spec()
        };
        let series = AggregationService::new().aggregate(
            &records,
            window(d(2024, 1, 1), d(2024, 1, 7)),
            Period::OneWeek,
            &spec,
        );
        assert_eq!(series.bucket("2024-01-03").unwrap().value("systolic"), Some(120.67));
    }

    #[test]
    fn monthly_buckets_average_the_whole_month() {
        let records = vec![
            single("2024-04-02T08:00", "weight", 80.0),
            single("2024-04-20T08:00", "weight", 81.0),
            single("2024-04-30T23:59", "weight", 82.0),
            single("2024-05-01T00:00", "weight", 70.0),
        ];
        let series = AggregationService::new().aggregate(
            &records,
            window(d(2024, 4, 1), d(2024, 9, 30)),
            Period::SixMonths,
            &SeriesSpec::single(VitalType::Weight, 1),
        );

        assert_eq!(series.granularity, Granularity::Month);
        assert_eq!(series.bucket("2024-04").unwrap().value("weight"), Some(81.0));
        assert_eq!(series.bucket("2024-05").unwrap().value("weight"), Some(70.0));
        assert_eq!(series.bucket("2024-06").unwrap().value("weight"), None);
    }

    #[test]
    fn round_to_helper() {
        assert_eq!(round_to(125.0, 1), 125.0);
        assert_eq!(round_to(36.66, 1), 36.7);
        assert_eq!(round_to(36.64, 1), 36.6);
        assert_eq!(round_to(97.5, 0), 98.0);
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Gap filling / bucket completeness
// ═══════════════════════════════════════════════════════════════════

mod completeness {
    use super::*;

    #[test]
    fn week_without_records_has_seven_null_buckets() {
        let series = AggregationService::new().aggregate(
            &[],
            window(d(2024, 1, 7), d(2024, 1, 13)),
            Period::OneWeek,
            &systolic_spec(),
        );
        assert_eq!(series.len(), 7);
        assert!(series.buckets.iter().all(|b| b.value("systolic").is_none()));
        assert_eq!(series.total_samples(), 0);
        assert_eq!(series.keys().first(), Some(&"2024-01-07"));
        assert_eq!(series.keys().last(), Some(&"2024-01-13"));
    }

    #[test]
    fn leap_february_has_twenty_nine_buckets() {
        let series = AggregationService::new().aggregate(
            &[],
            window(d(2024, 2, 1), d(2024, 2, 29)),
            Period::OneMonth,
            &systolic_spec(),
        );
        assert_eq!(series.len(), 29);
    }

    #[test]
    fn april_to_september_has_six_monthly_buckets() {
        let series = AggregationService::new().aggregate(
            &[],
            window(d(2024, 4, 1), d(2024, 9, 30)),
            Period::SixMonths,
            &systolic_spec(),
        );
        assert_eq!(
            series.keys(),
            vec!["2024-04", "2024-05", "2024-06", "2024-07", "2024-08", "2024-09"]
        );
    }

    #[test]
    fn year_has_twelve_monthly_buckets_across_year_end() {
        let series = AggregationService::new().aggregate(
            &[single("2024-01-15T10:00", "systolic", 118.0)],
            window(d(2023, 10, 1), d(2024, 9, 30)),
            Period::OneYear,
            &systolic_spec(),
        );
        assert_eq!(series.len(), 12);
        assert_eq!(series.keys()[3], "2024-01");
        assert_eq!(series.buckets[3].value("systolic"), Some(118.0));
    }

    #[test]
    fn partial_month_window_still_gets_its_bucket() {
        // A zoomed window that starts and ends mid-month
        let series = AggregationService::new().aggregate(
            &[],
            window(d(2024, 3, 20), d(2024, 5, 3)),
            Period::OneYear,
            &systolic_spec(),
        );
        assert_eq!(series.keys(), vec!["2024-03", "2024-04", "2024-05"]);
        assert_eq!(series.buckets[0].bucket_start, d(2024, 3, 1));
    }

    #[test]
    fn buckets_are_chronological() {
        let series = AggregationService::new().aggregate(
            &[],
            window(d(2023, 12, 25), d(2024, 1, 5)),
            Period::OneMonth,
            &systolic_spec(),
        );
        assert!(series
            .buckets
            .windows(2)
            .all(|pair| pair[0].bucket_start < pair[1].bucket_start));
    }

    #[test]
    fn null_values_serialize_as_null() {
        let series = AggregationService::new().aggregate(
            &[],
            window(d(2024, 1, 7), d(2024, 1, 7)),
            Period::OneWeek,
            &systolic_spec(),
        );
        let json = serde_json::to_value(&series).unwrap();
        assert_eq!(json["buckets"][0]["values"]["systolic"], serde_json::Value::Null);
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Filtering and malformed records
// ═══════════════════════════════════════════════════════════════════

mod filtering {
    use super::*;

    #[test]
    fn records_outside_window_are_ignored() {
        let records = vec![
            single("2023-12-31T23:59", "systolic", 200.0),
            single("2024-01-07T00:00", "systolic", 110.0),
            single("2024-01-13T23:59:59", "systolic", 112.0),
            single("2024-01-14T00:00", "systolic", 200.0),
        ];
        let series = AggregationService::new().aggregate(
            &records,
            window(d(2024, 1, 7), d(2024, 1, 13)),
            Period::OneWeek,
            &systolic_spec(),
        );
        assert_eq!(series.total_samples(), 2);
        assert_eq!(series.bucket("2024-01-07").unwrap().value("systolic"), Some(110.0));
        assert_eq!(series.bucket("2024-01-13").unwrap().value("systolic"), Some(112.0));
        assert_eq!(series.skipped_records, 0);
    }

    #[test]
    fn malformed_timestamp_skips_only_that_record() {
        let records = vec![
            single("not a date", "systolic", 500.0),
            single("2024-01-08T09:00", "systolic", 118.0),
        ];
        let series = AggregationService::new().aggregate(
            &records,
            window(d(2024, 1, 7), d(2024, 1, 13)),
            Period::OneWeek,
            &systolic_spec(),
        );
        assert_eq!(series.skipped_records, 1);
        assert_eq!(series.bucket("2024-01-08").unwrap().value("systolic"), Some(118.0));
        assert_eq!(series.total_samples(), 1);
    }

    #[test]
    fn missing_required_field_skips_record() {
        let records = vec![
            VitalRecord::new("2024-01-08T09:00").with_value("systolic", 120.0),
            bp("2024-01-08T10:00", 130.0, 85.0),
        ];
        let series = AggregationService::new().aggregate(
            &records,
            window(d(2024, 1, 7), d(2024, 1, 13)),
            Period::OneWeek,
            &ChartKind::BloodPressure.series_spec(1),
        );
        let jan8 = series.bucket("2024-01-08").unwrap();
        assert_eq!(jan8.value("systolic"), Some(130.0));
        assert_eq!(jan8.value("diastolic"), Some(85.0));
        assert_eq!(series.skipped_records, 1);
    }

    #[test]
    fn optional_field_absent_does_not_skip() {
        let spec = SeriesSpec {
            streams: vec![StreamSpec {
                vital: VitalType::BloodPressure,
                required: vec!["systolic".into(), "diastolic".into()],
                optional: vec!["pulse".into()],
            }],
            precision: 1,
        };
        let records = vec![
            bp("2024-01-08T09:00", 120.0, 80.0).with_value("pulse", 70.0),
            bp("2024-01-08T10:00", 124.0, 82.0),
        ];
        let series = AggregationService::new().aggregate(
            &records,
            window(d(2024, 1, 7), d(2024, 1, 13)),
            Period::OneWeek,
            &spec,
        );
        let jan8 = series.bucket("2024-01-08").unwrap();
        assert_eq!(jan8.value("systolic"), Some(122.0));
        assert_eq!(jan8.value("pulse"), Some(70.0));
        assert_eq!(jan8.sample_count, 2);
        assert_eq!(series.skipped_records, 0);
    }

    #[test]
    fn decimal_strings_count_as_numbers() {
        let record: VitalRecord = serde_json::from_value(serde_json::json!({
            "recorded_at": "2024-01-09T07:30:00Z",
            "temperature": "36.6"
        }))
        .unwrap();
        let series = AggregationService::new().aggregate(
            &[record],
            window(d(2024, 1, 7), d(2024, 1, 13)),
            Period::OneWeek,
            &SeriesSpec::single(VitalType::Temperature, 1),
        );
        assert_eq!(series.bucket("2024-01-09").unwrap().value("temperature"), Some(36.6));
    }

    #[test]
    fn offset_timestamps_bucket_by_recorded_wall_clock_day() {
        let records = vec![single("2024-01-09T23:30:00-05:00", "systolic", 121.0)];
        let series = AggregationService::new().aggregate(
            &records,
            window(d(2024, 1, 7), d(2024, 1, 13)),
            Period::OneWeek,
            &systolic_spec(),
        );
        assert_eq!(series.bucket("2024-01-09").unwrap().value("systolic"), Some(121.0));
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Multi-signal charts
// ═══════════════════════════════════════════════════════════════════

mod shared_buckets {
    use super::*;

    #[test]
    fn blood_pressure_and_heart_rate_share_bucket_keys() {
        let pressure = vec![bp("2024-01-08T08:00", 120.0, 80.0)];
        let heart = vec![
            single("2024-01-10T08:00", "heart_rate", 64.0),
            single("2024-01-10T21:00", "heart_rate", 70.0),
        ];
        let series = AggregationService::new().aggregate_streams(
            &[pressure.as_slice(), heart.as_slice()],
            window(d(2024, 1, 7), d(2024, 1, 13)),
            Period::OneWeek,
            &ChartKind::BloodPressure.series_spec(1),
        );

        assert_eq!(series.len(), 7);
        for bucket in &series.buckets {
            let columns: Vec<_> = bucket.values.keys().map(String::as_str).collect();
            assert_eq!(columns, vec!["diastolic", "heart_rate", "systolic"]);
        }
        assert_eq!(series.column("systolic")[1], Some(120.0));
        assert_eq!(series.column("heart_rate")[1], None);
        assert_eq!(series.column("heart_rate")[3], Some(67.0));
        assert_eq!(series.column("systolic")[3], None);
        assert_eq!(series.buckets[3].sample_count, 2);
    }

    #[test]
    fn body_composition_columns_align_per_month() {
        let weight = vec![single("2024-02-10T08:00", "weight", 82.4)];
        let fat = vec![single("2024-06-10T08:00", "body_fat", 21.5)];
        let series = AggregationService::new().aggregate_streams(
            &[weight.as_slice(), fat.as_slice()],
            window(d(2024, 1, 1), d(2024, 6, 30)),
            Period::SixMonths,
            &ChartKind::BodyComposition.series_spec(1),
        );
        let weights = series.column("weight");
        let fats = series.column("body_fat");
        assert_eq!(weights.len(), fats.len());
        assert_eq!(weights[1], Some(82.4));
        assert_eq!(fats[5], Some(21.5));
        assert_eq!(series.latest("weight"), Some((d(2024, 2, 1), 82.4)));
    }

    #[test]
    fn missing_stream_is_treated_as_empty() {
        let pressure = vec![bp("2024-01-08T08:00", 120.0, 80.0)];
        let series = AggregationService::new().aggregate_streams(
            &[pressure.as_slice()],
            window(d(2024, 1, 7), d(2024, 1, 13)),
            Period::OneWeek,
            &ChartKind::BloodPressure.series_spec(1),
        );
        assert!(series.column("heart_rate").iter().all(Option::is_none));
        assert_eq!(series.column("systolic")[1], Some(120.0));
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Order independence
// ═══════════════════════════════════════════════════════════════════

fn readings() -> impl Strategy<Value = (Vec<(u32, u32)>, Vec<(u32, u32)>)> {
    prop::collection::vec((0u32..7, 50u32..200), 0..40)
        .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle()))
}

fn to_records(readings: &[(u32, u32)]) -> Vec<VitalRecord> {
    readings
        .iter()
        .enumerate()
        .map(|(i, (day, value))| {
            let at = format!("2024-01-{:02}T{:02}:00", 7 + day, i % 24);
            single(&at, "systolic", f64::from(*value))
        })
        .collect()
}

proptest! {
    #[test]
    fn shuffled_input_gives_identical_series((original, shuffled) in readings()) {
        let service = AggregationService::new();
        let w = window(d(2024, 1, 7), d(2024, 1, 13));
        let a = service.aggregate(&to_records(&original), w, Period::OneWeek, &systolic_spec());
        let b = service.aggregate(&to_records(&shuffled), w, Period::OneWeek, &systolic_spec());
        prop_assert_eq!(a, b);
    }

    #[test]
    fn bucket_value_is_the_arithmetic_mean(readings in prop::collection::vec((0u32..7, 50u32..200), 1..40)) {
        let series = AggregationService::new().aggregate(
            &to_records(&readings),
            window(d(2024, 1, 7), d(2024, 1, 13)),
            Period::OneWeek,
            &systolic_spec(),
        );
        prop_assert_eq!(series.len(), 7);
        for day in 0..7u32 {
            let values: Vec<f64> = readings
                .iter()
                .filter(|(d, _)| *d == day)
                .map(|(_, v)| f64::from(*v))
                .collect();
            let expected = (!values.is_empty())
                .then(|| round_to(values.iter().sum::<f64>() / values.len() as f64, 1));
            prop_assert_eq!(series.buckets[day as usize].value("systolic"), expected);
        }
    }
}
