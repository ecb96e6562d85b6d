use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::record::VitalType;
use super::series::Series;
use super::sync::SyncBroadcast;

/// The five chart views of the vitals dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// Systolic/diastolic pressure with heart rate on the same axis
    BloodPressure,
    Temperature,
    /// Weight with body-fat percentage
    BodyComposition,
    BloodGlucose,
    OxygenSaturation,
}

impl ChartKind {
    pub const ALL: [ChartKind; 5] = [
        ChartKind::BloodPressure,
        ChartKind::Temperature,
        ChartKind::BodyComposition,
        ChartKind::BloodGlucose,
        ChartKind::OxygenSaturation,
    ];

    /// Vital streams displayed together on this chart.
    pub fn vitals(self) -> &'static [VitalType] {
        match self {
            ChartKind::BloodPressure => &[VitalType::BloodPressure, VitalType::HeartRate],
            ChartKind::Temperature => &[VitalType::Temperature],
            ChartKind::BodyComposition => &[VitalType::Weight, VitalType::BodyFat],
            ChartKind::BloodGlucose => &[VitalType::BloodGlucose],
            ChartKind::OxygenSaturation => &[VitalType::OxygenSaturation],
        }
    }

    /// Aggregation configuration for this chart.
    pub fn series_spec(self, precision: u32) -> SeriesSpec {
        SeriesSpec {
            streams: self.vitals().iter().map(|v| StreamSpec::for_vital(*v)).collect(),
            precision,
        }
    }
}

impl std::fmt::Display for ChartKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ChartKind::BloodPressure => "blood_pressure",
            ChartKind::Temperature => "temperature",
            ChartKind::BodyComposition => "body_composition",
            ChartKind::BloodGlucose => "blood_glucose",
            ChartKind::OxygenSaturation => "oxygen_saturation",
        };
        f.write_str(name)
    }
}

/// Which fields to pull out of one record stream. Every field is combined
/// per bucket by arithmetic mean.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSpec {
    pub vital: VitalType,

    /// A record missing any of these is skipped entirely
    pub required: Vec<String>,

    /// Averaged when present, ignored when absent
    #[serde(default)]
    pub optional: Vec<String>,
}

impl StreamSpec {
    pub fn for_vital(vital: VitalType) -> Self {
        Self {
            vital,
            required: vital.fields().iter().map(|f| f.to_string()).collect(),
            optional: Vec::new(),
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.required.iter().chain(&self.optional).map(String::as_str)
    }
}

/// Per-chart aggregation configuration: the streams feeding one shared
/// bucket set, and the rounding applied to averaged values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesSpec {
    pub streams: Vec<StreamSpec>,

    /// Decimal places kept in averaged values
    pub precision: u32,
}

impl SeriesSpec {
    pub fn single(vital: VitalType, precision: u32) -> Self {
        Self {
            streams: vec![StreamSpec::for_vital(vital)],
            precision,
        }
    }

    /// Every output column, in stream order.
    pub fn columns(&self) -> Vec<&str> {
        self.streams.iter().flat_map(|s| s.fields()).collect()
    }
}

/// Everything a chart view needs for one render pass.
///
/// `broadcast` is the same `Arc` for every chart in a pass, so all views
/// observe the identical effective window.
#[derive(Debug, Clone, Serialize)]
pub struct RenderPayload {
    pub chart: ChartKind,
    pub series: Arc<Series>,
    pub broadcast: Arc<SyncBroadcast>,
    pub title: Option<String>,
}
