use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::CoreError;

/// The kind of vital measurement a record holds.
/// Each kind has its own API endpoint and its own numeric fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalType {
    BloodPressure,
    HeartRate,
    Temperature,
    Weight,
    BodyFat,
    BloodGlucose,
    OxygenSaturation,
}

impl VitalType {
    pub const ALL: [VitalType; 7] = [
        VitalType::BloodPressure,
        VitalType::HeartRate,
        VitalType::Temperature,
        VitalType::Weight,
        VitalType::BodyFat,
        VitalType::BloodGlucose,
        VitalType::OxygenSaturation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            VitalType::BloodPressure => "blood_pressure",
            VitalType::HeartRate => "heart_rate",
            VitalType::Temperature => "temperature",
            VitalType::Weight => "weight",
            VitalType::BodyFat => "body_fat",
            VitalType::BloodGlucose => "blood_glucose",
            VitalType::OxygenSaturation => "oxygen_saturation",
        }
    }

    /// Path segment of the record endpoint for this vital.
    pub fn api_path(self) -> &'static str {
        match self {
            VitalType::BloodPressure => "blood-pressure",
            VitalType::HeartRate => "heart-rate",
            VitalType::Temperature => "temperature",
            VitalType::Weight => "weight",
            VitalType::BodyFat => "body-fat",
            VitalType::BloodGlucose => "blood-glucose",
            VitalType::OxygenSaturation => "oxygen-saturation",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            VitalType::BloodPressure => "mmHg",
            VitalType::HeartRate => "bpm",
            VitalType::Temperature => "°C",
            VitalType::Weight => "kg",
            VitalType::BodyFat => "%",
            VitalType::BloodGlucose => "mg/dL",
            VitalType::OxygenSaturation => "%",
        }
    }

    /// Numeric fields every record of this kind carries.
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            VitalType::BloodPressure => &["systolic", "diastolic"],
            VitalType::HeartRate => &["heart_rate"],
            VitalType::Temperature => &["temperature"],
            VitalType::Weight => &["weight"],
            VitalType::BodyFat => &["body_fat"],
            VitalType::BloodGlucose => &["blood_glucose"],
            VitalType::OxygenSaturation => &["oxygen_saturation"],
        }
    }
}

impl std::fmt::Display for VitalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One raw measurement as returned by the record API.
///
/// The core only relies on `recorded_at` and the numeric fields named by
/// [`VitalType::fields`]; everything else in the payload is carried along
/// untouched in `fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalRecord {
    /// Timestamp string as sent by the API
    pub recorded_at: String,

    /// Every other field of the record, keyed by name
    #[serde(flatten)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl VitalRecord {
    pub fn new(recorded_at: impl Into<String>) -> Self {
        Self {
            recorded_at: recorded_at.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style helper for attaching a numeric field.
    pub fn with_value(mut self, field: impl Into<String>, value: f64) -> Self {
        self.fields.insert(field.into(), serde_json::Value::from(value));
        self
    }

    /// Parse `recorded_at` into a wall-clock timestamp.
    pub fn timestamp(&self) -> Result<NaiveDateTime, CoreError> {
        parse_timestamp(&self.recorded_at)
    }

    /// Read a numeric field. Decimal strings (`"36.6"`) are accepted since
    /// some backends serialize decimals that way. Non-finite values and
    /// `null` count as missing.
    pub fn numeric(&self, field: &str) -> Option<f64> {
        let value = match self.fields.get(field)? {
            serde_json::Value::Number(n) => n.as_f64()?,
            serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        value.is_finite().then_some(value)
    }
}

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a record timestamp.
///
/// Accepts RFC 3339 (the offset is kept as recorded: the wall-clock day of
/// the measurement decides its bucket), naive date-times with `T` or space,
/// and bare dates (midnight).
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, CoreError> {
    let s = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_local());
    }
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(dt);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date.and_time(chrono::NaiveTime::MIN));
    }

    Err(CoreError::MalformedRecord(format!(
        "unparseable timestamp '{raw}'"
    )))
}
