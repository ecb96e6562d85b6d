use serde::{Deserialize, Serialize};

use super::period::Period;
use crate::errors::CoreError;

/// Largest supported rounding precision for averaged values.
const MAX_PRECISION: u32 = 6;

/// Longest accepted gesture quiet period, in milliseconds.
const MAX_QUIET_PERIOD_MS: u64 = 10_000;

/// Dashboard configuration. Every field has a default, so a partial JSON
/// document (or `{}`) is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Period selected when the dashboard opens
    pub default_period: Period,

    /// How long a gesture must stay still before it is committed
    pub gesture_quiet_period_ms: u64,

    /// Number of aggregated series kept in the memo cache
    pub series_cache_capacity: usize,

    /// Decimal places kept in averaged values
    pub value_precision: u32,

    /// User whose records are fetched
    pub user_id: Option<String>,

    /// Base URL of the record API (e.g., "https://api.example.com/api/v1")
    pub api_base_url: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_period: Period::OneWeek,
            gesture_quiet_period_ms: 150,
            series_cache_capacity: 32,
            value_precision: 1,
            user_id: None,
            api_base_url: None,
        }
    }
}

impl Settings {
    /// Parse and validate settings from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, CoreError> {
        serde_json::to_string_pretty(self).map_err(|e| CoreError::Serialization(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.series_cache_capacity == 0 {
            return Err(CoreError::Config(
                "series_cache_capacity must be at least 1".into(),
            ));
        }
        if self.value_precision > MAX_PRECISION {
            return Err(CoreError::Config(format!(
                "value_precision {} exceeds maximum of {MAX_PRECISION}",
                self.value_precision
            )));
        }
        if self.gesture_quiet_period_ms > MAX_QUIET_PERIOD_MS {
            return Err(CoreError::Config(format!(
                "gesture_quiet_period_ms {} exceeds maximum of {MAX_QUIET_PERIOD_MS}",
                self.gesture_quiet_period_ms
            )));
        }
        Ok(())
    }
}
