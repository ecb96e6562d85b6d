use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use super::period::Period;
use super::window::DateWindow;

/// Raw zoom/pan output reported by a chart adapter.
///
/// Bounds are Unix epoch milliseconds (UTC), in whatever order the
/// chart library produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZoomGesture {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl ZoomGesture {
    pub fn new(start_ms: i64, end_ms: i64) -> Self {
        Self { start_ms, end_ms }
    }

    /// Gesture spanning two whole days (midnight UTC of each).
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start_ms: start.and_time(chrono::NaiveTime::MIN).and_utc().timestamp_millis(),
            end_ms: end.and_time(chrono::NaiveTime::MIN).and_utc().timestamp_millis(),
        }
    }

    /// Day-level window covered by the gesture.
    ///
    /// Timestamps outside chrono's representable range are clamped to the
    /// nearest representable day, and reversed bounds are reordered, so
    /// this never fails.
    pub fn to_window(self) -> DateWindow {
        DateWindow::spanning(clamp_to_date(self.start_ms), clamp_to_date(self.end_ms))
    }
}

fn clamp_to_date(ms: i64) -> NaiveDate {
    match DateTime::from_timestamp_millis(ms) {
        Some(dt) => dt.date_naive(),
        None if ms < 0 => NaiveDate::MIN,
        None => NaiveDate::MAX,
    }
}

/// Optional override of the nominal window, set by zoom/pan gestures.
/// `None` means the nominal window is in effect.
pub type ZoomState = Option<DateWindow>;

/// Where the coordinator is in its zoom/navigation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "phase")]
pub enum SyncPhase {
    /// No zoom; the nominal window is in effect
    Nominal,
    /// A gesture window overrides the nominal one
    Zoomed { window: DateWindow },
    /// A period/offset change is waiting on its refetch
    Transitioning { request_id: u64 },
}

/// The single effective window published to every chart in a render pass.
///
/// Replaced wholesale on every change; `revision` increases with each
/// replacement and stays put when a change turns out to be a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncBroadcast {
    pub revision: u64,
    pub period: Period,
    pub nominal_window: DateWindow,
    pub effective_window: DateWindow,
    pub zoomed: bool,
}

/// Ask the upstream API for records covering `range`.
///
/// Request ids increase monotonically; only the response to the most
/// recent id is ever applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefetchRequest {
    pub id: u64,
    pub period: Period,
    pub range: DateWindow,
}
