use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info};

use crate::errors::CoreError;
use crate::models::period::Period;
use crate::models::sync::{RefetchRequest, SyncBroadcast, SyncPhase, ZoomGesture, ZoomState};
use crate::models::window::DateWindow;
use crate::services::window_service::WindowService;

/// Zoom windows never reach before this year.
const EARLIEST_YEAR: i32 = 1900;

/// Result of feeding one settled gesture to the coordinator.
#[derive(Debug, Clone)]
pub struct GestureOutcome {
    /// The broadcast in effect after the gesture
    pub broadcast: Arc<SyncBroadcast>,

    /// False when the gesture re-stated the current effective window
    pub changed: bool,

    /// Set when the gesture moved past the range of requested records
    pub refetch: Option<RefetchRequest>,
}

/// Owns the canonical window and the zoom state shared by all charts.
///
/// There is exactly one effective window at any time, published as an
/// `Arc<SyncBroadcast>` that every chart receives in the same render pass.
/// Navigation (period or offset change) discards the zoom and issues a
/// refetch; zooming and panning inside the requested range never does.
///
/// The navigation offset counts periods from now and is never positive:
/// going to the previous period decrements it, going to the next period
/// increments it back toward 0.
pub struct ChartSyncCoordinator {
    window_service: WindowService,
    today: NaiveDate,
    period: Period,
    offset: i32,
    nominal: DateWindow,
    zoom: ZoomState,
    broadcast: Arc<SyncBroadcast>,
    /// Id of the navigation refetch still in flight, if any
    transition: Option<u64>,
    /// Most recent request issued; the only one whose response counts
    latest_request: Option<RefetchRequest>,
    /// Whether `latest_request` is still waiting on its response
    outstanding: bool,
    /// Range covered by the last request that completed
    confirmed_range: Option<DateWindow>,
    /// Range covered by the latest request, completed or not
    requested_range: Option<DateWindow>,
    next_request_id: u64,
}

impl std::fmt::Debug for ChartSyncCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChartSyncCoordinator")
            .field("period", &self.period)
            .field("offset", &self.offset)
            .field("phase", &self.phase())
            .field("revision", &self.broadcast.revision)
            .finish()
    }
}

impl ChartSyncCoordinator {
    /// Start on the current `period` window. The initial load is issued as
    /// a refetch right away; see [`pending_refetch`](Self::pending_refetch).
    pub fn new(period: Period, today: NaiveDate) -> Result<Self, CoreError> {
        let window_service = WindowService::new();
        let nominal = window_service.compute_window(period, 0, today)?;
        let broadcast = Arc::new(SyncBroadcast {
            revision: 0,
            period,
            nominal_window: nominal,
            effective_window: nominal,
            zoomed: false,
        });

        let mut coordinator = Self {
            window_service,
            today,
            period,
            offset: 0,
            nominal,
            zoom: None,
            broadcast,
            transition: None,
            latest_request: None,
            outstanding: false,
            confirmed_range: None,
            requested_range: None,
            next_request_id: 1,
        };
        let request = coordinator.issue_request(nominal);
        coordinator.transition = Some(request.id);
        Ok(coordinator)
    }

    // ── State ───────────────────────────────────────────────────────

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn offset(&self) -> i32 {
        self.offset
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn zoom(&self) -> ZoomState {
        self.zoom
    }

    pub fn nominal_window(&self) -> DateWindow {
        self.nominal
    }

    pub fn effective_window(&self) -> DateWindow {
        self.broadcast.effective_window
    }

    /// The broadcast every chart should render from right now.
    pub fn broadcast(&self) -> Arc<SyncBroadcast> {
        Arc::clone(&self.broadcast)
    }

    pub fn phase(&self) -> SyncPhase {
        match (self.transition, self.zoom) {
            (Some(request_id), _) => SyncPhase::Transitioning { request_id },
            (None, Some(window)) => SyncPhase::Zoomed { window },
            (None, None) => SyncPhase::Nominal,
        }
    }

    /// The latest refetch that has not completed yet.
    pub fn pending_refetch(&self) -> Option<RefetchRequest> {
        self.latest_request.filter(|_| self.outstanding)
    }

    /// Whether "next period" is available (it is not for the current period).
    pub fn can_go_next(&self) -> bool {
        self.offset < 0
    }

    // ── Navigation ──────────────────────────────────────────────────

    /// Switch period; returns to the current period and drops any zoom.
    pub fn set_period(&mut self, period: Period) -> Result<RefetchRequest, CoreError> {
        self.navigate(period, 0)
    }

    /// Step one period back in time; drops any zoom.
    pub fn go_to_previous_period(&mut self) -> Result<RefetchRequest, CoreError> {
        let offset = self
            .offset
            .checked_sub(1)
            .ok_or_else(|| CoreError::WindowOutOfRange(format!("offset below {}", self.offset)))?;
        self.navigate(self.period, offset)
    }

    /// Step one period forward; drops any zoom. Returns `None` without
    /// touching any state when already on the current period.
    pub fn go_to_next_period(&mut self) -> Result<Option<RefetchRequest>, CoreError> {
        if !self.can_go_next() {
            return Ok(None);
        }
        self.navigate(self.period, self.offset + 1).map(Some)
    }

    /// Move "today" forward (or back), e.g. when the app stays open past
    /// midnight.
    ///
    /// The offset is kept, so the same relative period is shown for the new
    /// date. When that changes the nominal window, this behaves like a
    /// navigation: the zoom is dropped and a refetch is issued. Otherwise
    /// only the date (and with it [`gesture_bounds`](Self::gesture_bounds))
    /// is updated.
    pub fn set_today(&mut self, today: NaiveDate) -> Result<Option<RefetchRequest>, CoreError> {
        if today == self.today {
            return Ok(None);
        }
        let periods_back = self
            .offset
            .checked_neg()
            .ok_or_else(|| CoreError::WindowOutOfRange(format!("offset {}", self.offset)))?;
        let nominal = self
            .window_service
            .compute_window(self.period, periods_back, today)?;

        debug!(from = %self.today, to = %today, "date changed");
        self.today = today;
        if nominal == self.nominal {
            return Ok(None);
        }
        self.navigate(self.period, self.offset).map(Some)
    }

    fn navigate(&mut self, period: Period, offset: i32) -> Result<RefetchRequest, CoreError> {
        // Compute first: a failed computation leaves the state untouched.
        let periods_back = offset
            .checked_neg()
            .ok_or_else(|| CoreError::WindowOutOfRange(format!("offset {offset}")))?;
        let nominal = self
            .window_service
            .compute_window(period, periods_back, self.today)?;

        self.period = period;
        self.offset = offset;
        self.nominal = nominal;
        self.zoom = None;
        self.publish();

        let request = self.issue_request(nominal);
        self.transition = Some(request.id);
        info!(%period, offset, %nominal, request = request.id, "navigated");
        Ok(request)
    }

    // ── Zoom / pan ──────────────────────────────────────────────────

    /// Adopt a settled gesture as the effective window of every chart.
    ///
    /// Idempotent: re-applying the current effective window changes
    /// nothing and keeps the broadcast revision. A gesture equal to the
    /// nominal window is the same as clearing the zoom. Windows reaching
    /// past [`gesture_bounds`](Self::gesture_bounds) are clamped to them,
    /// not rejected.
    pub fn apply_gesture(&mut self, gesture: ZoomGesture) -> GestureOutcome {
        let window = self.clamp_to_bounds(gesture.to_window());

        if window == self.broadcast.effective_window {
            return GestureOutcome {
                broadcast: self.broadcast(),
                changed: false,
                refetch: None,
            };
        }

        self.zoom = (window != self.nominal).then_some(window);
        self.publish();
        debug!(%window, revision = self.broadcast.revision, "zoom applied");

        let covered = self.requested_range.is_some_and(|r| r.covers(&window));
        let refetch = if covered {
            None
        } else {
            let range = self
                .requested_range
                .map_or(window, |r| r.union(&window));
            let request = self.issue_request(range);
            // A navigation still in flight is superseded by this request.
            if self.transition.is_some() {
                self.transition = Some(request.id);
            }
            info!(%range, request = request.id, "zoom left requested range");
            Some(request)
        };

        GestureOutcome {
            broadcast: self.broadcast(),
            changed: true,
            refetch,
        }
    }

    /// Dates a zoom window may cover: from 1900-01-01 up to the later of
    /// today and the end of the nominal window.
    pub fn gesture_bounds(&self) -> DateWindow {
        let earliest = NaiveDate::from_ymd_opt(EARLIEST_YEAR, 1, 1).unwrap_or(NaiveDate::MIN);
        DateWindow::spanning(earliest, self.today.max(self.nominal.end_date))
    }

    fn clamp_to_bounds(&self, window: DateWindow) -> DateWindow {
        let bounds = self.gesture_bounds();
        let clamp = |d: NaiveDate| d.clamp(bounds.start_date, bounds.end_date);
        DateWindow::spanning(clamp(window.start_date), clamp(window.end_date))
    }

    /// Return to the nominal window. No-op when not zoomed.
    pub fn clear_zoom(&mut self) -> Arc<SyncBroadcast> {
        if self.zoom.take().is_some() {
            self.publish();
        }
        self.broadcast()
    }

    // ── Refetch bookkeeping ─────────────────────────────────────────

    /// Mark request `id` as completed with its records applied.
    ///
    /// Only the latest request counts; any other id is stale.
    pub fn resolve_refetch(&mut self, id: u64) -> Result<(), CoreError> {
        let request = self.check_latest(id)?;
        self.confirmed_range = Some(request.range);
        self.outstanding = false;
        self.transition = None;
        debug!(request = id, "refetch resolved");
        Ok(())
    }

    /// Mark request `id` as failed. Previously loaded records stay in use.
    pub fn fail_refetch(&mut self, id: u64) -> Result<(), CoreError> {
        self.check_latest(id)?;
        self.requested_range = self.confirmed_range;
        self.outstanding = false;
        self.transition = None;
        Ok(())
    }

    /// True if `id` is the latest request and still outstanding.
    pub fn is_outstanding(&self, id: u64) -> bool {
        self.outstanding && self.latest_request.is_some_and(|r| r.id == id)
    }

    fn check_latest(&self, id: u64) -> Result<RefetchRequest, CoreError> {
        match self.latest_request {
            Some(request) if request.id == id && self.outstanding => Ok(request),
            latest => Err(CoreError::StaleRefetch {
                request: id,
                latest: latest.map_or(0, |r| r.id),
            }),
        }
    }

    fn issue_request(&mut self, range: DateWindow) -> RefetchRequest {
        let request = RefetchRequest {
            id: self.next_request_id,
            period: self.period,
            range,
        };
        self.next_request_id += 1;
        self.latest_request = Some(request);
        self.outstanding = true;
        self.requested_range = Some(range);
        request
    }

    /// Replace the broadcast with one reflecting the current state.
    fn publish(&mut self) {
        let effective = self.zoom.unwrap_or(self.nominal);
        self.broadcast = Arc::new(SyncBroadcast {
            revision: self.broadcast.revision + 1,
            period: self.period,
            nominal_window: self.nominal,
            effective_window: effective,
            zoomed: self.zoom.is_some(),
        });
    }
}
