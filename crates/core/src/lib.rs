pub mod errors;
pub mod models;
pub mod providers;
pub mod services;

use chrono::NaiveDate;
use models::{
    cache::{SeriesCache, SeriesKey},
    chart::{ChartKind, RenderPayload},
    period::Period,
    record::{VitalRecord, VitalType},
    series::Series,
    settings::Settings,
    sync::{RefetchRequest, SyncBroadcast, SyncPhase, ZoomGesture},
    window::DateWindow,
};
use providers::traits::{AuthProvider, ChartView, RecordSource};
use services::{
    aggregation_service::AggregationService,
    gesture_service::GestureSettler,
    record_service::{FetchedRecords, RecordService, RecordStore},
    sync_service::{ChartSyncCoordinator, GestureOutcome},
    title_service::{DateLabelFormatter, EnglishLabels, TitleService},
    window_service::WindowService,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use errors::CoreError;

/// Everything produced by one render pass: the shared broadcast and one
/// payload per chart, all pointing at that same broadcast.
#[derive(Debug, Clone)]
pub struct RenderPass {
    pub broadcast: Arc<SyncBroadcast>,
    pub payloads: Vec<RenderPayload>,
}

impl RenderPass {
    pub fn payload(&self, chart: ChartKind) -> Option<&RenderPayload> {
        self.payloads.iter().find(|p| p.chart == chart)
    }
}

/// Main entry point for the vitals chart core.
/// Holds the window/zoom state, the fetched records and all services the
/// five charts need.
#[must_use]
pub struct VitalsDashboard {
    settings: Settings,
    coordinator: ChartSyncCoordinator,
    records: RecordStore,
    cache: SeriesCache,
    settler: GestureSettler,
    aggregation_service: AggregationService,
    title_service: TitleService,
    record_service: RecordService,
    labels: Box<dyn DateLabelFormatter + Send + Sync>,
}

impl std::fmt::Debug for VitalsDashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VitalsDashboard")
            .field("coordinator", &self.coordinator)
            .field("records", &self.records.total_records())
            .field("records_version", &self.records.version())
            .field("cache", &self.cache)
            .finish()
    }
}

impl VitalsDashboard {
    /// Open the dashboard on today's window for the configured default period.
    pub fn new(settings: Settings) -> Result<Self, CoreError> {
        Self::with_today(settings, WindowService::today())
    }

    /// Open the dashboard with an explicit notion of "today".
    pub fn with_today(settings: Settings, today: NaiveDate) -> Result<Self, CoreError> {
        settings.validate()?;
        let coordinator = ChartSyncCoordinator::new(settings.default_period, today)?;
        let cache = SeriesCache::new(settings.series_cache_capacity);
        let settler = GestureSettler::new(Duration::from_millis(settings.gesture_quiet_period_ms));

        Ok(Self {
            settings,
            coordinator,
            records: RecordStore::new(),
            cache,
            settler,
            aggregation_service: AggregationService::new(),
            title_service: TitleService::new(),
            record_service: RecordService::new(),
            labels: Box::new(EnglishLabels),
        })
    }

    /// Replace the date label formatter (locale) used for titles.
    pub fn with_labels(mut self, labels: impl DateLabelFormatter + Send + Sync + 'static) -> Self {
        self.labels = Box::new(labels);
        self
    }

    // ── State ───────────────────────────────────────────────────────

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn coordinator(&self) -> &ChartSyncCoordinator {
        &self.coordinator
    }

    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    pub fn cache(&self) -> &SeriesCache {
        &self.cache
    }

    #[must_use]
    pub fn period(&self) -> Period {
        self.coordinator.period()
    }

    #[must_use]
    pub fn offset(&self) -> i32 {
        self.coordinator.offset()
    }

    #[must_use]
    pub fn phase(&self) -> SyncPhase {
        self.coordinator.phase()
    }

    #[must_use]
    pub fn broadcast(&self) -> Arc<SyncBroadcast> {
        self.coordinator.broadcast()
    }

    #[must_use]
    pub fn effective_window(&self) -> DateWindow {
        self.coordinator.effective_window()
    }

    #[must_use]
    pub fn can_go_next(&self) -> bool {
        self.coordinator.can_go_next()
    }

    // ── Navigation ──────────────────────────────────────────────────

    /// Switch period (back to the current one) and clear the zoom.
    pub fn set_period(&mut self, period: Period) -> Result<RefetchRequest, CoreError> {
        self.settler.reset();
        self.coordinator.set_period(period)
    }

    pub fn go_to_previous_period(&mut self) -> Result<RefetchRequest, CoreError> {
        self.settler.reset();
        self.coordinator.go_to_previous_period()
    }

    /// `Ok(None)` when already on the current period.
    pub fn go_to_next_period(&mut self) -> Result<Option<RefetchRequest>, CoreError> {
        if !self.coordinator.can_go_next() {
            return Ok(None);
        }
        self.settler.reset();
        self.coordinator.go_to_next_period()
    }

    /// Re-anchor the dashboard on a new calendar day (see
    /// [`ChartSyncCoordinator::set_today`]).
    pub fn set_today(&mut self, today: NaiveDate) -> Result<Option<RefetchRequest>, CoreError> {
        let request = self.coordinator.set_today(today)?;
        if request.is_some() {
            self.settler.reset();
        }
        Ok(request)
    }

    /// [`set_today`](Self::set_today) with the local calendar day.
    pub fn sync_today(&mut self) -> Result<Option<RefetchRequest>, CoreError> {
        self.set_today(WindowService::today())
    }

    // ── Gestures ────────────────────────────────────────────────────

    /// Feed raw gesture output from any chart adapter.
    pub fn push_gesture(&mut self, gesture: ZoomGesture, now: Instant) {
        self.settler.push(gesture, now);
    }

    /// Commit the pending gesture once it has settled.
    pub fn poll_gestures(&mut self, now: Instant) -> Option<GestureOutcome> {
        let gesture = self.settler.poll(now)?;
        Some(self.coordinator.apply_gesture(gesture))
    }

    /// Commit the pending gesture now (the chart library reported its end).
    pub fn flush_gesture(&mut self) -> Option<GestureOutcome> {
        let gesture = self.settler.flush()?;
        Some(self.coordinator.apply_gesture(gesture))
    }

    /// Apply a gesture directly, bypassing the settle detection.
    pub fn apply_gesture(&mut self, gesture: ZoomGesture) -> GestureOutcome {
        self.coordinator.apply_gesture(gesture)
    }

    pub fn clear_zoom(&mut self) -> Arc<SyncBroadcast> {
        self.settler.reset();
        self.coordinator.clear_zoom()
    }

    // ── Records ─────────────────────────────────────────────────────

    #[must_use]
    pub fn pending_refetch(&self) -> Option<RefetchRequest> {
        self.coordinator.pending_refetch()
    }

    /// Apply a fetched record set.
    ///
    /// Returns `Ok(false)` when the response belongs to a superseded
    /// request; it is discarded and nothing changes.
    pub fn complete_refetch(&mut self, fetched: FetchedRecords) -> Result<bool, CoreError> {
        match self.coordinator.resolve_refetch(fetched.request_id) {
            Ok(()) => {
                self.records.replace(fetched);
                Ok(true)
            }
            Err(CoreError::StaleRefetch { request, latest }) => {
                debug!(request, latest, "discarding stale refetch response");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Record that request `id` failed. The previous records stay in use.
    /// Returns `Ok(false)` for a superseded request.
    pub fn fail_refetch(&mut self, id: u64) -> Result<bool, CoreError> {
        match self.coordinator.fail_refetch(id) {
            Ok(()) => Ok(true),
            Err(CoreError::StaleRefetch { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Run the pending refetch, if any, against `source`.
    ///
    /// Returns `Ok(true)` when new records were applied. On a fetch error
    /// the request is marked failed, the charts keep their previous
    /// records, and the error is returned.
    pub async fn refresh(
        &mut self,
        source: &dyn RecordSource,
        auth: &dyn AuthProvider,
    ) -> Result<bool, CoreError> {
        let Some(request) = self.coordinator.pending_refetch() else {
            return Ok(false);
        };
        let user_id = self
            .settings
            .user_id
            .clone()
            .ok_or_else(|| CoreError::Config("user_id is not configured".into()))?;

        match self.record_service.load(source, auth, &user_id, request).await {
            Ok(fetched) => self.complete_refetch(fetched),
            Err(e) => {
                self.fail_refetch(request.id)?;
                Err(e)
            }
        }
    }

    /// Replace the records of one vital type directly (e.g., after the
    /// user added a measurement locally).
    pub fn set_records(&mut self, vital: VitalType, records: Vec<VitalRecord>) {
        self.records.set_records(vital, records);
    }

    // ── Rendering ───────────────────────────────────────────────────

    /// Series for one chart over the current effective window (memoized).
    pub fn series(&mut self, chart: ChartKind) -> Arc<Series> {
        let broadcast = self.coordinator.broadcast();
        let key = SeriesKey {
            records_version: self.records.version(),
            chart,
            period: broadcast.period,
            window: broadcast.effective_window,
        };
        let precision = self.settings.value_precision;
        let records = &self.records;
        let aggregation = &self.aggregation_service;

        self.cache.get_or_build(key, || {
            let streams: Vec<&[VitalRecord]> = chart
                .vitals()
                .iter()
                .map(|vital| records.records(*vital))
                .collect();
            aggregation.aggregate_streams(
                &streams,
                key.window,
                key.period,
                &chart.series_spec(precision),
            )
        })
    }

    /// Label for the effective window.
    ///
    /// Always `Some` in practice: gestures are clamped to
    /// [`ChartSyncCoordinator::gesture_bounds`], which never reaches the
    /// calendar edges where [`TitleService::format_title`] gives up.
    #[must_use]
    pub fn title(&self) -> Option<String> {
        let broadcast = self.coordinator.broadcast();
        self.title_service.format_title(
            broadcast.period,
            &broadcast.effective_window,
            self.labels.as_ref(),
        )
    }

    /// Prepare all five charts against one broadcast.
    pub fn render_pass(&mut self) -> RenderPass {
        let broadcast = self.coordinator.broadcast();
        let title = self.title();
        let payloads = ChartKind::ALL
            .into_iter()
            .map(|chart| RenderPayload {
                chart,
                series: self.series(chart),
                broadcast: Arc::clone(&broadcast),
                title: title.clone(),
            })
            .collect();

        RenderPass {
            broadcast,
            payloads,
        }
    }

    /// Run a render pass and hand each view its payload.
    pub fn render_to<'a>(
        &mut self,
        views: impl IntoIterator<Item = (ChartKind, &'a mut dyn ChartView)>,
    ) -> Arc<SyncBroadcast> {
        let pass = self.render_pass();
        for (chart, view) in views {
            if let Some(payload) = pass.payload(chart) {
                view.render(payload);
            }
        }
        pass.broadcast
    }
}
