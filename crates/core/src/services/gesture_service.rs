use std::time::{Duration, Instant};
use tracing::trace;

use crate::models::sync::ZoomGesture;

/// Detects when a zoom/pan gesture has settled.
///
/// Shared by every chart adapter: adapters push raw gesture output as it
/// streams in and the dashboard polls for the settled result. A gesture
/// is emitted once it has been quiet for `quiet_period`, or immediately on
/// [`flush`](Self::flush) when the chart library reports the gesture end.
///
/// Timer and end callback often both fire for the same gesture, so the
/// same gesture may be emitted twice. The settler does not filter those:
/// the coordinator compares against the window actually on screen and
/// treats a repeat as a no-op.
#[derive(Debug, Clone)]
pub struct GestureSettler {
    quiet_period: Duration,
    pending: Option<(ZoomGesture, Instant)>,
}

impl GestureSettler {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            pending: None,
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    /// Record the latest gesture output; restarts the quiet period.
    pub fn push(&mut self, gesture: ZoomGesture, now: Instant) {
        trace!(?gesture, "gesture update");
        self.pending = Some((gesture, now));
    }

    /// Emit the pending gesture if it has been quiet long enough.
    pub fn poll(&mut self, now: Instant) -> Option<ZoomGesture> {
        let (_, last_update) = self.pending?;
        if now.saturating_duration_since(last_update) < self.quiet_period {
            return None;
        }
        self.flush()
    }

    /// Emit the pending gesture right away.
    pub fn flush(&mut self) -> Option<ZoomGesture> {
        let (gesture, _) = self.pending.take()?;
        trace!(?gesture, "gesture settled");
        Some(gesture)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop the pending gesture (the window it was made on is gone).
    pub fn reset(&mut self) {
        self.pending = None;
    }
}
