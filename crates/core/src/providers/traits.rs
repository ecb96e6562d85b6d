use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::chart::RenderPayload;
use crate::models::record::{VitalRecord, VitalType};
use crate::models::window::DateWindow;

/// Source of raw vital records (the REST backend in production).
///
/// The core only needs records with a parseable `recorded_at` and the
/// numeric fields of their vital type. Swapping the backend means writing
/// one new implementation of this trait.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait RecordSource: Send + Sync {
    /// Human-readable name of this source (for logs/errors).
    fn name(&self) -> &str;

    /// Fetch every record of `vital` for `user_id` recorded within `range`.
    async fn fetch_records(
        &self,
        user_id: &str,
        vital: VitalType,
        range: DateWindow,
        token: &str,
    ) -> Result<Vec<VitalRecord>, CoreError>;
}

/// Supplies bearer tokens for record requests.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait AuthProvider: Send + Sync {
    async fn bearer_token(&self) -> Result<String, CoreError>;
}

/// A rendered chart. Receives a prepared payload and draws it; gesture
/// capture happens on the view side and comes back as `ZoomGesture`s.
pub trait ChartView {
    fn render(&mut self, payload: &RenderPayload);
}
