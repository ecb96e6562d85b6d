use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;
use tracing::{debug, warn};

use super::traits::RecordSource;
use crate::errors::CoreError;
use crate::models::record::{VitalRecord, VitalType};
use crate::models::window::DateWindow;

const PROVIDER: &str = "VitalsApi";

/// REST record source.
///
/// - **Endpoint**: `GET {base_url}/{vital path}/?user_id=..&start_date=..&end_date=..`
/// - **Auth**: `Authorization: Bearer <token>`
/// - **Response**: a JSON array of records, or a paginated object with the
///   records under `results`
///
/// Individual records that don't deserialize are dropped with a warning;
/// one bad row never fails the whole response.
pub struct HttpRecordSource {
    client: Client,
    base_url: String,
}

impl HttpRecordSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(30));
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Endpoint URL for one vital type (without query string).
    pub fn endpoint(&self, vital: VitalType) -> String {
        format!("{}/{}/", self.base_url, vital.api_path())
    }
}

// ── API response types ──────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(untagged)]
enum RecordsResponse {
    List(Vec<serde_json::Value>),
    Page { results: Vec<serde_json::Value> },
}

impl RecordsResponse {
    fn into_rows(self) -> Vec<serde_json::Value> {
        match self {
            RecordsResponse::List(rows) => rows,
            RecordsResponse::Page { results } => results,
        }
    }
}

/// Deserialize rows one by one, dropping the ones that don't fit.
pub(crate) fn parse_rows(vital: VitalType, rows: Vec<serde_json::Value>) -> Vec<VitalRecord> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value::<VitalRecord>(row) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(%vital, error = %e, "dropping undecodable record");
                None
            }
        })
        .collect()
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl RecordSource for HttpRecordSource {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn fetch_records(
        &self,
        user_id: &str,
        vital: VitalType,
        range: DateWindow,
        token: &str,
    ) -> Result<Vec<VitalRecord>, CoreError> {
        let start = range.start_date.format("%Y-%m-%d").to_string();
        let end = range.end_date.format("%Y-%m-%d").to_string();

        let resp = self
            .client
            .get(self.endpoint(vital))
            .bearer_auth(token)
            .query(&[
                ("user_id", user_id),
                ("start_date", start.as_str()),
                ("end_date", end.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("{vital} request failed with status {status}"),
            });
        }

        let body: RecordsResponse = resp.json().await.map_err(|e| CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("Failed to parse {vital} records: {e}"),
        })?;

        let records = parse_rows(vital, body.into_rows());
        debug!(%vital, %range, count = records.len(), "fetched records");
        Ok(records)
    }
}
