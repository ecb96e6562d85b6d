use std::collections::HashMap;
use tracing::{debug, warn};

use crate::errors::CoreError;
use crate::models::record::{VitalRecord, VitalType};
use crate::models::sync::RefetchRequest;
use crate::models::window::DateWindow;
use crate::providers::traits::{AuthProvider, RecordSource};

/// Records returned for one refetch request, not yet applied.
#[derive(Debug, Clone)]
pub struct FetchedRecords {
    pub request_id: u64,
    pub range: DateWindow,
    pub records: HashMap<VitalType, Vec<VitalRecord>>,
}

/// The records currently backing the charts.
///
/// Replaced wholesale by each applied response. `version` increases on
/// every replacement and is part of the series cache key.
#[derive(Debug, Default)]
pub struct RecordStore {
    records: HashMap<VitalType, Vec<VitalRecord>>,
    range: Option<DateWindow>,
    version: u64,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Date range the stored records were fetched for.
    pub fn range(&self) -> Option<DateWindow> {
        self.range
    }

    /// Records of one vital type, in the order the API returned them.
    pub fn records(&self, vital: VitalType) -> &[VitalRecord] {
        self.records.get(&vital).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn total_records(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }

    /// Swap in a freshly fetched record set.
    pub fn replace(&mut self, fetched: FetchedRecords) {
        self.records = fetched.records;
        self.range = Some(fetched.range);
        self.version += 1;
    }

    /// Replace the records of a single vital type (manual entry, imports).
    pub fn set_records(&mut self, vital: VitalType, records: Vec<VitalRecord>) {
        self.records.insert(vital, records);
        self.version += 1;
    }
}

/// Loads records for a refetch request from the upstream API.
pub struct RecordService;

impl RecordService {
    pub fn new() -> Self {
        Self
    }

    /// Fetch every vital type for `request.range`.
    ///
    /// One token is obtained up front and used for all requests. Any
    /// failure fails the whole load, so a partially fetched set never
    /// replaces a complete older one.
    pub async fn load(
        &self,
        source: &dyn RecordSource,
        auth: &dyn AuthProvider,
        user_id: &str,
        request: RefetchRequest,
    ) -> Result<FetchedRecords, CoreError> {
        let token = auth.bearer_token().await?;
        let mut records = HashMap::new();

        for vital in VitalType::ALL {
            let fetched = source
                .fetch_records(user_id, vital, request.range, &token)
                .await
                .inspect_err(|e| {
                    warn!(source = source.name(), %vital, error = %e, "record fetch failed");
                })?;
            records.insert(vital, fetched);
        }

        debug!(
            request = request.id,
            range = %request.range,
            total = records.values().map(Vec::len).sum::<usize>(),
            "records loaded"
        );

        Ok(FetchedRecords {
            request_id: request.id,
            range: request.range,
            records,
        })
    }
}

impl Default for RecordService {
    fn default() -> Self {
        Self::new()
    }
}
