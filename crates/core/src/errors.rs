use chrono::NaiveDate;
use thiserror::Error;

/// Unified error type for the entire vitals-chart-core library.
/// Every public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Records ─────────────────────────────────────────────────────
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    // ── Windows ─────────────────────────────────────────────────────
    #[error("Invalid window: start {start} is after end {end}")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },

    #[error("Window out of representable range: {0}")]
    WindowOutOfRange(String),

    // ── Refetch ─────────────────────────────────────────────────────
    #[error("Stale refetch response #{request} (latest is #{latest})")]
    StaleRefetch { request: u64, latest: u64 },

    // ── API / Network ───────────────────────────────────────────────
    #[error("API error ({provider}): {message}")]
    Api {
        provider: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    // ── Serialization / Config ──────────────────────────────────────
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // Tokens and user ids travel in the query string; keep them out of error text.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}
