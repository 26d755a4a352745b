//! Optional debug-logging seam for raw planner traffic.
//!
//! Failures from a logger are recorded as events and never abort
//! generation.

use ap_domain::error::Result;
use serde::Serialize;
use serde_json::Value;

/// One request/response pair handed to a [`DebugLogger`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugLogEntry {
    pub endpoint: String,
    pub response: Value,
    pub request_payload: Value,
    pub metadata: Value,
}

#[async_trait::async_trait]
pub trait DebugLogger: Send + Sync {
    async fn log(&self, entry: DebugLogEntry) -> Result<()>;
}

/// Writes entries to the `ap_planner::debug` tracing target at DEBUG level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDebugLogger;

#[async_trait::async_trait]
impl DebugLogger for TracingDebugLogger {
    async fn log(&self, entry: DebugLogEntry) -> Result<()> {
        let payload = serde_json::to_string(&entry)?;
        tracing::debug!(
            target: "ap_planner::debug",
            endpoint = %entry.endpoint,
            entry = %payload,
            "planner exchange"
        );
        Ok(())
    }
}
