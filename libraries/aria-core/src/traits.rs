/// Core traits for Aria
use crate::error::Result;
use crate::types::ScrobbleReport;
use async_trait::async_trait;

/// Listening-history reporter
///
/// Implementers deliver one report to a remote endpoint. Callers treat the
/// result as telemetry: a failure is logged and the report dropped.
#[async_trait]
pub trait ScrobbleSink: Send + Sync {
    /// Deliver a single report
    ///
    /// # Errors
    /// Returns an error if the endpoint is unreachable or rejects the report
    async fn submit(&self, report: &ScrobbleReport) -> Result<()>;
}
