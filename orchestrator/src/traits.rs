//! Service trait definitions for dependency injection

use async_trait::async_trait;

use crate::error::OrchestratorResult;

/// Destination of exported artifacts
#[mockall::automock]
#[async_trait]
pub trait ExportSink: Send + Sync {
    /// Deliver one artifact under its original name
    async fn save(&self, name: &str, content: &[u8]) -> OrchestratorResult<()>;
}
