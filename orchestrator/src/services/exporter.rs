//! Throttled drain of the staging store into an export sink

use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;

use shared::{entries, logging, unit_info, StagingStore, UnitId};

use crate::config::ExportConfig;
use crate::error::OrchestratorResult;
use crate::traits::ExportSink;

/// Summary of one export run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportReport {
    /// Artifacts the sink accepted
    pub forwarded: usize,
    /// Artifacts the sink rejected
    pub failed: usize,
    /// Pauses inserted between batches
    pub pauses: usize,
}

impl ExportReport {
    /// Artifacts handed to the sink, whatever the result
    pub fn attempted(&self) -> usize {
        self.forwarded + self.failed
    }

    pub fn to_json(&self) -> OrchestratorResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Forwards staged artifacts to a sink in paced batches
#[derive(Debug, Clone, Default)]
pub struct ExportThrottler {
    config: ExportConfig,
}

impl ExportThrottler {
    pub fn new(config: ExportConfig) -> OrchestratorResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Forward every staged artifact to `sink` exactly once.
    ///
    /// Keys are snapshotted up front and artifacts that vanish before they
    /// are fetched are skipped. After each full batch the drain pauses before
    /// the next artifact; no pause follows the last one. Sink failures are
    /// counted, not retried.
    pub async fn drain<S, K>(&self, store: &S, sink: &K) -> OrchestratorResult<ExportReport>
    where
        S: StagingStore + ?Sized,
        K: ExportSink + ?Sized,
    {
        let mut report = ExportReport::default();
        unit_info!(UnitId::Orchestrator, "📦 Exporting staged artifacts");

        let artifacts = entries(store);
        tokio::pin!(artifacts);

        while let Some(artifact) = artifacts.next().await {
            let artifact = artifact?;

            if report.attempted() > 0 && report.attempted() % self.config.batch_size == 0 {
                report.pauses += 1;
                sleep(self.config.pause).await;
            }

            match sink.save(&artifact.original_name, &artifact.payload).await {
                Ok(()) => report.forwarded += 1,
                Err(e) => {
                    logging::log_error(UnitId::Orchestrator, &format!("Exporting {}", artifact.original_name), &e);
                    report.failed += 1;
                }
            }

            if report.attempted() % self.config.batch_size == 0 {
                logging::log_progress(UnitId::Orchestrator, "Export", &format!("{} artifacts sent", report.attempted()));
            }
        }

        logging::log_success(
            UnitId::Orchestrator,
            &format!("Export finished: {} forwarded, {} failed", report.forwarded, report.failed),
        );
        Ok(report)
    }
}
