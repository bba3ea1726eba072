//! Main orchestrator implementation
//!
//! Public entry point of the pipeline. Owns the single-flight guard, the
//! staging store handle and the adapter that runs shards on execution units.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use shared::{logging, unit_error, unit_info, ArtifactKey, InputFile, ShardOutcome, StagingStore, UnitId};
use worker::Transformer;

use crate::config::{ExportConfig, OrchestratorConfig, ProcessingConfig};
use crate::core::{SingleFlight, WorkPartitioner};
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::services::{ExportReport, ExportThrottler, RemoteCallAdapter};
use crate::traits::ExportSink;

/// Result of a successful processing session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Shards the input was split into
    pub shards: usize,
    /// Files processed, equal to the number of progress notifications
    pub processed: usize,
    /// Staging keys in the order their progress notifications arrived
    pub keys: Vec<ArtifactKey>,
}

/// Coordinates processing sessions and exports over one staging store
pub struct Orchestrator<S: ?Sized, T> {
    config: OrchestratorConfig,
    store: Arc<S>,
    partitioner: WorkPartitioner,
    adapter: RemoteCallAdapter<S, T>,
    flight: SingleFlight,
}

impl<S, T> Orchestrator<S, T>
where
    S: StagingStore + ?Sized + 'static,
    T: Transformer,
{
    /// Create an orchestrator with the default configuration
    pub fn new(store: Arc<S>, transformer: T) -> Self {
        let config = OrchestratorConfig::default();
        Self {
            partitioner: WorkPartitioner::new(config.max_workers),
            adapter: RemoteCallAdapter::new(store.clone(), transformer),
            flight: SingleFlight::new(),
            config,
            store,
        }
    }

    /// Create an orchestrator with an explicit, validated configuration
    pub fn with_config(store: Arc<S>, transformer: T, config: OrchestratorConfig) -> OrchestratorResult<Self> {
        config.validate()?;
        Ok(Self {
            partitioner: WorkPartitioner::new(config.max_workers),
            adapter: RemoteCallAdapter::new(store.clone(), transformer),
            flight: SingleFlight::new(),
            config,
            store,
        })
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Whether a session is currently running
    pub fn is_processing(&self) -> bool {
        self.flight.is_active()
    }

    pub async fn staged_count(&self) -> OrchestratorResult<usize> {
        Ok(self.store.len().await?)
    }

    /// Process `files` across the execution units and stage every result.
    ///
    /// Fails immediately with [`OrchestratorError::ConcurrentSession`] while
    /// another session runs on this instance. The store is cleared before any
    /// shard starts. Resolves only once every shard has finished; a shard
    /// stops at its first failing file while the others run to completion,
    /// and the first failure reported is returned. Artifacts staged before a
    /// failure are kept. If this future is dropped early, the session stays
    /// claimed until its units have stopped, and they stage nothing further.
    pub async fn start(&self, files: Vec<InputFile>, config: ProcessingConfig) -> OrchestratorResult<SessionSummary> {
        let session = self.flight.acquire()?;
        let file_count = files.len();

        unit_info!(UnitId::Orchestrator, "🚀 Starting session with {} files", file_count);
        self.store.clear().await?;

        let shards = self.partitioner.partition(files);
        let shard_count = shards.len();
        logging::log_progress(
            UnitId::Orchestrator,
            "Partitioned",
            &format!("{file_count} files into {shard_count} shards"),
        );

        let mut processed = 0;
        let mut keys = Vec::with_capacity(file_count);
        let mut on_progress_change = config.on_progress_change;

        let reports = self
            .adapter
            .run_shards(shards, session.clone(), |key| {
                processed += 1;
                keys.push(key);
                if let Some(callback) = on_progress_change.as_mut() {
                    callback(processed);
                }
            })
            .await?;

        let mut first_error = None;
        for report in reports {
            if let ShardOutcome::Failed { processed, failure } = report.outcome {
                unit_error!(
                    UnitId::Orchestrator,
                    "❌ Shard {} on unit {} failed after {} files: {:?} {}",
                    report.shard,
                    report.unit,
                    processed,
                    failure.kind,
                    failure.message
                );
                first_error.get_or_insert(OrchestratorError::from_failure(report.unit, failure));
            }
        }

        if let Some(error) = first_error {
            return Err(error);
        }

        logging::log_success(
            UnitId::Orchestrator,
            &format!("Session finished: {processed} files staged across {shard_count} shards"),
        );
        Ok(SessionSummary {
            shards: shard_count,
            processed,
            keys,
        })
    }

    /// Drain the staging store into `sink` at the pace set by `config`.
    ///
    /// May be repeated until the next session clears the store. Must not be
    /// called while a session is running.
    pub async fn export<K>(&self, sink: &K, config: ExportConfig) -> OrchestratorResult<ExportReport>
    where
        K: ExportSink + ?Sized,
    {
        ExportThrottler::new(config)?.drain(self.store.as_ref(), sink).await
    }

    /// Clear the staging store and release its contents
    pub async fn dispose(&self) -> OrchestratorResult<()> {
        self.store.dispose().await?;
        unit_info!(UnitId::Orchestrator, "🧹 Staging store disposed");
        Ok(())
    }
}
