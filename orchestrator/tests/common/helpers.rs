//! Test helpers and builder patterns for orchestrator tests
//!
//! This module provides convenient helper functions and builder patterns
//! to reduce test boilerplate and improve maintainability.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use ::orchestrator::{Orchestrator, OrchestratorConfig, ProcessingConfig};
use shared::{MemoryStagingStore, StagingStore};
use worker::Transformer;

use super::fixtures::{RecordingTransformer, TestFixtures};

/// Type alias for the orchestrator used by most tests
pub type TestOrchestrator = Orchestrator<MemoryStagingStore, RecordingTransformer>;

/// Builder pattern for creating test orchestrators with sensible defaults
pub struct OrchestratorBuilder {
    max_workers: usize,
    store: Arc<MemoryStagingStore>,
    transformer: RecordingTransformer,
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            max_workers: TestFixtures::DEFAULT_MAX_WORKERS,
            store: Arc::new(MemoryStagingStore::new()),
            transformer: RecordingTransformer::new(),
        }
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    pub fn with_store(mut self, store: Arc<MemoryStagingStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_transformer(mut self, transformer: RecordingTransformer) -> Self {
        self.transformer = transformer;
        self
    }

    pub fn build(self) -> TestOrchestrator {
        let config = OrchestratorConfig::new().with_max_workers(self.max_workers);
        Orchestrator::with_config(self.store, self.transformer, config).unwrap()
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper functions for common test operations
pub struct TestHelpers;

impl TestHelpers {
    /// Processing config whose progress values land in the returned vector
    pub fn recording_progress() -> (ProcessingConfig, Arc<Mutex<Vec<usize>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let config = ProcessingConfig::new().with_progress(move |count| sink.lock().unwrap().push(count));
        (config, seen)
    }

    /// Wait for `orchestrator` to release its session, failing after a few seconds
    pub async fn wait_until_idle<S, T>(orchestrator: &Orchestrator<S, T>)
    where
        S: StagingStore + ?Sized + 'static,
        T: Transformer,
    {
        tokio::time::timeout(Duration::from_secs(5), async {
            while orchestrator.is_processing() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("session was never released");
    }

    /// Progress must run 1, 2, ..., `total`
    pub fn assert_progress(seen: &[usize], total: usize) {
        assert_eq!(seen.len(), total, "one notification per file");
        assert_eq!(seen, (1..=total).collect::<Vec<_>>().as_slice());
    }
}
