//! Explicit configuration structures for sessions, exports and the orchestrator itself

use std::fmt;
use std::time::Duration;

use crate::error::{OrchestratorError, OrchestratorResult};

pub const DEFAULT_MAX_WORKERS: usize = 4;
pub const DEFAULT_EXPORT_BATCH_SIZE: usize = 10;
pub const DEFAULT_EXPORT_PAUSE: Duration = Duration::from_millis(1000);

/// Progress callback receiving the running count of processed files
pub type ProgressCallback = Box<dyn FnMut(usize) + Send>;

/// Orchestrator-wide settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Upper bound on concurrently running execution units
    pub max_workers: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
        }
    }
}

impl OrchestratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    pub fn validate(&self) -> OrchestratorResult<()> {
        if self.max_workers == 0 {
            return Err(OrchestratorError::Configuration {
                field: "max_workers".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Per-session settings passed to [`Orchestrator::start`](crate::Orchestrator::start)
#[derive(Default)]
pub struct ProcessingConfig {
    /// Invoked once per processed file with the running count
    pub on_progress_change: Option<ProgressCallback>,
}

impl ProcessingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: FnMut(usize) + Send + 'static,
    {
        self.on_progress_change = Some(Box::new(callback));
        self
    }
}

impl fmt::Debug for ProcessingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessingConfig")
            .field("on_progress_change", &self.on_progress_change.is_some())
            .finish()
    }
}

/// Pacing of a throttled export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportConfig {
    /// Artifacts forwarded between two pauses
    pub batch_size: usize,
    /// Pause inserted between consecutive batches
    pub pause: Duration,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_EXPORT_BATCH_SIZE,
            pause: DEFAULT_EXPORT_PAUSE,
        }
    }
}

impl ExportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    pub fn validate(&self) -> OrchestratorResult<()> {
        if self.batch_size == 0 {
            return Err(OrchestratorError::Configuration {
                field: "batch_size".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
