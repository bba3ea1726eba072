//! Orchestrator library for sharded batch image processing
//!
//! Splits a batch of input files across a small pool of isolated execution
//! units, tracks per-file progress through a proxied callback, stages every
//! transformed file and later exports the staged files at a throttled rate.

pub mod config;
pub mod core;
pub mod error;
pub mod orchestrator;
pub mod services;
pub mod traits;

// Re-export commonly used types
pub use config::{ExportConfig, OrchestratorConfig, ProcessingConfig, ProgressCallback};
pub use crate::core::{CallbackRegistry, SessionGuard, SingleFlight, WorkPartitioner};
pub use error::{OrchestratorError, OrchestratorResult};
pub use orchestrator::{Orchestrator, SessionSummary};
pub use services::{DirectorySink, ExportReport, ExportThrottler, RemoteCallAdapter, ShardReport};
pub use traits::{ExportSink, MockExportSink};
