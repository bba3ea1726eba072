//! Orchestrator-specific error types

use thiserror::Error;
use shared::{FailureKind, ShardFailure, SharedError};
use worker::{TransformError, WorkerError};

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("A processing session is already active")]
    ConcurrentSession,

    #[error("Transform failed for {file}: {reason}")]
    Transform { file: String, reason: String },

    #[error("Execution unit {unit} failed to initialize: {reason}")]
    UnitInit { unit: u32, reason: String },

    #[error("Execution unit {unit} failed: {reason}")]
    UnitFailed { unit: u32, reason: String },

    #[error("Staging store error: {0}")]
    Store(#[from] SharedError),

    #[error("Export sink failed for {name}: {message}")]
    Sink { name: String, message: String },

    #[error("Configuration error: {field}: {reason}")]
    Configuration { field: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl OrchestratorError {
    /// Attribute an error raised while driving `unit` from this side of the boundary
    pub fn from_worker(unit: u32, error: WorkerError) -> Self {
        match error {
            WorkerError::Transform(TransformError::EngineInit { reason }) => {
                OrchestratorError::UnitInit { unit, reason }
            }
            WorkerError::Transform(TransformError::Decode { name, reason })
            | WorkerError::Transform(TransformError::Encode { name, reason }) => {
                OrchestratorError::Transform { file: name, reason }
            }
            WorkerError::Shared(e) => OrchestratorError::Store(e),
            WorkerError::IoError(e) => OrchestratorError::Io(e),
            WorkerError::UnitUnavailable { message, .. } => OrchestratorError::UnitInit { unit, reason: message },
            WorkerError::UnitPanicked { .. } => OrchestratorError::UnitFailed {
                unit,
                reason: "thread panicked".to_string(),
            },
            other => OrchestratorError::UnitFailed {
                unit,
                reason: other.to_string(),
            },
        }
    }

    /// Rebuild the caller-facing error for a shard that stopped early on `unit`
    pub fn from_failure(unit: u32, failure: ShardFailure) -> Self {
        let ShardFailure { kind, file, message } = failure;
        match kind {
            FailureKind::Transform => OrchestratorError::Transform {
                file: file.unwrap_or_default(),
                reason: message,
            },
            FailureKind::EngineInit => OrchestratorError::UnitInit { unit, reason: message },
            FailureKind::Staging => OrchestratorError::Store(SharedError::StoreError {
                operation: "set".to_string(),
                message,
            }),
            FailureKind::Read => OrchestratorError::Store(SharedError::ReadError {
                name: file.unwrap_or_default(),
                message,
            }),
            FailureKind::Callback | FailureKind::Protocol | FailureKind::Panicked | FailureKind::Stopped => {
                OrchestratorError::UnitFailed {
                    unit,
                    reason: format!("{kind:?}: {message}"),
                }
            }
        }
    }
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
