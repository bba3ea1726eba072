//! Execution unit error types

use shared::{CallbackHandle, FailureKind, ShardFailure, SharedError};
use thiserror::Error;

/// Result type for execution unit operations
pub type WorkerResult<T> = Result<T, WorkerError>;

/// Failure reported by a [`Transformer`](crate::traits::Transformer)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("Failed to decode {name}: {reason}")]
    Decode { name: String, reason: String },

    #[error("Failed to encode {name}: {reason}")]
    Encode { name: String, reason: String },

    #[error("Transform engine initialization failed: {reason}")]
    EngineInit { reason: String },
}

/// Execution unit error types
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    #[error("Shared component error: {0}")]
    Shared(#[from] SharedError),

    #[error("Progress callback {handle} failed: {message}")]
    CallbackError { handle: CallbackHandle, message: String },

    #[error("Execution unit {unit} is unavailable: {message}")]
    UnitUnavailable { unit: u32, message: String },

    #[error("Execution unit {unit} panicked")]
    UnitPanicked { unit: u32 },

    #[error("Execution unit {unit} was stopped")]
    Stopped { unit: u32 },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Task join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),
}

impl WorkerError {
    /// Category used when this error crosses back to the orchestrator
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            WorkerError::Transform(TransformError::EngineInit { .. }) => FailureKind::EngineInit,
            WorkerError::Transform(_) => FailureKind::Transform,
            WorkerError::Shared(SharedError::ReadError { .. }) | WorkerError::IoError(_) => FailureKind::Read,
            WorkerError::Shared(SharedError::DeserializationError { .. })
            | WorkerError::Shared(SharedError::ProtocolError { .. }) => FailureKind::Protocol,
            WorkerError::Shared(_) => FailureKind::Staging,
            WorkerError::CallbackError { .. } => FailureKind::Callback,
            WorkerError::UnitUnavailable { .. } => FailureKind::EngineInit,
            WorkerError::UnitPanicked { .. } | WorkerError::JoinError(_) => FailureKind::Panicked,
            WorkerError::Stopped { .. } => FailureKind::Stopped,
        }
    }

    /// Marshal into the serializable failure sent with [`shared::ShardOutcome::Failed`]
    pub fn into_failure(self, file: Option<String>) -> ShardFailure {
        let kind = self.failure_kind();
        let message = match self {
            // Keep the bare reason so the orchestrator can rebuild the transform error
            WorkerError::Transform(TransformError::Decode { reason, .. })
            | WorkerError::Transform(TransformError::Encode { reason, .. })
            | WorkerError::Transform(TransformError::EngineInit { reason }) => reason,
            other => other.to_string(),
        };
        ShardFailure { kind, file, message }
    }
}
