//! Shared types for the sharded image processing pipeline
//!
//! Contains only what crosses the isolation boundary between the
//! orchestrator and its execution units: task data, boundary messages,
//! the staging store contract and the logging helpers both sides use.

pub mod errors;
pub mod logging;
pub mod messages;
pub mod staging;
pub mod types;

pub use errors::*;
pub use types::*;

pub use messages::{
    // Orchestrator -> Unit
    ShardInvocation, UnitRequest,

    // Unit -> Orchestrator
    CallbackReply, FailureKind, ShardFailure, ShardOutcome, UnitEvent,

    // Callback proxy
    CallbackHandle,
};

pub use staging::{entries, MemoryStagingStore, MockStagingStore, RedbStagingStore, StagingStore};
