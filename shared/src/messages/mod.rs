//! Message types exchanged across the isolation boundary
//!
//! - `unit`: Orchestrator ↔ ExecutionUnit requests, events and outcomes

pub mod unit;

pub use unit::{
    CallbackHandle, CallbackReply, FailureKind, ShardFailure, ShardInvocation, ShardOutcome,
    UnitEvent, UnitRequest,
};
