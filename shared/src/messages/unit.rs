//! Orchestrator ↔ ExecutionUnit communication messages

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::oneshot;

use crate::errors::{SharedError, SharedResult};
use crate::types::{ArtifactKey, Shard};

/// Reference to a callback living in the orchestrator's dispatch table.
///
/// Units never hold the callback itself, only this id; invoking it means
/// sending a [`UnitEvent::Callback`] carrying the handle back home.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallbackHandle(pub u64);

impl fmt::Display for CallbackHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "callback#{}", self.0)
    }
}

/// Single invocation message: one shard plus the proxy for its progress callback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShardInvocation {
    pub unit: u32,
    pub shard: Shard,
    pub on_processed: CallbackHandle,
}

impl ShardInvocation {
    /// Marshal into the wire payload carried by [`UnitRequest::Invoke`]
    pub fn encode(&self) -> SharedResult<Vec<u8>> {
        bincode::serialize(self).map_err(SharedError::from)
    }

    pub fn decode(payload: &[u8]) -> SharedResult<Self> {
        bincode::deserialize(payload).map_err(|e| SharedError::DeserializationError {
            message: e.to_string(),
        })
    }
}

/// Requests sent from Orchestrator to an ExecutionUnit
#[derive(Debug)]
pub enum UnitRequest {
    /// Run a marshaled [`ShardInvocation`]
    Invoke { payload: Vec<u8> },

    /// Stop the unit's event loop and let its thread exit
    Terminate,
}

/// Orchestrator's answer to a proxied callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallbackReply {
    /// The registered callback ran
    Delivered,
    /// No callback is registered under the handle
    UnknownHandle,
}

/// Events sent from an ExecutionUnit back to the Orchestrator
#[derive(Debug)]
pub enum UnitEvent {
    /// Proxied callback invocation; the unit waits on `reply` before continuing
    Callback {
        unit: u32,
        handle: CallbackHandle,
        key: ArtifactKey,
        reply: oneshot::Sender<CallbackReply>,
    },

    /// The unit's shard reached its outcome
    Finished { unit: u32, outcome: ShardOutcome },
}

/// Category of a shard failure, preserved across the boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// The transform routine rejected a file
    Transform,
    /// The unit's transform engine could not be initialized
    EngineInit,
    /// Writing to the staging store failed
    Staging,
    /// Input content could not be read
    Read,
    /// The progress callback round trip failed
    Callback,
    /// The invocation payload could not be decoded
    Protocol,
    /// The shard panicked
    Panicked,
    /// The unit was told to stop before the shard finished
    Stopped,
}

/// Serializable description of why a shard stopped early
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShardFailure {
    pub kind: FailureKind,
    /// Name of the file being processed when the failure happened
    pub file: Option<String>,
    pub message: String,
}

/// Final report of a unit for its shard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShardOutcome {
    Completed { processed: usize },
    Failed { processed: usize, failure: ShardFailure },
}

impl ShardOutcome {
    pub fn processed(&self) -> usize {
        match self {
            ShardOutcome::Completed { processed } | ShardOutcome::Failed { processed, .. } => *processed,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ShardOutcome::Completed { .. })
    }
}
