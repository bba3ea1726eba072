//! Unit-side proxy for a callback registered in the orchestrator

use tokio::sync::{mpsc, oneshot};

use shared::{ArtifactKey, CallbackHandle, CallbackReply, UnitEvent};
use crate::error::{WorkerError, WorkerResult};

/// Stand-in for the orchestrator's progress callback.
///
/// Each [`call`](ProgressProxy::call) becomes one [`UnitEvent::Callback`]
/// and resolves only once the orchestrator has run the real callback.
#[derive(Debug, Clone)]
pub struct ProgressProxy {
    unit: u32,
    handle: CallbackHandle,
    events: mpsc::UnboundedSender<UnitEvent>,
}

impl ProgressProxy {
    pub fn new(unit: u32, handle: CallbackHandle, events: mpsc::UnboundedSender<UnitEvent>) -> Self {
        Self { unit, handle, events }
    }

    pub fn handle(&self) -> CallbackHandle {
        self.handle
    }

    /// Whether the orchestrator has stopped listening for callbacks
    pub fn is_closed(&self) -> bool {
        self.events.is_closed()
    }

    /// Invoke the remote callback with `key` and wait for the round trip
    pub async fn call(&self, key: ArtifactKey) -> WorkerResult<()> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.events
            .send(UnitEvent::Callback {
                unit: self.unit,
                handle: self.handle,
                key,
                reply: reply_tx,
            })
            .map_err(|_| self.error("orchestrator is no longer listening"))?;

        match reply_rx.await {
            Ok(CallbackReply::Delivered) => Ok(()),
            Ok(CallbackReply::UnknownHandle) => Err(self.error("no callback registered under this handle")),
            Err(_) => Err(self.error("reply dropped before the callback ran")),
        }
    }

    fn error(&self, message: &str) -> WorkerError {
        WorkerError::CallbackError {
            handle: self.handle,
            message: message.to_string(),
        }
    }
}
