//! Execution unit lifecycle
//!
//! Each unit owns a dedicated OS thread running its own single-threaded
//! runtime. Nothing is shared with the orchestrator except the staging
//! store and two channels: requests in, events out.

use std::sync::Arc;
use std::thread::JoinHandle;
use tokio::sync::mpsc;

use shared::{
    unit_error, unit_info, unit_warn, FailureKind, ShardFailure, ShardInvocation, ShardOutcome, StagingStore,
    UnitEvent, UnitId, UnitRequest,
};
use crate::error::{WorkerError, WorkerResult};
use crate::processor::{ShardProcessor, StopSignal};
use crate::proxy::ProgressProxy;
use crate::traits::Transformer;

/// Orchestrator-side handle to a running execution unit
#[derive(Debug)]
pub struct UnitHandle {
    id: u32,
    requests: mpsc::UnboundedSender<UnitRequest>,
    stop: StopSignal,
    thread: Option<JoinHandle<()>>,
}

/// Start execution unit `id` on its own thread.
///
/// Outcomes and proxied callbacks are reported on `events`. The unit's
/// transform engine is not built until its first task.
pub fn spawn_unit<S, T>(
    id: u32,
    store: Arc<S>,
    transformer: T,
    events: mpsc::UnboundedSender<UnitEvent>,
) -> WorkerResult<UnitHandle>
where
    S: StagingStore + ?Sized + 'static,
    T: Transformer,
{
    let (requests_tx, requests_rx) = mpsc::unbounded_channel();
    let stop = StopSignal::new();
    let unit_stop = stop.clone();

    let thread = std::thread::Builder::new()
        .name(format!("unit-{id}"))
        .spawn(move || {
            let unit = UnitId::enter_unit(id);

            match tokio::runtime::Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime.block_on(unit_loop(id, store, transformer, unit_stop, requests_rx, events)),
                Err(e) => {
                    unit_error!(unit, "❌ Failed to start unit runtime: {}", e);
                    reject_invocations(id, requests_rx, events, e.to_string());
                }
            }
        })?;

    Ok(UnitHandle {
        id,
        requests: requests_tx,
        stop,
        thread: Some(thread),
    })
}

impl UnitHandle {
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn send(&self, request: UnitRequest) -> WorkerResult<()> {
        self.requests.send(request).map_err(|_| WorkerError::UnitUnavailable {
            unit: self.id,
            message: "request channel closed".to_string(),
        })
    }

    /// Marshal `invocation` and hand it to the unit
    pub fn invoke(&self, invocation: &ShardInvocation) -> WorkerResult<()> {
        let payload = invocation.encode()?;
        self.send(UnitRequest::Invoke { payload })
    }

    /// Stop the unit and wait for its thread to exit
    pub async fn terminate(mut self) -> WorkerResult<()> {
        // The unit may already be gone; joining below still reports a panic
        let _ = self.requests.send(UnitRequest::Terminate);
        self.stop.raise();

        if let Some(thread) = self.thread.take() {
            let unit = self.id;
            tokio::task::spawn_blocking(move || thread.join())
                .await?
                .map_err(|_| WorkerError::UnitPanicked { unit })?;
        }
        Ok(())
    }

    /// Stop the unit without waiting for it.
    ///
    /// The unit stages nothing after this returns, apart from a write that
    /// was already under way. Its thread is handed back for the caller to join.
    pub fn abandon(mut self) -> Option<JoinHandle<()>> {
        self.stop.raise();
        let _ = self.requests.send(UnitRequest::Terminate);
        self.thread.take()
    }
}

impl Drop for UnitHandle {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.stop.raise();
            let _ = self.requests.send(UnitRequest::Terminate);
        }
    }
}

async fn unit_loop<S, T>(
    id: u32,
    store: Arc<S>,
    transformer: T,
    stop: StopSignal,
    mut requests: mpsc::UnboundedReceiver<UnitRequest>,
    events: mpsc::UnboundedSender<UnitEvent>,
) where
    S: StagingStore + ?Sized + 'static,
    T: Transformer,
{
    let unit = UnitId::Unit(id);
    let processor = Arc::new(ShardProcessor::new(id, store, transformer).with_stop_signal(stop));
    unit_info!(unit, "🚀 Execution unit ready");

    while let Some(request) = requests.recv().await {
        match request {
            UnitRequest::Invoke { payload } => {
                let outcome = match ShardInvocation::decode(&payload) {
                    Ok(invocation) => run_invocation(id, processor.clone(), invocation, events.clone()).await,
                    Err(e) => {
                        unit_error!(unit, "❌ Rejected invocation payload: {}", e);
                        ShardOutcome::Failed {
                            processed: 0,
                            failure: WorkerError::from(e).into_failure(None),
                        }
                    }
                };

                if events.send(UnitEvent::Finished { unit: id, outcome }).is_err() {
                    unit_warn!(unit, "⚠️ Orchestrator stopped listening, shutting down");
                    break;
                }
            }
            UnitRequest::Terminate => break,
        }
    }

    unit_info!(unit, "🛑 Execution unit stopped");
}

/// Run one shard on its own task so a panic surfaces as an outcome instead of killing the unit
async fn run_invocation<S, T>(
    id: u32,
    processor: Arc<ShardProcessor<S, T>>,
    invocation: ShardInvocation,
    events: mpsc::UnboundedSender<UnitEvent>,
) -> ShardOutcome
where
    S: StagingStore + ?Sized + 'static,
    T: Transformer,
{
    let unit = UnitId::Unit(id);
    if invocation.unit != id {
        unit_warn!(unit, "⚠️ Invocation addressed to unit {} arrived here", invocation.unit);
    }

    unit_info!(
        unit,
        "📥 Shard {} received with {} files",
        invocation.shard.index,
        invocation.shard.len()
    );

    let progress = ProgressProxy::new(id, invocation.on_processed, events);
    let shard = invocation.shard;
    let task = tokio::spawn(async move { processor.run(&shard, &progress).await });

    match task.await {
        Ok(outcome) => outcome,
        Err(e) => {
            unit_error!(unit, "❌ Shard task aborted: {}", e);
            // Per-file progress already reached the orchestrator through callbacks
            ShardOutcome::Failed {
                processed: 0,
                failure: WorkerError::UnitPanicked { unit: id }.into_failure(None),
            }
        }
    }
}

/// Fallback loop for a unit whose runtime never started
fn reject_invocations(
    id: u32,
    mut requests: mpsc::UnboundedReceiver<UnitRequest>,
    events: mpsc::UnboundedSender<UnitEvent>,
    reason: String,
) {
    while let Some(request) = requests.blocking_recv() {
        match request {
            UnitRequest::Invoke { .. } => {
                let outcome = ShardOutcome::Failed {
                    processed: 0,
                    failure: ShardFailure {
                        kind: FailureKind::EngineInit,
                        file: None,
                        message: reason.clone(),
                    },
                };
                if events.send(UnitEvent::Finished { unit: id, outcome }).is_err() {
                    break;
                }
            }
            UnitRequest::Terminate => break,
        }
    }
}
