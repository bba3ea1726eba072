//! Remote call adapter
//!
//! Spawns one execution unit per shard, marshals each shard into a single
//! invocation message and serves the units' proxied progress callbacks
//! until every unit has reported. Units are torn down as soon as they
//! report, whatever the outcome. If the run is dropped midway the remaining
//! units are stopped and joined in the background, and the session stays
//! claimed until they have exited.

use futures_util::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

use shared::{
    logging, unit_debug, unit_error, unit_info, unit_warn, ArtifactKey, FailureKind, Shard, ShardFailure,
    ShardInvocation, ShardOutcome, StagingStore, UnitEvent, UnitId,
};
use worker::{spawn_unit, Transformer, UnitHandle};

use crate::core::{CallbackRegistry, SessionGuard};
use crate::error::{OrchestratorError, OrchestratorResult};

/// Final report of one shard
#[derive(Debug, Clone, PartialEq)]
pub struct ShardReport {
    pub unit: u32,
    pub shard: usize,
    pub outcome: ShardOutcome,
}

/// Bridges the orchestrator to its isolated execution units
pub struct RemoteCallAdapter<S: ?Sized, T> {
    store: Arc<S>,
    transformer: T,
}

impl<S, T> RemoteCallAdapter<S, T>
where
    S: StagingStore + ?Sized + 'static,
    T: Transformer,
{
    pub fn new(store: Arc<S>, transformer: T) -> Self {
        Self { store, transformer }
    }

    /// Run every shard on its own unit and wait for all of them.
    ///
    /// `on_processed` is called on the caller's task once per staged file.
    /// Reports are returned in the order units finished. `session` is kept
    /// claimed until every spawned unit has exited, even when this future is
    /// dropped before it resolves.
    pub async fn run_shards<F>(
        &self,
        shards: Vec<Shard>,
        session: SessionGuard,
        on_processed: F,
    ) -> OrchestratorResult<Vec<ShardReport>>
    where
        F: FnMut(ArtifactKey) + Send,
    {
        if shards.is_empty() {
            return Ok(Vec::new());
        }

        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let mut registry = CallbackRegistry::new();
        let handle = registry.register(on_processed);

        let mut units = self.spawn_units(shards.len(), events_tx, session).await?;
        let mut shard_of = HashMap::new();

        for shard in shards {
            let unit_id = shard.index as u32 + 1;
            let shard_index = shard.index;
            let invocation = ShardInvocation {
                unit: unit_id,
                shard,
                on_processed: handle,
            };

            let dispatched = match units.get(unit_id) {
                Some(unit) => unit
                    .invoke(&invocation)
                    .map_err(|e| OrchestratorError::from_worker(unit_id, e)),
                None => Err(OrchestratorError::UnitFailed {
                    unit: unit_id,
                    reason: "no unit spawned for shard".to_string(),
                }),
            };
            if let Err(e) = dispatched {
                drop(events_rx);
                units.terminate_all().await;
                return Err(e);
            }

            shard_of.insert(unit_id, shard_index);
        }

        unit_info!(UnitId::Orchestrator, "📤 Dispatched {} shards", shard_of.len());

        let mut reports = Vec::with_capacity(shard_of.len());
        while !units.is_empty() {
            let Some(event) = events_rx.recv().await else {
                // Every unit hung up without reporting
                let lost = units.ids();
                units.terminate_all().await;
                return Err(OrchestratorError::UnitFailed {
                    unit: lost.first().copied().unwrap_or_default(),
                    reason: format!("units {lost:?} stopped without reporting"),
                });
            };

            match event {
                UnitEvent::Callback { unit, handle, key, reply } => {
                    let answer = registry.dispatch(handle, key);
                    unit_debug!(UnitId::Orchestrator, "Callback from unit {} for {}: {:?}", unit, key, answer);
                    if reply.send(answer).is_err() {
                        unit_warn!(UnitId::Orchestrator, "⚠️ Unit {} dropped its callback reply", unit);
                    }
                }
                UnitEvent::Finished { unit, outcome } => {
                    let Some(handle) = units.remove(unit) else {
                        unit_warn!(UnitId::Orchestrator, "⚠️ Ignoring report from unknown unit {}", unit);
                        continue;
                    };

                    let outcome = Self::teardown(handle, outcome).await;
                    reports.push(ShardReport {
                        unit,
                        shard: shard_of.get(&unit).copied().unwrap_or_default(),
                        outcome,
                    });
                }
            }
        }

        registry.release(handle);
        Ok(reports)
    }

    async fn spawn_units(
        &self,
        count: usize,
        events: mpsc::UnboundedSender<UnitEvent>,
        session: SessionGuard,
    ) -> OrchestratorResult<UnitPool> {
        let mut units = UnitPool::new(session);

        for id in 1..=count as u32 {
            match spawn_unit(id, self.store.clone(), self.transformer.clone(), events.clone()) {
                Ok(unit) => units.insert(unit),
                Err(e) => {
                    logging::log_error(UnitId::Orchestrator, &format!("Spawning unit {id}"), &e);
                    units.terminate_all().await;
                    return Err(OrchestratorError::UnitInit {
                        unit: id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(units)
    }

    /// Terminate a unit that just reported, folding a crashed thread into its outcome
    async fn teardown(unit: UnitHandle, outcome: ShardOutcome) -> ShardOutcome {
        let id = unit.id();
        match unit.terminate().await {
            Ok(()) => outcome,
            Err(e) => {
                logging::log_error(UnitId::Unit(id), "Unit teardown", &e);
                match outcome {
                    ShardOutcome::Completed { processed } => ShardOutcome::Failed {
                        processed,
                        failure: ShardFailure {
                            kind: FailureKind::Panicked,
                            file: None,
                            message: e.to_string(),
                        },
                    },
                    failed => failed,
                }
            }
        }
    }
}

/// Units of one run, plus the session they keep claimed.
///
/// Units still held when the pool is dropped are stopped and joined on a
/// reaper thread, which releases the session once they have all exited.
struct UnitPool {
    units: HashMap<u32, UnitHandle>,
    session: Option<SessionGuard>,
}

impl UnitPool {
    fn new(session: SessionGuard) -> Self {
        Self {
            units: HashMap::new(),
            session: Some(session),
        }
    }

    fn insert(&mut self, unit: UnitHandle) {
        self.units.insert(unit.id(), unit);
    }

    fn get(&self, id: u32) -> Option<&UnitHandle> {
        self.units.get(&id)
    }

    fn remove(&mut self, id: u32) -> Option<UnitHandle> {
        self.units.remove(&id)
    }

    fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    fn ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.units.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    async fn terminate_all(&mut self) {
        join_all(self.units.drain().map(|(id, unit)| async move {
            if let Err(e) = unit.terminate().await {
                logging::log_error(UnitId::Unit(id), "Unit teardown", &e);
            }
        }))
        .await;
    }
}

impl Drop for UnitPool {
    fn drop(&mut self) {
        if self.units.is_empty() {
            return;
        }

        let threads: Vec<_> = self.units.drain().filter_map(|(_, unit)| unit.abandon()).collect();
        let session = self.session.take();
        unit_warn!(UnitId::Orchestrator, "⚠️ Run abandoned, stopping {} units", threads.len());

        let reaper = std::thread::Builder::new().name("unit-reaper".to_string()).spawn(move || {
            for thread in threads {
                if thread.join().is_err() {
                    unit_error!(UnitId::Orchestrator, "❌ Abandoned unit panicked while stopping");
                }
            }
            drop(session);
        });
        if let Err(e) = reaper {
            logging::log_error(UnitId::Orchestrator, "Spawning unit reaper", &e);
        }
    }
}
