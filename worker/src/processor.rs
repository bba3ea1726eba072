//! Sequential shard processing inside one execution unit

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;

use shared::{
    unit_debug, unit_warn, ArtifactKey, Shard, ShardOutcome, StagedArtifact, StagingStore, Task, UnitId,
};
use crate::error::{WorkerError, WorkerResult};
use crate::proxy::ProgressProxy;
use crate::traits::{TransformInput, Transformer};

/// Flag shared between a unit handle and its processor; once raised the
/// processor stages nothing more
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Runs the tasks of a shard one after another against a unit-local engine
pub struct ShardProcessor<S: ?Sized, T: Transformer> {
    id: u32,
    unit: UnitId,
    store: Arc<S>,
    transformer: T,
    engine: OnceCell<T::Engine>,
    stop: StopSignal,
}

impl<S, T> ShardProcessor<S, T>
where
    S: StagingStore + ?Sized,
    T: Transformer,
{
    pub fn new(unit: u32, store: Arc<S>, transformer: T) -> Self {
        Self {
            id: unit,
            unit: UnitId::Unit(unit),
            store,
            transformer,
            engine: OnceCell::new(),
            stop: StopSignal::new(),
        }
    }

    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    pub fn stop_signal(&self) -> &StopSignal {
        &self.stop
    }

    /// Unit-local engine, initialized on first use.
    ///
    /// Concurrent first callers all await the same initialization.
    pub async fn engine(&self) -> WorkerResult<&T::Engine> {
        let engine = self
            .engine
            .get_or_try_init(|| async {
                unit_debug!(self.unit, "🔧 Initializing transform engine");
                self.transformer.initialize()
            })
            .await?;
        Ok(engine)
    }

    pub fn is_initialized(&self) -> bool {
        self.engine.initialized()
    }

    /// Fails once the unit was told to stop or nobody is listening for its progress
    fn ensure_running(&self, progress: &ProgressProxy) -> WorkerResult<()> {
        if self.stop.is_raised() || progress.is_closed() {
            return Err(WorkerError::Stopped { unit: self.id });
        }
        Ok(())
    }

    /// Process one task: read, transform, stage under a fresh key, notify.
    ///
    /// Nothing is staged once the unit has been stopped.
    pub async fn process_task(&self, task: &Task, progress: &ProgressProxy) -> WorkerResult<ArtifactKey> {
        self.ensure_running(progress)?;
        let engine = self.engine().await?;
        let content = task.file.read().await?;

        let payload = self.transformer.transform(
            engine,
            &TransformInput {
                name: &task.file.name,
                modified: task.file.modified,
                content: &content,
            },
        )?;

        self.ensure_running(progress)?;
        let key = ArtifactKey::new();
        let artifact = StagedArtifact {
            id: key,
            payload,
            original_name: task.file.name.clone(),
            modified: task.file.modified,
        };
        self.store.set(key, artifact).await?;

        progress.call(key).await?;
        unit_debug!(self.unit, "Staged {} as {}", task.file.name, key);
        Ok(key)
    }

    /// Run every task of `shard` in order, stopping at the first failure
    pub async fn run(&self, shard: &Shard, progress: &ProgressProxy) -> ShardOutcome {
        let mut processed = 0;

        for task in &shard.tasks {
            if let Err(e) = self.process_task(task, progress).await {
                unit_warn!(
                    self.unit,
                    "⚠️ Shard {} stopped at {} after {} of {} files: {}",
                    shard.index,
                    task.file.name,
                    processed,
                    shard.len(),
                    e
                );
                return ShardOutcome::Failed {
                    processed,
                    failure: e.into_failure(Some(task.file.name.clone())),
                };
            }
            processed += 1;
        }

        ShardOutcome::Completed { processed }
    }
}
