//! Single-flight guard for processing sessions

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{OrchestratorError, OrchestratorResult};

/// Admits at most one active session at a time
#[derive(Debug, Clone, Default)]
pub struct SingleFlight {
    active: Arc<AtomicBool>,
}

/// Marks a session as active until it and all of its clones are dropped
#[derive(Debug, Clone)]
pub struct SessionGuard {
    _claim: Arc<Claim>,
}

#[derive(Debug)]
struct Claim {
    active: Arc<AtomicBool>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the flight, failing immediately if another session holds it
    pub fn acquire(&self) -> OrchestratorResult<SessionGuard> {
        self.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| OrchestratorError::ConcurrentSession)?;

        Ok(SessionGuard {
            _claim: Arc::new(Claim {
                active: self.active.clone(),
            }),
        })
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

impl Drop for Claim {
    fn drop(&mut self) {
        self.active.store(false, Ordering::Release);
    }
}
