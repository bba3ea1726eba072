//! Transform seam used by execution units

use chrono::{DateTime, Utc};

use crate::error::TransformError;

/// One file handed to a [`Transformer`]
#[derive(Debug, Clone, Copy)]
pub struct TransformInput<'a> {
    pub name: &'a str,
    pub modified: DateTime<Utc>,
    pub content: &'a [u8],
}

/// Per-file transformation routine run inside an execution unit.
///
/// Every unit receives its own clone of the transformer and builds its own
/// engine through [`Transformer::initialize`] exactly once, before its first
/// task. Engines are never shared between units.
pub trait Transformer: Clone + Send + Sync + 'static {
    /// Unit-local state produced by the one-time initialization
    type Engine: Send + Sync + 'static;

    /// Build the unit-local engine
    fn initialize(&self) -> Result<Self::Engine, TransformError>;

    /// Transform one file's content; name and modification time are kept by the caller
    fn transform(&self, engine: &Self::Engine, input: &TransformInput<'_>) -> Result<Vec<u8>, TransformError>;
}
