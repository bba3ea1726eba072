//! Execution units for sharded image processing
//!
//! A unit is an isolated thread with its own runtime and its own lazily
//! built transform engine. It receives marshaled shard invocations,
//! processes their files strictly in order, stages every result and
//! reports progress through a proxied callback.

pub mod error;
pub mod processor;
pub mod proxy;
pub mod services;
pub mod traits;
pub mod unit;

pub use error::{TransformError, WorkerError, WorkerResult};
pub use processor::{ShardProcessor, StopSignal};
pub use proxy::ProgressProxy;
pub use services::{PanoramaEngine, PanoramaTransformer};
pub use traits::{TransformInput, Transformer};
pub use unit::{spawn_unit, UnitHandle};
