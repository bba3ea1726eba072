//! Core orchestration logic
//!
//! Pure, synchronous building blocks with no I/O: partitioning, the
//! single-flight guard and the callback dispatch table.

pub mod callbacks;
pub mod guard;
pub mod partitioner;

pub use callbacks::CallbackRegistry;
pub use guard::{SessionGuard, SingleFlight};
pub use partitioner::WorkPartitioner;
