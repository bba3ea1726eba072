//! Service implementations
//!
//! The adapter to execution units, the throttled exporter and the real
//! export sink. Everything here performs I/O or crosses a thread boundary.

pub mod adapter;
pub mod directory_sink;
pub mod exporter;

#[cfg(test)]
mod tests;

pub use adapter::{RemoteCallAdapter, ShardReport};
pub use directory_sink::DirectorySink;
pub use exporter::{ExportReport, ExportThrottler};
