//! Common test utilities and infrastructure
//!
//! Shared fixtures, helpers and builders used across the orchestrator
//! integration suites.

#![allow(dead_code)]

pub mod fixtures;
pub mod helpers;

// Re-export commonly used items for convenience
pub use fixtures::{RecordingTransformer, TestFixtures, TransformCall};
pub use helpers::{OrchestratorBuilder, TestHelpers, TestOrchestrator};
