//! Service-specific tests
//!
//! One file per service, sharing the fixtures below.

mod adapter;

// Common test utilities for services
pub mod common {
    use chrono::{TimeZone, Utc};
    use shared::{ArtifactKey, InputFile, StagedArtifact};
    use std::time::Duration;
    use tokio::time::timeout;
    use worker::{TransformError, TransformInput, Transformer};

    use crate::core::{SessionGuard, SingleFlight};

    /// Standard timeout for async operations in tests
    pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

    /// Helper to run async operations with timeout
    pub async fn with_timeout<T, F>(future: F) -> Result<T, tokio::time::error::Elapsed>
    where
        F: std::future::Future<Output = T>,
    {
        timeout(TEST_TIMEOUT, future).await
    }

    pub fn artifact(name: &str, payload: &[u8]) -> StagedArtifact {
        StagedArtifact {
            id: ArtifactKey::new(),
            payload: payload.to_vec(),
            original_name: name.to_string(),
            modified: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    /// Claim on a fresh flight, for runs that need no guard of their own
    pub fn session() -> SessionGuard {
        SingleFlight::new().acquire().unwrap()
    }

    pub fn input(name: &str, content: &[u8]) -> InputFile {
        InputFile::from_bytes(name, Utc::now(), content.to_vec())
    }

    /// Byte-reversing transformer that rejects `b"corrupt"`
    #[derive(Clone, Default)]
    pub struct ReverseTransformer;

    impl Transformer for ReverseTransformer {
        type Engine = ();

        fn initialize(&self) -> Result<(), TransformError> {
            Ok(())
        }

        fn transform(&self, _: &(), input: &TransformInput<'_>) -> Result<Vec<u8>, TransformError> {
            if input.content == b"corrupt" {
                return Err(TransformError::Decode {
                    name: input.name.to_string(),
                    reason: "corrupt input".to_string(),
                });
            }
            Ok(input.content.iter().rev().copied().collect())
        }
    }
}
