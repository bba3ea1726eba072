use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::StagingStore;
use crate::errors::SharedResult;
use crate::types::{ArtifactKey, StagedArtifact};

/// In-process staging store backed by a hash map
#[derive(Debug, Default)]
pub struct MemoryStagingStore {
    entries: RwLock<HashMap<ArtifactKey, StagedArtifact>>,
}

impl MemoryStagingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StagingStore for MemoryStagingStore {
    async fn clear(&self) -> SharedResult<()> {
        self.entries.write().await.clear();
        Ok(())
    }

    async fn set(&self, key: ArtifactKey, artifact: StagedArtifact) -> SharedResult<()> {
        self.entries.write().await.insert(key, artifact);
        Ok(())
    }

    async fn get(&self, key: ArtifactKey) -> SharedResult<Option<StagedArtifact>> {
        Ok(self.entries.read().await.get(&key).cloned())
    }

    async fn keys(&self) -> SharedResult<Vec<ArtifactKey>> {
        Ok(self.entries.read().await.keys().copied().collect())
    }

    async fn len(&self) -> SharedResult<usize> {
        Ok(self.entries.read().await.len())
    }
}
