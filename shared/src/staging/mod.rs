//! Staging store contract and its backends
//!
//! The store buffers transformed artifacts between processing and export.
//! It is the only resource shared by the orchestrator and its execution
//! units, so every backend must be usable from several threads at once.
//! Iteration order is unspecified for every backend.

mod memory;
mod redb_store;

pub use memory::MemoryStagingStore;
pub use redb_store::RedbStagingStore;

use async_trait::async_trait;
use futures_util::stream::{self, Stream, StreamExt};

use crate::errors::SharedResult;
use crate::types::{ArtifactKey, StagedArtifact, UnitId};

/// Keyed container for transformed artifacts
#[mockall::automock]
#[async_trait]
pub trait StagingStore: Send + Sync {
    /// Remove every entry
    async fn clear(&self) -> SharedResult<()>;

    /// Store `artifact` under `key`; re-setting identical content is a no-op
    async fn set(&self, key: ArtifactKey, artifact: StagedArtifact) -> SharedResult<()>;

    /// Fetch the artifact stored under `key`, if any
    async fn get(&self, key: ArtifactKey) -> SharedResult<Option<StagedArtifact>>;

    /// Snapshot of the keys currently stored
    async fn keys(&self) -> SharedResult<Vec<ArtifactKey>>;

    /// Number of stored entries
    async fn len(&self) -> SharedResult<usize>;

    /// Release the store's contents
    async fn dispose(&self) -> SharedResult<()> {
        self.clear().await
    }
}

/// Lazily walk every stored artifact.
///
/// The key set is snapshotted on first poll and each artifact is fetched on
/// demand, so the stream can be restarted by calling this again. Keys that
/// disappear between the snapshot and the fetch are skipped.
pub fn entries<'a, S>(store: &'a S) -> impl Stream<Item = SharedResult<StagedArtifact>> + 'a
where
    S: StagingStore + ?Sized,
{
    stream::once(store.keys())
        .map(|keys| {
            let keys: Vec<SharedResult<ArtifactKey>> = match keys {
                Ok(keys) => keys.into_iter().map(Ok).collect(),
                Err(e) => vec![Err(e)],
            };
            stream::iter(keys)
        })
        .flatten()
        .filter_map(move |key| async move {
            match key {
                Ok(key) => match store.get(key).await {
                    Ok(Some(artifact)) => Some(Ok(artifact)),
                    Ok(None) => {
                        let unit = UnitId::current();
                        crate::unit_warn!(unit, "⚠️ Staged artifact {} disappeared before it was read", key);
                        None
                    }
                    Err(e) => Some(Err(e)),
                },
                Err(e) => Some(Err(e)),
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SharedError;
    use chrono::Utc;
    use futures_util::TryStreamExt;

    fn artifact(name: &str) -> StagedArtifact {
        StagedArtifact {
            id: ArtifactKey::new(),
            payload: name.as_bytes().to_vec(),
            original_name: name.to_string(),
            modified: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_entries_yields_every_artifact() {
        let store = MemoryStagingStore::new();
        for name in ["a.jpg", "b.jpg", "c.jpg"] {
            let item = artifact(name);
            store.set(item.id, item).await.unwrap();
        }

        let mut names: Vec<String> = entries(&store)
            .map_ok(|item| item.original_name)
            .try_collect()
            .await
            .unwrap();
        names.sort();

        assert_eq!(names, vec!["a.jpg", "b.jpg", "c.jpg"]);
    }

    #[tokio::test]
    async fn test_entries_skips_keys_removed_after_snapshot() {
        let kept = artifact("kept.jpg");
        let kept_key = kept.id;
        let vanished = ArtifactKey::new();

        let mut store = MockStagingStore::new();
        store
            .expect_keys()
            .returning(move || Ok(vec![vanished, kept_key]));
        store.expect_get().returning(move |key| {
            if key == kept_key {
                Ok(Some(kept.clone()))
            } else {
                Ok(None)
            }
        });

        let items: Vec<StagedArtifact> = entries(&store).try_collect().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].original_name, "kept.jpg");
    }

    #[tokio::test]
    async fn test_entries_surfaces_key_listing_failure() {
        let mut store = MockStagingStore::new();
        store
            .expect_keys()
            .returning(|| Err(SharedError::store("keys", "backend offline")));

        let result: SharedResult<Vec<StagedArtifact>> = entries(&store).try_collect().await;
        assert!(matches!(result, Err(SharedError::StoreError { .. })));
    }
}
