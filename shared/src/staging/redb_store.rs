use async_trait::async_trait;
use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::StagingStore;
use crate::errors::{SharedError, SharedResult};
use crate::types::{ArtifactKey, StagedArtifact};

// Key: ArtifactKey (uuid string) -> Value: StagedArtifact (bincode)
const ARTIFACTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("staged_artifacts");

fn fail<E: Display>(operation: &'static str) -> impl FnOnce(E) -> SharedError {
    move |error| SharedError::store(operation, error)
}

/// Staging store persisted in a local redb file
pub struct RedbStagingStore {
    db: Arc<Database>,
    path: PathBuf,
}

impl RedbStagingStore {
    /// Open (or create) the store file at `path`
    pub fn open(path: impl AsRef<Path>) -> SharedResult<Self> {
        let path = path.as_ref().to_path_buf();
        let db = Database::create(&path).map_err(fail("open"))?;

        let txn = db.begin_write().map_err(fail("open"))?;
        txn.open_table(ARTIFACTS_TABLE).map_err(fail("open"))?;
        txn.commit().map_err(fail("open"))?;

        Ok(Self {
            db: Arc::new(db),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run a redb transaction off the async executor
    async fn blocking<T, F>(&self, operation: &'static str, work: F) -> SharedResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> SharedResult<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || work(&db))
            .await
            .map_err(fail(operation))?
    }
}

#[async_trait]
impl StagingStore for RedbStagingStore {
    async fn clear(&self) -> SharedResult<()> {
        self.blocking("clear", |db| {
            let txn = db.begin_write().map_err(fail("clear"))?;
            txn.delete_table(ARTIFACTS_TABLE).map_err(fail("clear"))?;
            txn.open_table(ARTIFACTS_TABLE).map_err(fail("clear"))?;
            txn.commit().map_err(fail("clear"))?;
            Ok(())
        })
        .await
    }

    async fn set(&self, key: ArtifactKey, artifact: StagedArtifact) -> SharedResult<()> {
        self.blocking("set", move |db| {
            let bytes = bincode::serialize(&artifact)?;
            let key = key.to_string();

            let txn = db.begin_write().map_err(fail("set"))?;
            {
                let mut table = txn.open_table(ARTIFACTS_TABLE).map_err(fail("set"))?;
                table
                    .insert(key.as_str(), bytes.as_slice())
                    .map_err(fail("set"))?;
            }
            txn.commit().map_err(fail("set"))?;
            Ok(())
        })
        .await
    }

    async fn get(&self, key: ArtifactKey) -> SharedResult<Option<StagedArtifact>> {
        self.blocking("get", move |db| {
            let key = key.to_string();
            let txn = db.begin_read().map_err(fail("get"))?;
            let table = txn.open_table(ARTIFACTS_TABLE).map_err(fail("get"))?;

            match table.get(key.as_str()).map_err(fail("get"))? {
                Some(value) => {
                    let artifact = bincode::deserialize(value.value()).map_err(|e| {
                        SharedError::DeserializationError {
                            message: e.to_string(),
                        }
                    })?;
                    Ok(Some(artifact))
                }
                None => Ok(None),
            }
        })
        .await
    }

    async fn keys(&self) -> SharedResult<Vec<ArtifactKey>> {
        self.blocking("keys", |db| {
            let txn = db.begin_read().map_err(fail("keys"))?;
            let table = txn.open_table(ARTIFACTS_TABLE).map_err(fail("keys"))?;

            let mut keys = Vec::new();
            for entry in table.iter().map_err(fail("keys"))? {
                let (key, _) = entry.map_err(fail("keys"))?;
                keys.push(ArtifactKey::from_string(key.value())?);
            }
            Ok(keys)
        })
        .await
    }

    async fn len(&self) -> SharedResult<usize> {
        self.blocking("len", |db| {
            let txn = db.begin_read().map_err(fail("len"))?;
            let table = txn.open_table(ARTIFACTS_TABLE).map_err(fail("len"))?;
            Ok(table.len().map_err(fail("len"))? as usize)
        })
        .await
    }
}
