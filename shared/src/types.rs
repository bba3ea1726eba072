//! Core shared types and identifiers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::errors::{SharedError, SharedResult};

thread_local! {
    /// Execution context of the current thread - units set this on their own thread
    static CURRENT_UNIT: Cell<UnitId> = const { Cell::new(UnitId::Orchestrator) };
}

/// Identifier for the execution context emitting a log line or message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitId {
    /// The orchestrator's control flow (default for every thread)
    Orchestrator,
    /// Execution unit with a 1-based number
    Unit(u32),
}

impl UnitId {
    /// Mark the calling thread as belonging to execution unit `id`
    pub fn enter_unit(id: u32) -> UnitId {
        let unit = UnitId::Unit(id);
        CURRENT_UNIT.with(|current| current.set(unit));
        unit
    }

    /// Identity of the calling thread
    pub fn current() -> UnitId {
        CURRENT_UNIT.with(|current| current.get())
    }

    pub fn unit_number(&self) -> Option<u32> {
        match self {
            UnitId::Unit(id) => Some(*id),
            UnitId::Orchestrator => None,
        }
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitId::Unit(id) => write!(f, "unit_{id}"),
            UnitId::Orchestrator => write!(f, "orchestrator"),
        }
    }
}

/// Unique key of a staged artifact, generated at write time
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArtifactKey(Uuid);

impl ArtifactKey {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> SharedResult<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| SharedError::InvalidKey { input: s.to_string() })
    }
}

impl Default for ArtifactKey {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where the bytes of an input file live
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FileSource {
    /// Content already held in memory
    Memory(Vec<u8>),
    /// Content read from disk by the unit that processes it
    Path(PathBuf),
}

/// One input file: binary content, original name and modification time
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InputFile {
    pub name: String,
    pub modified: DateTime<Utc>,
    pub source: FileSource,
}

impl InputFile {
    pub fn from_bytes(name: impl Into<String>, modified: DateTime<Utc>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            modified,
            source: FileSource::Memory(content),
        }
    }

    /// Describe a file on disk; its content is only read once a unit picks it up
    pub async fn from_path(path: impl AsRef<Path>) -> SharedResult<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());

        let metadata = tokio::fs::metadata(path).await.map_err(|e| SharedError::ReadError {
            name: name.clone(),
            message: e.to_string(),
        })?;
        let modified = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        Ok(Self {
            name,
            modified,
            source: FileSource::Path(path.to_path_buf()),
        })
    }

    /// Read the binary content of this file
    pub async fn read(&self) -> SharedResult<Vec<u8>> {
        match &self.source {
            FileSource::Memory(content) => Ok(content.clone()),
            FileSource::Path(path) => tokio::fs::read(path).await.map_err(|e| SharedError::ReadError {
                name: self.name.clone(),
                message: e.to_string(),
            }),
        }
    }
}

/// One input file together with its position in the batch and its shard
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Index of the file in the caller's input order
    pub index: usize,
    /// Shard this task was assigned to
    pub shard: usize,
    pub file: InputFile,
}

/// Ordered run of tasks owned by exactly one execution unit
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Shard {
    pub index: usize,
    pub tasks: Vec<Task>,
}

impl Shard {
    pub fn new(index: usize) -> Self {
        Self { index, tasks: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Input indices of the tasks in execution order
    pub fn indices(&self) -> Vec<usize> {
        self.tasks.iter().map(|task| task.index).collect()
    }
}

/// Transformed file waiting in the staging store for export
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StagedArtifact {
    pub id: ArtifactKey,
    pub payload: Vec<u8>,
    pub original_name: String,
    pub modified: DateTime<Utc>,
}
