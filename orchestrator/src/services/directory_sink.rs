//! Export sink writing artifacts into a local directory

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::traits::ExportSink;
use shared::{unit_debug, UnitId};

/// Saves every exported artifact as `<dir>/<name>`
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Target path for `name`, keeping only its final component
    fn target(&self, name: &str) -> OrchestratorResult<PathBuf> {
        let file_name = Path::new(name)
            .file_name()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| OrchestratorError::Sink {
                name: name.to_string(),
                message: "artifact name has no file component".to_string(),
            })?;
        Ok(self.dir.join(file_name))
    }
}

#[async_trait]
impl ExportSink for DirectorySink {
    async fn save(&self, name: &str, content: &[u8]) -> OrchestratorResult<()> {
        let target = self.target(name)?;
        let sink_error = |e: std::io::Error| OrchestratorError::Sink {
            name: name.to_string(),
            message: e.to_string(),
        };

        fs::create_dir_all(&self.dir).await.map_err(sink_error)?;
        fs::write(&target, content).await.map_err(sink_error)?;

        unit_debug!(UnitId::Orchestrator, "Saved {} ({} bytes)", target.display(), content.len());
        Ok(())
    }
}
