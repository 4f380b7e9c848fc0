//! Project list from a JSON export on disk.

use async_trait::async_trait;
use std::path::PathBuf;

use super::ProjectSource;
use crate::error::SourceError;
use crate::model::{ProjectPayload, ProjectSnapshot};

/// Reads a bare project array or a paged response from `path` on every fetch.
#[derive(Debug, Clone)]
pub struct FileProjectSource {
    path: PathBuf,
}

impl FileProjectSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ProjectSource for FileProjectSource {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn fetch_projects(&self) -> Result<Vec<ProjectSnapshot>, SourceError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| SourceError::Io {
                path: self.path.display().to_string(),
                source,
            })?;
        Ok(serde_json::from_str::<ProjectPayload>(&raw)?.into_projects())
    }
}
