//! Project data sources.
//!
//! The alert board only needs the full project list; where it comes from is
//! behind [`ProjectSource`]. Adapters exist for the REST API, the Supabase
//! PostgREST endpoint, a local JSON file and an in-memory list.

pub mod file;
pub mod rest;
pub mod supabase;

use async_trait::async_trait;
use tracing::debug;

use crate::error::SourceError;
use crate::model::{ProjectPayload, ProjectSnapshot};

pub use file::FileProjectSource;
pub use rest::RestProjectSource;
pub use supabase::SupabaseProjectSource;

/// Largest error body kept in [`SourceError::Status`].
const MAX_ERROR_BODY: usize = 512;

/// Supplies the current project list.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProjectSource: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Fetch every project with its schedule, financial and application
    /// records.
    async fn fetch_projects(&self) -> Result<Vec<ProjectSnapshot>, SourceError>;
}

/// Fixed in-memory project list.
#[derive(Debug, Clone, Default)]
pub struct StaticProjectSource {
    projects: Vec<ProjectSnapshot>,
}

impl StaticProjectSource {
    #[must_use]
    pub fn new(projects: Vec<ProjectSnapshot>) -> Self {
        Self { projects }
    }
}

#[async_trait]
impl ProjectSource for StaticProjectSource {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn fetch_projects(&self) -> Result<Vec<ProjectSnapshot>, SourceError> {
        Ok(self.projects.clone())
    }
}

/// Decode a store response, mapping non-success statuses to
/// [`SourceError::Status`].
async fn read_projects(response: reqwest::Response) -> Result<Vec<ProjectSnapshot>, SourceError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let mut body = body;
        if body.len() > MAX_ERROR_BODY {
            let cut = (0..=MAX_ERROR_BODY)
                .rev()
                .find(|i| body.is_char_boundary(*i))
                .unwrap_or(0);
            body.truncate(cut);
        }
        return Err(SourceError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let projects = serde_json::from_str::<ProjectPayload>(&body)?.into_projects();
    debug!(count = projects.len(), "Decoded project list");
    Ok(projects)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_source_returns_projects() {
        let source = StaticProjectSource::new(vec![ProjectSnapshot::new(1, "P-1", "one")]);
        let projects = source.fetch_projects().await.unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(source.name(), "static");
    }
}
