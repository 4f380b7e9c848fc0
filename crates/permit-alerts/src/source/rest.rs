//! Project list from the application's REST API.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use super::{read_projects, ProjectSource};
use crate::error::SourceError;
use crate::model::ProjectSnapshot;

const PROJECTS_PATH: &str = "/api/v1/projects/";

/// `GET {base_url}/api/v1/projects/?skip=0&limit=N`.
#[derive(Debug, Clone)]
pub struct RestProjectSource {
    base_url: String,
    limit: u32,
    client: reqwest::Client,
}

impl RestProjectSource {
    #[must_use]
    pub fn new(base_url: &str, limit: u32, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            limit,
            client,
        }
    }
}

#[async_trait]
impl ProjectSource for RestProjectSource {
    fn name(&self) -> &'static str {
        "rest"
    }

    async fn fetch_projects(&self) -> Result<Vec<ProjectSnapshot>, SourceError> {
        let url = format!("{}{PROJECTS_PATH}", self.base_url);
        debug!(url = %url, limit = self.limit, "Fetching projects");

        let response = self
            .client
            .get(&url)
            .query(&[("skip", 0), ("limit", self.limit)])
            .send()
            .await?;

        read_projects(response).await
    }
}
