//! Project list straight from Supabase's PostgREST endpoint.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use super::{read_projects, ProjectSource};
use crate::error::SourceError;
use crate::model::ProjectSnapshot;

/// Projects with every relation the rules read.
const PROJECT_SELECT: &str = "*,financial(*),schedule(*),applications(*,application_type(*))";

#[derive(Debug, Clone)]
pub struct SupabaseProjectSource {
    url: String,
    anon_key: String,
    limit: u32,
    client: reqwest::Client,
}

impl SupabaseProjectSource {
    #[must_use]
    pub fn new(url: &str, anon_key: &str, limit: u32, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            url: url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            limit,
            client,
        }
    }
}

#[async_trait]
impl ProjectSource for SupabaseProjectSource {
    fn name(&self) -> &'static str {
        "supabase"
    }

    async fn fetch_projects(&self) -> Result<Vec<ProjectSnapshot>, SourceError> {
        if self.anon_key.is_empty() {
            return Err(SourceError::NotConfigured(
                "Supabase anon key is empty".to_string(),
            ));
        }

        let url = format!("{}/rest/v1/projects", self.url);
        debug!(url = %url, limit = self.limit, "Fetching projects from Supabase");

        let limit = self.limit.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[
                ("select", PROJECT_SELECT),
                ("order", "created_at.desc"),
                ("offset", "0"),
                ("limit", limit.as_str()),
            ])
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .send()
            .await?;

        read_projects(response).await
    }
}
