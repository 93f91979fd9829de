use async_trait::async_trait;
use serde::Deserialize;

use crate::config::ArtifactoryConfig;
use crate::error::{AppError, AppResult};

use super::version::greatest_matching;
use super::{ArtifactResolver, ResolvedArtifact};

/// One entry in the artifact repository's version listing for a path.
#[derive(Debug, Deserialize)]
struct VersionEntry {
    version: String,
}

#[derive(Debug, Deserialize)]
struct VersionsResponse {
    #[serde(default)]
    results: Vec<VersionEntry>,
}

/// Reqwest-backed [`ArtifactResolver`] talking to an Artifactory-style
/// repository: lists available versions under `{provider_group}/{name}`
/// within a feed repo, then picks the greatest one matching the requested
/// version's numeric prefix client-side (see `version.rs`; the grammar
/// isn't enforced server-side).
pub struct HttpArtifactResolver {
    client: reqwest::Client,
    config: ArtifactoryConfig,
}

impl HttpArtifactResolver {
    pub fn new(client: reqwest::Client, config: ArtifactoryConfig) -> Self {
        HttpArtifactResolver { client, config }
    }
}

#[async_trait]
impl ArtifactResolver for HttpArtifactResolver {
    async fn resolve(
        &self,
        feed_name: &str,
        provider_group: &str,
        artifact_name: &str,
        requested_version: &str,
    ) -> AppResult<Option<ResolvedArtifact>> {
        let url = format!(
            "{}/api/search/versions?repos={}&g={}&a={}",
            self.config.host.trim_end_matches('/'),
            feed_name,
            provider_group,
            artifact_name,
        );

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.config.user, Some(&self.config.token))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(AppError::Artifactory(format!(
                "listing versions for {}/{} in feed {} failed with status {}",
                provider_group,
                artifact_name,
                feed_name,
                response.status()
            )));
        }

        let body: VersionsResponse = response.json().await?;
        let versions: Vec<String> = body.results.into_iter().map(|e| e.version).collect();

        let Some(available_version) = greatest_matching(requested_version, &versions) else {
            return Ok(None);
        };

        Ok(Some(ResolvedArtifact {
            available_version: available_version.to_string(),
            artifactory_path: format!("{}/{}", provider_group, artifact_name),
            artifactory_feed: feed_name.to_string(),
        }))
    }
}
