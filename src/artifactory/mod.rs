mod client;
mod version;

pub use client::HttpArtifactResolver;
pub use version::greatest_matching;

use async_trait::async_trait;

use crate::error::AppResult;

/// Where a service's artifact was found, once resolved. Carried through
/// into the deployment plan so the worker can tell the scheduler exactly
/// what to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    pub available_version: String,
    pub artifactory_path: String,
    pub artifactory_feed: String,
}

/// Resolves a requested version against an artifact repository feed.
/// `provider_group`/`artifact_name` form the repository path; `feed_name`
/// selects the channel (`stable`, `unstable`, ...); `requested_version` is
/// the dot-separated numeric prefix grammar described in the data model
/// (empty means "latest").
#[async_trait]
pub trait ArtifactResolver: Send + Sync {
    async fn resolve(
        &self,
        feed_name: &str,
        provider_group: &str,
        artifact_name: &str,
        requested_version: &str,
    ) -> AppResult<Option<ResolvedArtifact>>;
}
