use serde::{Deserialize, Serialize};

use crate::metadata::Metadata;

/// A namespace's identity as carried on the plan blob — just enough for
/// the scheduler to address it, not the full `Namespace` row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanNamespace {
    pub id: i64,
    pub name: String,
    pub alias: Option<String>,
    pub cluster_id: i64,
}

/// One service entry in a generated plan. Present only for services that
/// ended up resolved to a deployable artifact (see `matchArtifact` in the
/// plan generator) — up-to-date services with no forced redeploy are
/// omitted entirely, not included with `deploy = false`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeployArtifactEntry {
    pub service_id: i64,
    pub artifact_id: i64,
    pub artifact_name: String,
    pub requested_version: String,
    /// Empty string for a service/database instance never deployed before —
    /// the nullable column is projected to a plain string at this boundary.
    pub deployed_version: String,
    pub available_version: String,
    pub metadata: Metadata,
    pub artifactory_feed: String,
    pub artifactory_path: String,
}

/// Symmetric to [`DeployArtifactEntry`], for a database instance's
/// migration artifact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeployMigrationEntry {
    pub database_id: i64,
    pub database_name: String,
    pub artifact_id: i64,
    pub artifact_name: String,
    pub requested_version: String,
    /// Empty string for a service/database instance never deployed before —
    /// the nullable column is projected to a plain string at this boundary.
    pub deployed_version: String,
    pub available_version: String,
    pub metadata: Metadata,
    pub artifactory_feed: String,
    pub artifactory_path: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    Pending,
    Dryrun,
}

/// The full per-namespace deployment plan, serialized to JSON and uploaded
/// to blob storage (or POSTed to a callback URL for a dry run).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NSDeploymentPlan {
    pub namespace: PlanNamespace,
    pub environment_name: String,
    pub services: Vec<DeployArtifactEntry>,
    pub migrations: Vec<DeployMigrationEntry>,
    pub messages: Vec<String>,
    pub status: PlanStatus,
}

impl NSDeploymentPlan {
    /// The FIFO group id under which this namespace's deployments are
    /// serialized on both the inbound and scheduler queues.
    pub fn group_id(&self) -> String {
        format!("deploy-{}", self.namespace.name)
    }
}
