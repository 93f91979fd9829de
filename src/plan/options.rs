use serde::{Deserialize, Serialize};

/// A namespace selector accepted by the plan generator — callers can name
/// either the primary key or the unique name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum NamespaceRequest {
    Id(i64),
    Name(String),
}

/// `Application` deploys services; `Migration` deploys database instance
/// migration artifacts. Both still appear on the resulting plan — this
/// only selects which side `artifacts` overrides apply to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlanType {
    Application,
    Migration,
}

/// An explicit artifact override supplied by the caller, matched by name
/// against the namespace's services (or database instances, per
/// `PlanType`). Entries left unmatched after plan construction surface an
/// `"unmatched service: <name>"` message on the plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArtifactOverride {
    pub name: String,
    pub requested_version: String,
}

/// Input to [`crate::plan::PlanGenerator::generate`]. See spec section
/// 4.3 for the full procedure this drives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NamespacePlanOptions {
    pub namespace_requests: Vec<NamespaceRequest>,
    #[serde(default)]
    pub artifacts: Vec<ArtifactOverride>,
    #[serde(rename = "type")]
    pub plan_type: PlanType,
    #[serde(default)]
    pub force_deploy: bool,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub callback_url: Option<String>,
}

impl NamespacePlanOptions {
    /// `true` once the caller supplied any explicit artifact overrides —
    /// switches on the unmatched-service messaging and the
    /// up-to-date-but-supplied informational message.
    pub fn artifacts_supplied(&self) -> bool {
        !self.artifacts.is_empty()
    }
}
