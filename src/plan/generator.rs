use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use crate::artifactory::ArtifactResolver;
use crate::db::deployment::Deployment;
use crate::db::namespace::Namespace;
use crate::db::repo::Repo;
use crate::db::request_artifact::RequestArtifact;
use crate::error::AppResult;
use crate::metrics;
use crate::queue::{Message, QueueClient, CMD_SCHEDULE_DEPLOYMENT};

use super::model::{DeployArtifactEntry, DeployMigrationEntry, NSDeploymentPlan, PlanNamespace, PlanStatus};
use super::options::{NamespacePlanOptions, NamespaceRequest, PlanType};

/// Resolves `options.namespace_requests` against the `Repo`, by id or by
/// name as supplied.
async fn resolve_namespace(repo: &Repo, request: &NamespaceRequest) -> AppResult<Namespace> {
    match request {
        NamespaceRequest::Id(id) => repo.namespace_by_id(*id),
        NamespaceRequest::Name(name) => repo.namespace_by_name(name),
    }
}

/// Builds the full per-namespace deployment plan: reads the namespace's
/// services (or database instances, per `options.plan_type`), resolves
/// each distinct artifact request against the artifact repository, and
/// applies the match/message semantics from the data model's invariants.
///
/// Called both by [`PlanGenerator::generate`] (to validate a namespace
/// produces a sensible plan before enqueuing) and by the deployment queue
/// worker (to materialize the plan against current row state at schedule
/// time — see spec section 4.4).
pub async fn build_plan(
    repo: &Repo,
    resolver: &dyn ArtifactResolver,
    namespace: &Namespace,
    options: &NamespacePlanOptions,
) -> AppResult<NSDeploymentPlan> {
    let started = Instant::now();
    // Fetched to fail fast if the namespace's cluster link is dangling;
    // the cluster's `sch_queue_url` is only needed once a deployment is
    // actually being scheduled, handled separately in the worker.
    let _cluster = repo.cluster_by_id(namespace.cluster_id)?;
    let environment = repo.environment_by_id(namespace.environment_id)?;

    let namespace_ids = [namespace.id];
    let supplied = options.artifacts_supplied();

    let request_artifacts = match options.plan_type {
        PlanType::Application => repo.service_artifacts(&namespace_ids)?,
        PlanType::Migration => repo.database_instance_artifacts(&namespace_ids)?,
    };

    let mut overrides_matched: HashSet<String> = HashSet::new();
    let mut effective: Vec<RequestArtifact> = Vec::new();
    for ra in request_artifacts {
        if supplied {
            if let Some(ov) = options.artifacts.iter().find(|o| o.name == ra.artifact_name) {
                overrides_matched.insert(ov.name.clone());
                effective.push(RequestArtifact {
                    requested_version: ov.requested_version.clone(),
                    ..ra
                });
            }
            // Artifacts not named by an explicit override are not considered
            // when the caller supplied an explicit list.
        } else {
            effective.push(ra);
        }
    }

    // Keyed on (artifact_id, requested_version), not artifact_id alone: two
    // services (or a service and a database instance) can share an artifact
    // but request different versions via their own `override_version`, and
    // each must resolve independently rather than clobbering the other's
    // entry.
    let mut table: HashMap<(i64, String), crate::artifactory::ResolvedArtifact> = HashMap::new();
    for ra in &effective {
        let resolved = resolver
            .resolve(&ra.feed_name, &ra.provider_group, &ra.artifact_name, &ra.requested_version)
            .await?;
        metrics::get().artifact_resolutions_total.add(1, &[]);
        match resolved {
            Some(resolved) => {
                table.insert((ra.artifact_id, ra.requested_version.clone()), resolved);
            }
            None => {
                metrics::get()
                    .artifact_resolution_failures
                    .with_label_values(&[&ra.feed_name])
                    .inc();
            }
        }
    }

    // When the caller supplies explicit overrides, a service resolves
    // against the override's requested version rather than its own
    // computed one — mirrors the substitution applied above when building
    // `effective`.
    let version_for_lookup = |artifact_name: &str, own_requested_version: &str| -> Option<String> {
        if supplied {
            options
                .artifacts
                .iter()
                .find(|o| o.name == artifact_name)
                .map(|o| o.requested_version.clone())
        } else {
            Some(own_requested_version.to_string())
        }
    };

    let mut messages = Vec::new();
    let mut services_out = Vec::new();
    let mut migrations_out = Vec::new();

    match options.plan_type {
        PlanType::Application => {
            for svc in repo.services_by_namespace_id(namespace.id)? {
                let Some(lookup_version) = version_for_lookup(&svc.artifact_name, &svc.requested_version) else {
                    continue;
                };
                let Some(resolved) = table.get(&(svc.artifact_id, lookup_version)) else {
                    continue;
                };
                if svc.deployed_version.as_deref() == Some(resolved.available_version.as_str())
                    && !options.force_deploy
                {
                    if supplied {
                        messages.push(format!(
                            "artifact: {}, version: {}, is already up to date",
                            svc.artifact_name, resolved.available_version
                        ));
                    }
                    continue;
                }
                services_out.push(DeployArtifactEntry {
                    service_id: svc.service_id,
                    artifact_id: svc.artifact_id,
                    artifact_name: svc.artifact_name,
                    requested_version: svc.requested_version,
                    deployed_version: svc.deployed_version.unwrap_or_default(),
                    available_version: resolved.available_version.clone(),
                    metadata: svc.metadata,
                    artifactory_feed: resolved.artifactory_feed.clone(),
                    artifactory_path: resolved.artifactory_path.clone(),
                });
            }
        }
        PlanType::Migration => {
            for db in repo.database_instances_by_namespace_id(namespace.id)? {
                let Some(lookup_version) = version_for_lookup(&db.artifact_name, &db.requested_version) else {
                    continue;
                };
                let Some(resolved) = table.get(&(db.artifact_id, lookup_version)) else {
                    continue;
                };
                if db.deployed_version.as_deref() == Some(resolved.available_version.as_str())
                    && !options.force_deploy
                {
                    if supplied {
                        messages.push(format!(
                            "artifact: {}, version: {}, is already up to date",
                            db.artifact_name, resolved.available_version
                        ));
                    }
                    continue;
                }
                migrations_out.push(DeployMigrationEntry {
                    database_id: db.database_id,
                    database_name: db.database_name,
                    artifact_id: db.artifact_id,
                    artifact_name: db.artifact_name,
                    requested_version: db.requested_version,
                    deployed_version: db.deployed_version.unwrap_or_default(),
                    available_version: resolved.available_version.clone(),
                    metadata: db.metadata,
                    artifactory_feed: resolved.artifactory_feed.clone(),
                    artifactory_path: resolved.artifactory_path.clone(),
                });
            }
        }
    }

    if supplied {
        for ov in &options.artifacts {
            if !overrides_matched.contains(&ov.name) {
                messages.push(format!("unmatched service: {}", ov.name));
            }
        }
    }

    let plan = NSDeploymentPlan {
        namespace: PlanNamespace {
            id: namespace.id,
            name: namespace.name.clone(),
            alias: namespace.alias.clone(),
            cluster_id: namespace.cluster_id,
        },
        environment_name: environment.name,
        services: services_out,
        migrations: migrations_out,
        messages,
        status: if options.dry_run {
            PlanStatus::Dryrun
        } else {
            PlanStatus::Pending
        },
    };

    metrics::get()
        .plan_generation_seconds
        .record(started.elapsed().as_secs_f64(), &[]);

    Ok(plan)
}

/// Entry point driving spec section 4.3: for every requested namespace,
/// validate a plan can be built, persist a `Deployment` row, and enqueue a
/// `api-schedule-deployment` message for the worker to materialize.
pub struct PlanGenerator {
    repo: Repo,
    resolver: Arc<dyn ArtifactResolver>,
    queue: Arc<dyn QueueClient>,
    api_q_url: String,
}

impl PlanGenerator {
    pub fn new(
        repo: Repo,
        resolver: Arc<dyn ArtifactResolver>,
        queue: Arc<dyn QueueClient>,
        api_q_url: String,
    ) -> Self {
        PlanGenerator {
            repo,
            resolver,
            queue,
            api_q_url,
        }
    }

    pub async fn generate(&self, options: &NamespacePlanOptions) -> AppResult<Vec<Deployment>> {
        let mut deployments = Vec::new();

        for request in &options.namespace_requests {
            let namespace = resolve_namespace(&self.repo, request).await?;

            // Building the plan here validates it against current rows and
            // surfaces artifact-resolver errors early; the worker rebuilds
            // it from scratch at schedule time against possibly-changed
            // rows (spec section 4.4).
            build_plan(&self.repo, self.resolver.as_ref(), &namespace, options).await?;

            let plan_options_json = serde_json::to_value(options)?;
            let deployment = self.repo.create_deployment(namespace.id, &plan_options_json)?;
            metrics::get().deployments_created.add(1, &[]);

            // `id` is the deployment id directly; `body` carries no
            // information the worker needs (it re-reads the deployment row
            // by id and decodes `plan_options` from there).
            let group_id = format!("deploy-{}", namespace.name);
            let message = Message::new(deployment.id, group_id, CMD_SCHEDULE_DEPLOYMENT, serde_json::Value::Null);
            self.queue.send(&self.api_q_url, &message).await?;

            deployments.push(deployment);
        }

        Ok(deployments)
    }
}
