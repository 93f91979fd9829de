use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::db::repo::Repo;
use crate::error::format_error_chain;
use crate::plan::options::{NamespacePlanOptions, NamespaceRequest, PlanType};
use crate::plan::PlanGenerator;

/// Periodic sweep of auto-deploy namespaces (spec section 4.5). Ticks
/// every `period`, skipping any namespace whose prior tick hasn't
/// completed yet to avoid unbounded queue growth even though the
/// downstream FIFO `group_id` would eventually serialize them anyway.
pub struct DeploymentCron {
    repo: Repo,
    generator: Arc<PlanGenerator>,
    period: Duration,
    in_flight: Arc<Mutex<HashSet<i64>>>,
}

impl DeploymentCron {
    pub fn new(repo: Repo, generator: Arc<PlanGenerator>, period: Duration) -> Self {
        DeploymentCron {
            repo,
            generator,
            period,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        log::info!("deployment cron starting, period={:?}", self.period);
        let mut ticker = tokio::time::interval(self.period);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => self.tick().await,
            }
        }

        log::info!("deployment cron stopped");
    }

    async fn tick(&self) {
        let namespaces = match self.repo.namespaces_by_auto_deploy_filter() {
            Ok(namespaces) => namespaces,
            Err(e) => {
                log::error!("cron failed to list auto-deploy namespaces: {}", format_error_chain(&e));
                return;
            }
        };

        for namespace in namespaces {
            let already_running = {
                let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
                !in_flight.insert(namespace.id)
            };
            if already_running {
                log::debug!("cron skipping namespace {}: prior tick still in flight", namespace.id);
                continue;
            }

            let generator = Arc::clone(&self.generator);
            let in_flight = Arc::clone(&self.in_flight);
            let namespace_id = namespace.id;

            tokio::spawn(async move {
                let options = NamespacePlanOptions {
                    namespace_requests: vec![NamespaceRequest::Id(namespace_id)],
                    artifacts: Vec::new(),
                    plan_type: PlanType::Application,
                    force_deploy: false,
                    dry_run: false,
                    callback_url: None,
                };

                if let Err(e) = generator.generate(&options).await {
                    log::error!(
                        "cron failed to generate plan for namespace {}: {}",
                        namespace_id,
                        format_error_chain(&e)
                    );
                }

                in_flight.lock().unwrap_or_else(|e| e.into_inner()).remove(&namespace_id);
            });
        }
    }
}
