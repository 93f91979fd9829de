use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::artifactory::ArtifactResolver;
use crate::blob::BlobStore;
use crate::callback::PlanCallback;
use crate::db::repo::Repo;
use crate::error::{format_error_chain, AppError, AppResult};
use crate::metrics;
use crate::plan::{build_plan, NamespacePlanOptions};
use crate::queue::{Message, QueueClient, CMD_DEPLOY_NAMESPACE, CMD_SCHEDULE_DEPLOYMENT, CMD_UPDATE_DEPLOYMENT};

/// The long-running consumer of the inbound (API) queue. Dispatches
/// `api-schedule-deployment` and `api-update-deployment` messages per spec
/// section 4.4, including the rollback policy on pre-forward failures.
pub struct DeploymentQueue {
    repo: Repo,
    resolver: Arc<dyn ArtifactResolver>,
    queue: Arc<dyn QueueClient>,
    blob: Arc<dyn BlobStore>,
    callback: Arc<dyn PlanCallback>,
    api_q_url: String,
    api_q_max_number_of_message: i32,
    api_q_wait_time_second: i32,
    api_q_visibility_timeout: i32,
    api_q_worker_timeout: Duration,
}

impl DeploymentQueue {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        repo: Repo,
        resolver: Arc<dyn ArtifactResolver>,
        queue: Arc<dyn QueueClient>,
        blob: Arc<dyn BlobStore>,
        callback: Arc<dyn PlanCallback>,
        api_q_url: String,
        api_q_max_number_of_message: i32,
        api_q_wait_time_second: i32,
        api_q_visibility_timeout: i32,
        api_q_worker_timeout: Duration,
    ) -> Self {
        DeploymentQueue {
            repo,
            resolver,
            queue,
            blob,
            callback,
            api_q_url,
            api_q_max_number_of_message,
            api_q_wait_time_second,
            api_q_visibility_timeout,
            api_q_worker_timeout,
        }
    }

    /// Polls the inbound queue until `shutdown` is cancelled, spawning one
    /// task per received message so handlers run to completion
    /// independently.
    pub async fn start(self: Arc<Self>, shutdown: CancellationToken) {
        log::info!("deployment queue worker starting, queue={}", self.api_q_url);

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            let received = tokio::select! {
                _ = shutdown.cancelled() => break,
                result = self.queue.receive(
                    &self.api_q_url,
                    self.api_q_max_number_of_message,
                    self.api_q_wait_time_second,
                    self.api_q_visibility_timeout,
                ) => result,
            };

            let messages = match received {
                Ok(messages) => messages,
                Err(e) => {
                    log::error!("failed to receive from inbound queue: {}", format_error_chain(&e));
                    continue;
                }
            };

            for message in messages {
                let this = Arc::clone(&self);
                let timeout = self.api_q_worker_timeout;
                tokio::spawn(async move {
                    let req_id = message.req_id;
                    let id = message.id;
                    match tokio::time::timeout(timeout, this.handle_message(message)).await {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => {
                            log::error!("req_id={} failed to handle message: {}", req_id, format_error_chain(&e));
                        }
                        Err(_) => {
                            log::error!("req_id={} handler for message {} timed out after {:?}", req_id, id, timeout);
                        }
                    }
                });
            }
        }

        log::info!("deployment queue worker stopped");
    }

    /// Dispatches one message by `command`. `pub` so tests can drive
    /// the worker's handling of a single message without going through
    /// the polling loop in [`Self::start`].
    pub async fn handle_message(&self, message: Message) -> AppResult<()> {
        match message.command.as_str() {
            CMD_SCHEDULE_DEPLOYMENT => self.schedule_deployment(message).await,
            CMD_UPDATE_DEPLOYMENT => self.update_deployment(message).await,
            other => Err(AppError::UnrecognizedCommand(other.to_string())),
        }
    }

    /// Deletes `message` from the inbound queue (giving up on this
    /// attempt) and returns `err` unchanged. Used for every failure that
    /// occurs before the scheduler-queue forward succeeds.
    async fn rollback_error(&self, message: &Message, err: AppError) -> AppError {
        if let Err(delete_err) = self.queue.delete(&self.api_q_url, message).await {
            log::error!(
                "req_id={} failed to remove message {} after rollback: {}",
                message.req_id,
                message.id,
                format_error_chain(&delete_err)
            );
        }
        err
    }

    async fn schedule_deployment(&self, message: Message) -> AppResult<()> {
        let receipt_handle = message.receipt_handle.clone().ok_or_else(|| {
            AppError::Internal(format!("message {} has no receipt handle", message.id))
        })?;

        let deployment = match self.repo.update_deployment_receipt_handle(message.id, &receipt_handle) {
            Ok(d) => d,
            Err(e) => return Err(self.rollback_error(&message, e).await),
        };
        metrics::get().deployments_scheduled.add(1, &[]);

        let options: NamespacePlanOptions = match serde_json::from_value(deployment.plan_options.clone()) {
            Ok(o) => o,
            Err(e) => return Err(self.rollback_error(&message, AppError::from(e)).await),
        };

        let namespace = match self.repo.namespace_by_id(deployment.namespace_id) {
            Ok(ns) => ns,
            Err(e) => return Err(self.rollback_error(&message, e).await),
        };

        let plan = match build_plan(&self.repo, self.resolver.as_ref(), &namespace, &options).await {
            Ok(p) => p,
            Err(e) => return Err(self.rollback_error(&message, e).await),
        };

        if let Some(url) = &options.callback_url {
            if let Err(e) = self.callback.post(url, &plan).await {
                log::warn!("req_id={} callback to {} failed: {}", message.req_id, url, format_error_chain(&e));
            }
        }

        if options.dry_run {
            self.queue.delete(&self.api_q_url, &message).await?;
            return Ok(());
        }

        let plan_bytes = match serde_json::to_vec(&plan) {
            Ok(b) => b,
            Err(e) => return Err(self.rollback_error(&message, AppError::from(e)).await),
        };

        let location = match self.blob.upload(&format!("{}-plan", deployment.id), plan_bytes).await {
            Ok(l) => l,
            Err(e) => return Err(self.rollback_error(&message, e).await),
        };
        let location_json = match serde_json::to_value(&location) {
            Ok(v) => v,
            Err(e) => return Err(self.rollback_error(&message, AppError::from(e)).await),
        };

        let cluster = match self.repo.cluster_by_id(namespace.cluster_id) {
            Ok(c) => c,
            Err(e) => return Err(self.rollback_error(&message, e).await),
        };

        let scheduler_message = Message::new(deployment.id, plan.group_id(), CMD_DEPLOY_NAMESPACE, location_json.clone());
        if let Err(e) = self.queue.send(&cluster.sch_queue_url, &scheduler_message).await {
            return Err(self.rollback_error(&message, e).await);
        }

        // Post-forward failures still delete the inbound message (per
        // rollback policy) but leave the scheduler-side deployment in
        // flight — the `plan_location` write is bookkeeping, not a
        // prerequisite for the scheduler's own progress.
        if let Err(e) = self.repo.update_deployment_plan_location(deployment.id, &location_json) {
            return Err(self.rollback_error(&message, e).await);
        }

        // Deliberately not deleted: the message remains invisible under
        // `receipt_handle` until the scheduler's `api-update-deployment`
        // reply releases it.
        Ok(())
    }

    async fn update_deployment(&self, message: Message) -> AppResult<()> {
        // The scheduler's result body isn't given a fixed shape by the
        // external interface beyond being opaque; a top-level
        // `"status": "error"` flips the deployment to `errored` instead of
        // `completed`, so a scheduler that wants to report failure can.
        let errored = message
            .body
            .get("status")
            .and_then(|v| v.as_str())
            .map(|s| s.eq_ignore_ascii_case("error"))
            .unwrap_or(false);

        let deployment = self
            .repo
            .update_deployment_result_location(message.id, &message.body, errored)?;
        if errored {
            metrics::get().deployments_errored.add(1, &[]);
        } else {
            metrics::get().deployments_completed.add(1, &[]);
        }

        let original_receipt_handle = deployment.receipt_handle.ok_or_else(|| {
            AppError::Internal(format!("deployment {} has no stored receipt handle", deployment.id))
        })?;

        let original_message = Message {
            id: deployment.id,
            req_id: message.req_id,
            group_id: String::new(),
            command: String::new(),
            body: serde_json::Value::Null,
            receipt_handle: Some(original_receipt_handle),
        };
        self.queue.delete(&self.api_q_url, &original_message).await?;

        self.queue.delete(&self.api_q_url, &message).await?;

        Ok(())
    }
}
