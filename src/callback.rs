use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AppError, AppResult};
use crate::plan::NSDeploymentPlan;

/// Posts a generated plan to a caller-supplied `CallbackURL`. The one
/// `UpstreamDegraded` error kind in this codebase — the worker logs
/// failures as warnings and never aborts the schedule over one.
#[async_trait]
pub trait PlanCallback: Send + Sync {
    async fn post(&self, url: &str, plan: &NSDeploymentPlan) -> AppResult<()>;
}

pub struct ReqwestCallback {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestCallback {
    pub fn new(client: reqwest::Client, timeout: Duration) -> Self {
        ReqwestCallback { client, timeout }
    }
}

#[async_trait]
impl PlanCallback for ReqwestCallback {
    async fn post(&self, url: &str, plan: &NSDeploymentPlan) -> AppResult<()> {
        let response = self
            .client
            .post(url)
            .json(plan)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| AppError::CallbackFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::CallbackFailed(format!(
                "callback to {} returned status {}",
                url,
                response.status()
            )));
        }

        Ok(())
    }
}
