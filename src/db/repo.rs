use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use serde_json::Value;
use uuid::Uuid;

use crate::error::AppResult;

use super::cluster::Cluster;
use super::database_instance::DatabaseInstanceDeployContext;
use super::deployment::Deployment;
use super::environment::Environment;
use super::namespace::Namespace;
use super::request_artifact::RequestArtifact;
use super::service::ServiceDeployContext;

/// The data-access facade handed to the plan generator, the deployment
/// queue worker and the cron sweep. Wraps a pooled SQLite connection and
/// exposes the operations described in the data-model section, rather
/// than leaking `rusqlite`/`r2d2` types past this module.
#[derive(Clone)]
pub struct Repo {
    pool: Pool<SqliteConnectionManager>,
}

impl Repo {
    pub fn new(pool: Pool<SqliteConnectionManager>) -> Self {
        Repo { pool }
    }

    pub fn namespaces_by_auto_deploy_filter(&self) -> AppResult<Vec<Namespace>> {
        let conn = self.pool.get()?;
        Namespace::by_auto_deploy_filter(&conn)
    }

    pub fn namespace_by_id(&self, id: i64) -> AppResult<Namespace> {
        let conn = self.pool.get()?;
        Namespace::get_by_id(id, &conn)
    }

    pub fn namespace_by_name(&self, name: &str) -> AppResult<Namespace> {
        let conn = self.pool.get()?;
        Namespace::get_by_name(name, &conn)
    }

    pub fn environment_by_id(&self, id: i64) -> AppResult<Environment> {
        let conn = self.pool.get()?;
        Environment::get_by_id(id, &conn)
    }

    pub fn cluster_by_id(&self, id: i64) -> AppResult<Cluster> {
        let conn = self.pool.get()?;
        Cluster::get_by_id(id, &conn)
    }

    pub fn services_by_namespace_id(&self, namespace_id: i64) -> AppResult<Vec<ServiceDeployContext>> {
        let conn = self.pool.get()?;
        ServiceDeployContext::query_by_namespace_id(namespace_id, &conn)
    }

    pub fn database_instances_by_namespace_id(
        &self,
        namespace_id: i64,
    ) -> AppResult<Vec<DatabaseInstanceDeployContext>> {
        let conn = self.pool.get()?;
        DatabaseInstanceDeployContext::query_by_namespace_id(namespace_id, &conn)
    }

    /// Distinct artifact requests for every service across the given
    /// namespaces, resolved through each namespace's environment feed map.
    pub fn service_artifacts(&self, namespace_ids: &[i64]) -> AppResult<Vec<RequestArtifact>> {
        let conn = self.pool.get()?;
        RequestArtifact::for_services(namespace_ids, &conn)
    }

    /// Symmetric to [`Self::service_artifacts`], over database instance
    /// migration artifacts.
    pub fn database_instance_artifacts(
        &self,
        namespace_ids: &[i64],
    ) -> AppResult<Vec<RequestArtifact>> {
        let conn = self.pool.get()?;
        RequestArtifact::for_database_instances(namespace_ids, &conn)
    }

    pub fn create_deployment(&self, namespace_id: i64, plan_options: &Value) -> AppResult<Deployment> {
        let conn = self.pool.get()?;
        Deployment::create(namespace_id, plan_options, &conn)
    }

    pub fn get_deployment(&self, id: Uuid) -> AppResult<Deployment> {
        let conn = self.pool.get()?;
        Deployment::get_by_id(id, &conn)
    }

    pub fn update_deployment_receipt_handle(
        &self,
        id: Uuid,
        receipt_handle: &str,
    ) -> AppResult<Deployment> {
        let conn = self.pool.get()?;
        Deployment::update_receipt_handle(id, receipt_handle, &conn)
    }

    pub fn update_deployment_plan_location(&self, id: Uuid, location: &Value) -> AppResult<()> {
        let conn = self.pool.get()?;
        Deployment::update_plan_location(id, location, &conn)
    }

    pub fn update_deployment_result_location(
        &self,
        id: Uuid,
        location: &Value,
        errored: bool,
    ) -> AppResult<Deployment> {
        let conn = self.pool.get()?;
        Deployment::update_result_location(id, location, errored, &conn)
    }
}
