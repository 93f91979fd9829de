use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use eve_deploy::artifactory::{ArtifactResolver, ResolvedArtifact};
use eve_deploy::blob::{BlobStore, Location};
use eve_deploy::callback::PlanCallback;
use eve_deploy::db::migrations::migrate;
use eve_deploy::db::repo::Repo;
use eve_deploy::error::AppResult;
use eve_deploy::plan::NSDeploymentPlan;
use eve_deploy::queue::{Message, QueueClient};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use tempfile::NamedTempFile;

/// A tempfile-backed SQLite pool, migrated and ready for fixture
/// inserts. The `NamedTempFile` must be kept alive for the pool's
/// lifetime (dropping it deletes the backing file).
pub struct TestDb {
    pub pool: Pool<SqliteConnectionManager>,
    _file: NamedTempFile,
}

pub fn test_db() -> TestDb {
    let file = NamedTempFile::new().expect("create temp db file");
    let manager = SqliteConnectionManager::file(file.path());
    let pool = Pool::new(manager).expect("build pool");
    let conn = pool.get().expect("get connection");
    migrate(conn).expect("run migrations");
    TestDb { pool, _file: file }
}

/// A minimal namespace with one environment, one cluster, one feed
/// bound to the environment, one artifact, and (depending on
/// `with_service`) one service deployed at `deployed_version`.
pub struct Fixture {
    pub environment_id: i64,
    pub cluster_id: i64,
    pub namespace_id: i64,
    pub artifact_id: i64,
    pub feed_id: i64,
}

pub fn seed_namespace_with_service(
    db: &TestDb,
    deployed_version: Option<&str>,
    requested_version: &str,
) -> Fixture {
    let conn = db.pool.get().expect("get connection");

    conn.execute(
        "INSERT INTO environment (id, name, alias, description, metadata) VALUES (1, 'prod', NULL, '', '{}')",
        params![],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO cluster (id, name, provider_group, sch_queue_url) VALUES (1, 'main', 'acme', 'https://sqs.example/scheduler')",
        params![],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO namespace (id, name, alias, environment_id, cluster_id, requested_version, explicit_deploy_only, metadata)
         VALUES (1, 'checkout', NULL, 1, 1, ?1, FALSE, '{}')",
        params![requested_version],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO feed (id, name, feed_type) VALUES (1, 'stable', 'docker')",
        params![],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO environment_feed_map (environment_id, feed_id) VALUES (1, 1)",
        params![],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO artifact (id, name, provider_group, feed_type, function_pointer, metadata)
         VALUES (1, 'checkout-api', 'team-platform', 'docker', NULL, '{}')",
        params![],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO service (id, namespace_id, artifact_id, name, override_version, deployed_version, metadata, sticky_sessions, node_group, count)
         VALUES (1, 1, 1, 'checkout-api', '', ?1, '{}', FALSE, '', 1)",
        params![deployed_version],
    )
    .unwrap();

    Fixture {
        environment_id: 1,
        cluster_id: 1,
        namespace_id: 1,
        artifact_id: 1,
        feed_id: 1,
    }
}

pub fn repo(db: &TestDb) -> Repo {
    Repo::new(db.pool.clone())
}

/// Resolves any `(feed, path, name, requested)` whose `artifact_name`
/// is a configured key, always returning the same `available_version`.
pub struct FakeResolver {
    versions: Mutex<std::collections::HashMap<String, String>>,
}

impl FakeResolver {
    pub fn new(versions: &[(&str, &str)]) -> Self {
        FakeResolver {
            versions: Mutex::new(versions.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()),
        }
    }
}

#[async_trait]
impl ArtifactResolver for FakeResolver {
    async fn resolve(
        &self,
        feed_name: &str,
        provider_group: &str,
        artifact_name: &str,
        _requested_version: &str,
    ) -> AppResult<Option<ResolvedArtifact>> {
        let versions = self.versions.lock().unwrap_or_else(|e| e.into_inner());
        Ok(versions.get(artifact_name).map(|version| ResolvedArtifact {
            available_version: version.clone(),
            artifactory_path: format!("{}/{}", provider_group, artifact_name),
            artifactory_feed: feed_name.to_string(),
        }))
    }
}

/// Records every send/delete; `receive` always returns empty (the
/// scenario tests drive handlers directly rather than through the
/// polling loop).
#[derive(Default)]
pub struct FakeQueue {
    pub sent: Mutex<Vec<(String, Message)>>,
    pub deleted: Mutex<Vec<(String, Message)>>,
}

#[async_trait]
impl QueueClient for FakeQueue {
    async fn send(&self, queue_url: &str, message: &Message) -> AppResult<()> {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((queue_url.to_string(), message.clone()));
        Ok(())
    }

    async fn receive(
        &self,
        _queue_url: &str,
        _max_messages: i32,
        _wait_time_seconds: i32,
        _visibility_timeout_seconds: i32,
    ) -> AppResult<Vec<Message>> {
        Ok(Vec::new())
    }

    async fn delete(&self, queue_url: &str, message: &Message) -> AppResult<()> {
        self.deleted
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((queue_url.to_string(), message.clone()));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeBlob {
    pub uploads: Mutex<Vec<(String, Vec<u8>)>>,
}

#[async_trait]
impl BlobStore for FakeBlob {
    async fn upload(&self, key: &str, body: Vec<u8>) -> AppResult<Location> {
        self.uploads
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((key.to_string(), body));
        Ok(Location {
            bucket: "test-bucket".to_string(),
            key: key.to_string(),
        })
    }
}

#[derive(Default)]
pub struct FakeCallback {
    pub received: Mutex<Vec<(String, NSDeploymentPlan)>>,
    pub fail: bool,
}

#[async_trait]
impl PlanCallback for FakeCallback {
    async fn post(&self, url: &str, plan: &NSDeploymentPlan) -> AppResult<()> {
        if self.fail {
            return Err(eve_deploy::error::AppError::CallbackFailed("fake failure".to_string()));
        }
        self.received
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((url.to_string(), plan.clone()));
        Ok(())
    }
}

pub fn arc<T>(value: T) -> Arc<T> {
    Arc::new(value)
}
