use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;

use crate::error::AppResult;
use crate::metadata::{self, Metadata};

/// A service joined with its artifact, namespace, and environment, carrying
/// the effective `requested_version` (`COALESCE(override_version,
/// namespace.requested_version)`) and merged metadata
/// (environment ▸ namespace ▸ artifact ▸ service) needed to build a
/// deployment plan entry.
pub struct ServiceDeployContext {
    pub service_id: i64,
    pub artifact_id: i64,
    pub artifact_name: String,
    pub requested_version: String,
    pub deployed_version: Option<String>,
    pub metadata: Metadata,
}

impl ServiceDeployContext {
    fn from_row(row: &rusqlite::Row) -> AppResult<Self> {
        let env_meta: String = row.get(5)?;
        let ns_meta: String = row.get(6)?;
        let artifact_meta: String = row.get(7)?;
        let service_meta: String = row.get(8)?;

        let layers = [
            metadata::parse(&env_meta),
            metadata::parse(&ns_meta),
            metadata::parse(&artifact_meta),
            metadata::parse(&service_meta),
        ];

        Ok(ServiceDeployContext {
            service_id: row.get(0)?,
            artifact_id: row.get(1)?,
            artifact_name: row.get(2)?,
            requested_version: row.get(3)?,
            deployed_version: row.get(4)?,
            metadata: metadata::merge_layers(&[&layers[0], &layers[1], &layers[2], &layers[3]]),
        })
    }

    pub(crate) fn query_by_namespace_id(
        namespace_id: i64,
        conn: &PooledConnection<SqliteConnectionManager>,
    ) -> AppResult<Vec<Self>> {
        conn.prepare(
            r#"
            SELECT
                s.id AS service_id,
                a.id AS artifact_id,
                a.name AS artifact_name,
                COALESCE(NULLIF(s.override_version, ''), ns.requested_version) AS requested_version,
                s.deployed_version,
                e.metadata AS environment_metadata,
                ns.metadata AS namespace_metadata,
                a.metadata AS artifact_metadata,
                s.metadata AS service_metadata
            FROM service AS s
                JOIN artifact AS a ON s.artifact_id = a.id
                JOIN namespace AS ns ON s.namespace_id = ns.id
                JOIN environment AS e ON ns.environment_id = e.id
            WHERE s.namespace_id = ?1
            ORDER BY s.id
            "#,
        )?
        .query_and_then([namespace_id], ServiceDeployContext::from_row)?
        .collect()
    }
}
