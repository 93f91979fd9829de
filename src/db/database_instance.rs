use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;

use crate::error::AppResult;
use crate::metadata::{self, Metadata};

/// A database instance joined with its migration artifact (via
/// `database_type`), namespace, and environment. See
/// [`crate::db::service::ServiceDeployContext`] for the service-side
/// analogue; the two are intentionally symmetric.
pub struct DatabaseInstanceDeployContext {
    pub database_id: i64,
    pub database_name: String,
    pub artifact_id: i64,
    pub artifact_name: String,
    pub requested_version: String,
    pub deployed_version: Option<String>,
    pub metadata: Metadata,
}

impl DatabaseInstanceDeployContext {
    fn from_row(row: &rusqlite::Row) -> AppResult<Self> {
        let env_meta: String = row.get(6)?;
        let ns_meta: String = row.get(7)?;
        let artifact_meta: String = row.get(8)?;
        let instance_meta: String = row.get(9)?;

        let layers = [
            metadata::parse(&env_meta),
            metadata::parse(&ns_meta),
            metadata::parse(&artifact_meta),
            metadata::parse(&instance_meta),
        ];

        Ok(DatabaseInstanceDeployContext {
            database_id: row.get(0)?,
            database_name: row.get(1)?,
            artifact_id: row.get(2)?,
            artifact_name: row.get(3)?,
            requested_version: row.get(4)?,
            deployed_version: row.get(5)?,
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
                di.id AS database_id,
                di.name AS database_name,
                a.id AS artifact_id,
                a.name AS artifact_name,
                COALESCE(NULLIF(di.migration_override_version, ''), ns.requested_version) AS requested_version,
                di.migration_deployed_version,
                e.metadata AS environment_metadata,
                ns.metadata AS namespace_metadata,
                a.metadata AS artifact_metadata,
                di.metadata AS instance_metadata
            FROM database_instance AS di
                JOIN database_type AS dt ON di.database_type_id = dt.id
                JOIN artifact AS a ON dt.migration_artifact_id = a.id
                JOIN namespace AS ns ON di.namespace_id = ns.id
                JOIN environment AS e ON ns.environment_id = e.id
            WHERE di.namespace_id = ?1
            ORDER BY di.id
            "#,
        )?
        .query_and_then([namespace_id], DatabaseInstanceDeployContext::from_row)?
        .collect()
    }
}
