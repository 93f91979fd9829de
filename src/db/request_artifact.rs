use std::collections::HashSet;

use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;

use crate::error::AppResult;

/// One `(artifact, feed, requested_version)` triple that needs resolving
/// against the artifact repository. Distinct per `(artifact_id,
/// requested_version)` — see spec invariant on per-namespace feed
/// resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestArtifact {
    pub artifact_id: i64,
    pub artifact_name: String,
    pub provider_group: String,
    pub feed_name: String,
    pub requested_version: String,
}

impl RequestArtifact {
    /// The path used to look the artifact up in the feed, e.g.
    /// `team-platform/checkout-api`.
    pub fn path(&self) -> String {
        format!("{}/{}", self.provider_group, self.artifact_name)
    }

    fn from_row(row: &rusqlite::Row) -> AppResult<Self> {
        Ok(RequestArtifact {
            artifact_id: row.get(0)?,
            artifact_name: row.get(1)?,
            provider_group: row.get(2)?,
            feed_name: row.get(3)?,
            requested_version: row.get(4)?,
        })
    }

    /// Distinct artifact requests for every service in the given
    /// namespaces, resolved through the one feed mapped to each
    /// namespace's environment whose `feed_type` matches the artifact's.
    /// An artifact with zero or multiple matching feeds contributes no row
    /// here (spec invariant: silently omitted from the plan).
    pub fn for_services(
        namespace_ids: &[i64],
        conn: &PooledConnection<SqliteConnectionManager>,
    ) -> AppResult<Vec<Self>> {
        if namespace_ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = std::iter::repeat("?")
            .take(namespace_ids.len())
            .collect::<Vec<_>>()
            .join(",");
        let sql = format!(
            r#"
            SELECT DISTINCT
                a.id AS artifact_id,
                a.name AS artifact_name,
                a.provider_group AS provider_group,
                f.name AS feed_name,
                COALESCE(NULLIF(s.override_version, ''), ns.requested_version) AS requested_version
            FROM service AS s
                JOIN artifact AS a ON s.artifact_id = a.id
                JOIN namespace AS ns ON s.namespace_id = ns.id
                JOIN environment AS e ON ns.environment_id = e.id
                JOIN environment_feed_map AS efm ON e.id = efm.environment_id
                JOIN feed AS f ON efm.feed_id = f.id AND f.feed_type = a.feed_type
            WHERE ns.id IN ({})
            "#,
            placeholders
        );

        let rows = conn
            .prepare(&sql)?
            .query_and_then(rusqlite::params_from_iter(namespace_ids), Self::from_row)?
            .collect::<AppResult<Vec<_>>>()?;

        Ok(dedup(rows))
    }

    /// Symmetric to [`Self::for_services`], over database instances' migration
    /// artifacts.
    pub fn for_database_instances(
        namespace_ids: &[i64],
        conn: &PooledConnection<SqliteConnectionManager>,
    ) -> AppResult<Vec<Self>> {
        if namespace_ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = std::iter::repeat("?")
            .take(namespace_ids.len())
            .collect::<Vec<_>>()
            .join(",");
        let sql = format!(
            r#"
            SELECT DISTINCT
                a.id AS artifact_id,
                a.name AS artifact_name,
                a.provider_group AS provider_group,
                f.name AS feed_name,
                COALESCE(NULLIF(di.migration_override_version, ''), ns.requested_version) AS requested_version
            FROM database_instance AS di
                JOIN database_type AS dt ON di.database_type_id = dt.id
                JOIN artifact AS a ON dt.migration_artifact_id = a.id
                JOIN namespace AS ns ON di.namespace_id = ns.id
                JOIN environment AS e ON ns.environment_id = e.id
                JOIN environment_feed_map AS efm ON e.id = efm.environment_id
                JOIN feed AS f ON efm.feed_id = f.id AND f.feed_type = a.feed_type
            WHERE ns.id IN ({})
            "#,
            placeholders
        );

        let rows = conn
            .prepare(&sql)?
            .query_and_then(rusqlite::params_from_iter(namespace_ids), Self::from_row)?
            .collect::<AppResult<Vec<_>>>()?;

        Ok(dedup(rows))
    }
}

fn dedup(rows: Vec<RequestArtifact>) -> Vec<RequestArtifact> {
    let mut seen = HashSet::new();
    rows.into_iter().filter(|r| seen.insert(r.clone())).collect()
}
