use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension};

use crate::error::{AppError, AppResult};
use crate::metadata::{self, Metadata};

pub struct Namespace {
    pub id: i64,
    pub name: String,
    pub alias: Option<String>,
    pub environment_id: i64,
    pub cluster_id: i64,
    pub requested_version: String,
    pub explicit_deploy_only: bool,
    pub metadata: Metadata,
}

const COLUMNS: &str =
    "id, name, alias, environment_id, cluster_id, requested_version, explicit_deploy_only, metadata";

impl Namespace {
    pub fn from_row(row: &rusqlite::Row) -> AppResult<Self> {
        let metadata_text: String = row.get(7)?;
        Ok(Namespace {
            id: row.get(0)?,
            name: row.get(1)?,
            alias: row.get(2)?,
            environment_id: row.get(3)?,
            cluster_id: row.get(4)?,
            requested_version: row.get(5)?,
            explicit_deploy_only: row.get(6)?,
            metadata: metadata::parse(&metadata_text),
        })
    }

    pub fn get_by_id(
        id: i64,
        conn: &PooledConnection<SqliteConnectionManager>,
    ) -> AppResult<Self> {
        conn.prepare(&format!("SELECT {} FROM namespace WHERE id = ?1", COLUMNS))?
            .query_row(params![id], |row| Ok(Namespace::from_row(row)))
            .optional()
            .map_err(AppError::from)?
            .transpose()?
            .ok_or_else(|| AppError::NotFound(format!("namespace with id: {}, not found", id)))
    }

    pub fn get_by_name(
        name: &str,
        conn: &PooledConnection<SqliteConnectionManager>,
    ) -> AppResult<Self> {
        conn.prepare(&format!(
            "SELECT {} FROM namespace WHERE name = ?1",
            COLUMNS
        ))?
        .query_row(params![name], |row| Ok(Namespace::from_row(row)))
        .optional()
        .map_err(AppError::from)?
        .transpose()?
        .ok_or_else(|| AppError::NotFound(format!("namespace with name: {}, not found", name)))
    }

    /// Namespaces eligible for the cron sweep: `explicit_deploy_only = false`.
    pub fn by_auto_deploy_filter(
        conn: &PooledConnection<SqliteConnectionManager>,
    ) -> AppResult<Vec<Self>> {
        conn.prepare(&format!(
            "SELECT {} FROM namespace WHERE explicit_deploy_only = FALSE ORDER BY id",
            COLUMNS
        ))?
        .query_and_then(params![], Namespace::from_row)?
        .collect::<Result<Vec<_>, AppError>>()
    }
}
