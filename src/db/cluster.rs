use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension};

use crate::error::{AppError, AppResult};

pub struct Cluster {
    pub id: i64,
    pub name: String,
    pub provider_group: String,
    pub sch_queue_url: String,
}

impl Cluster {
    pub fn from_row(row: &rusqlite::Row) -> AppResult<Self> {
        Ok(Cluster {
            id: row.get(0)?,
            name: row.get(1)?,
            provider_group: row.get(2)?,
            sch_queue_url: row.get(3)?,
        })
    }

    pub fn get_by_id(
        id: i64,
        conn: &PooledConnection<SqliteConnectionManager>,
    ) -> AppResult<Self> {
        conn.prepare(
            "SELECT id, name, provider_group, sch_queue_url FROM cluster WHERE id = ?1",
        )?
        .query_row(params![id], |row| Ok(Cluster::from_row(row)))
        .optional()
        .map_err(AppError::from)?
        .transpose()?
        .ok_or_else(|| AppError::NotFound(format!("cluster with id: {}, not found", id)))
    }
}
