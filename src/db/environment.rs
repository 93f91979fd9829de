use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension};

use crate::error::{AppError, AppResult};
use crate::metadata::{self, Metadata};

pub struct Environment {
    pub id: i64,
    pub name: String,
    pub alias: Option<String>,
    pub description: String,
    pub metadata: Metadata,
}

impl Environment {
    pub fn from_row(row: &rusqlite::Row) -> AppResult<Self> {
        let metadata_text: String = row.get(4)?;
        Ok(Environment {
            id: row.get(0)?,
            name: row.get(1)?,
            alias: row.get(2)?,
            description: row.get(3)?,
            metadata: metadata::parse(&metadata_text),
        })
    }

    pub fn get_by_id(
        id: i64,
        conn: &PooledConnection<SqliteConnectionManager>,
    ) -> AppResult<Self> {
        conn.prepare(
            "SELECT id, name, alias, description, metadata FROM environment WHERE id = ?1",
        )?
        .query_row(params![id], |row| Ok(Environment::from_row(row)))
        .optional()
        .map_err(AppError::from)?
        .transpose()?
        .ok_or_else(|| AppError::NotFound(format!("environment with id: {}, not found", id)))
    }
}
