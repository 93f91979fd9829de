use chrono::{DateTime, Utc};
use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentState {
    Queued,
    Scheduled,
    Completed,
    Errored,
}

impl DeploymentState {
    fn as_str(&self) -> &'static str {
        match self {
            DeploymentState::Queued => "queued",
            DeploymentState::Scheduled => "scheduled",
            DeploymentState::Completed => "completed",
            DeploymentState::Errored => "errored",
        }
    }

    fn parse(s: &str) -> AppResult<Self> {
        match s {
            "queued" => Ok(DeploymentState::Queued),
            "scheduled" => Ok(DeploymentState::Scheduled),
            "completed" => Ok(DeploymentState::Completed),
            "errored" => Ok(DeploymentState::Errored),
            other => Err(AppError::Internal(format!(
                "unrecognized deployment state: {}",
                other
            ))),
        }
    }
}

pub struct Deployment {
    pub id: Uuid,
    pub namespace_id: i64,
    pub state: DeploymentState,
    pub plan_options: Value,
    pub plan_location: Option<Value>,
    pub result_location: Option<Value>,
    pub receipt_handle: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const COLUMNS: &str = "id, namespace_id, state, plan_options, plan_location, result_location, receipt_handle, created_at, updated_at";

impl Deployment {
    fn from_row(row: &rusqlite::Row) -> AppResult<Self> {
        let id: String = row.get(0)?;
        let state: String = row.get(2)?;
        let plan_options: String = row.get(3)?;
        let plan_location: Option<String> = row.get(4)?;
        let result_location: Option<String> = row.get(5)?;
        let created_at: i64 = row.get(7)?;
        let updated_at: i64 = row.get(8)?;

        Ok(Deployment {
            id: Uuid::parse_str(&id)
                .map_err(|e| AppError::Internal(format!("invalid deployment id: {}", e)))?,
            namespace_id: row.get(1)?,
            state: DeploymentState::parse(&state)?,
            plan_options: serde_json::from_str(&plan_options)?,
            plan_location: plan_location
                .map(|l| serde_json::from_str(&l))
                .transpose()?,
            result_location: result_location
                .map(|l| serde_json::from_str(&l))
                .transpose()?,
            receipt_handle: row.get(6)?,
            created_at: DateTime::from_timestamp_millis(created_at).unwrap_or_else(Utc::now),
            updated_at: DateTime::from_timestamp_millis(updated_at).unwrap_or_else(Utc::now),
        })
    }

    pub fn create(
        namespace_id: i64,
        plan_options: &Value,
        conn: &PooledConnection<SqliteConnectionManager>,
    ) -> AppResult<Self> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let plan_options_text = serde_json::to_string(plan_options)?;

        conn.prepare(&format!(
            "INSERT INTO deployment ({}) VALUES (?1, ?2, ?3, ?4, NULL, NULL, NULL, ?5, ?6)",
            COLUMNS
        ))?
        .execute(params![
            id.to_string(),
            namespace_id,
            DeploymentState::Queued.as_str(),
            plan_options_text,
            now.timestamp_millis(),
            now.timestamp_millis(),
        ])?;

        Ok(Deployment {
            id,
            namespace_id,
            state: DeploymentState::Queued,
            plan_options: plan_options.clone(),
            plan_location: None,
            result_location: None,
            receipt_handle: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn get_by_id(
        id: Uuid,
        conn: &PooledConnection<SqliteConnectionManager>,
    ) -> AppResult<Self> {
        conn.prepare(&format!("SELECT {} FROM deployment WHERE id = ?1", COLUMNS))?
            .query_row(params![id.to_string()], |row| Ok(Deployment::from_row(row)))
            .optional()
            .map_err(AppError::from)?
            .transpose()?
            .ok_or_else(|| AppError::NotFound(format!("deployment with id: {}, not found", id)))
    }

    pub fn update_receipt_handle(
        id: Uuid,
        receipt_handle: &str,
        conn: &PooledConnection<SqliteConnectionManager>,
    ) -> AppResult<Self> {
        conn.prepare(
            "UPDATE deployment SET receipt_handle = ?2, state = ?3, updated_at = ?4 WHERE id = ?1",
        )?
        .execute(params![
            id.to_string(),
            receipt_handle,
            DeploymentState::Scheduled.as_str(),
            Utc::now().timestamp_millis(),
        ])?;

        Deployment::get_by_id(id, conn)
    }

    pub fn update_plan_location(
        id: Uuid,
        location: &Value,
        conn: &PooledConnection<SqliteConnectionManager>,
    ) -> AppResult<()> {
        let location_text = serde_json::to_string(location)?;
        conn.prepare("UPDATE deployment SET plan_location = ?2, updated_at = ?3 WHERE id = ?1")?
            .execute(params![
                id.to_string(),
                location_text,
                Utc::now().timestamp_millis(),
            ])?;
        Ok(())
    }

    pub fn update_result_location(
        id: Uuid,
        location: &Value,
        errored: bool,
        conn: &PooledConnection<SqliteConnectionManager>,
    ) -> AppResult<Self> {
        let location_text = serde_json::to_string(location)?;
        let state = if errored {
            DeploymentState::Errored
        } else {
            DeploymentState::Completed
        };
        conn.prepare(
            "UPDATE deployment SET result_location = ?2, state = ?3, updated_at = ?4 WHERE id = ?1",
        )?
        .execute(params![
            id.to_string(),
            location_text,
            state.as_str(),
            Utc::now().timestamp_millis(),
        ])?;

        Deployment::get_by_id(id, conn)
    }
}
