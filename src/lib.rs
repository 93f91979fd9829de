pub mod prelude {
    pub use r2d2::Pool;
    pub use r2d2::PooledConnection;
    pub use r2d2_sqlite::SqliteConnectionManager;
    pub use rusqlite::{params, Connection, OptionalExtension};
    pub use rusqlite_migration::{Migrations, M};
    pub use serde::{Deserialize, Serialize};

    pub use crate::error::{AppError, AppResult};
}

pub mod artifactory;
pub mod blob;
pub mod callback;
pub mod config;
pub mod cron;
pub mod db;
pub mod deployment_queue;
pub mod error;
pub mod metadata;
pub mod metrics;
pub mod plan;
pub mod queue;
