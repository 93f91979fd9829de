use indoc::indoc;
use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite_migration::{Migrations, M};

use crate::error::{AppError, AppResult};

pub fn migrate(mut conn: PooledConnection<SqliteConnectionManager>) -> AppResult<()> {
    let migrations: Migrations = Migrations::new(vec![
        M::up(indoc! { r#"
          CREATE TABLE environment (
              id INTEGER PRIMARY KEY NOT NULL,
              name TEXT NOT NULL UNIQUE,
              alias TEXT,
              description TEXT NOT NULL DEFAULT '',
              metadata TEXT NOT NULL DEFAULT '{}'
          );

          CREATE TABLE cluster (
              id INTEGER PRIMARY KEY NOT NULL,
              name TEXT NOT NULL,
              provider_group TEXT NOT NULL,
              sch_queue_url TEXT NOT NULL
          );

          CREATE TABLE namespace (
              id INTEGER PRIMARY KEY NOT NULL,
              name TEXT NOT NULL UNIQUE,
              alias TEXT,
              environment_id INTEGER NOT NULL,
              cluster_id INTEGER NOT NULL,
              requested_version TEXT NOT NULL DEFAULT '',
              explicit_deploy_only BOOLEAN NOT NULL DEFAULT FALSE,
              metadata TEXT NOT NULL DEFAULT '{}',
              FOREIGN KEY(environment_id) REFERENCES environment(id),
              FOREIGN KEY(cluster_id) REFERENCES cluster(id)
          );

          CREATE TABLE feed (
              id INTEGER PRIMARY KEY NOT NULL,
              name TEXT NOT NULL UNIQUE,
              feed_type TEXT NOT NULL
          );

          CREATE TABLE environment_feed_map (
              environment_id INTEGER NOT NULL,
              feed_id INTEGER NOT NULL,
              PRIMARY KEY(environment_id, feed_id),
              FOREIGN KEY(environment_id) REFERENCES environment(id),
              FOREIGN KEY(feed_id) REFERENCES feed(id)
          );

          CREATE TABLE artifact (
              id INTEGER PRIMARY KEY NOT NULL,
              name TEXT NOT NULL,
              provider_group TEXT NOT NULL,
              feed_type TEXT NOT NULL,
              function_pointer TEXT,
              metadata TEXT NOT NULL DEFAULT '{}'
          );

          CREATE TABLE service (
              id INTEGER PRIMARY KEY NOT NULL,
              namespace_id INTEGER NOT NULL,
              artifact_id INTEGER NOT NULL,
              name TEXT NOT NULL,
              override_version TEXT NOT NULL DEFAULT '',
              deployed_version TEXT,
              metadata TEXT NOT NULL DEFAULT '{}',
              sticky_sessions BOOLEAN NOT NULL DEFAULT FALSE,
              node_group TEXT NOT NULL DEFAULT '',
              count INTEGER NOT NULL DEFAULT 1,
              FOREIGN KEY(namespace_id) REFERENCES namespace(id),
              FOREIGN KEY(artifact_id) REFERENCES artifact(id)
          );

          CREATE TABLE database_instance (
              id INTEGER PRIMARY KEY NOT NULL,
              namespace_id INTEGER NOT NULL,
              database_server_id INTEGER,
              database_type_id INTEGER NOT NULL,
              customer_id INTEGER,
              name TEXT NOT NULL,
              migration_override_version TEXT NOT NULL DEFAULT '',
              migration_deployed_version TEXT,
              metadata TEXT NOT NULL DEFAULT '{}',
              FOREIGN KEY(namespace_id) REFERENCES namespace(id)
          );

          CREATE TABLE database_type (
              id INTEGER PRIMARY KEY NOT NULL,
              name TEXT NOT NULL,
              migration_artifact_id INTEGER NOT NULL,
              FOREIGN KEY(migration_artifact_id) REFERENCES artifact(id)
          );

          CREATE TABLE deployment (
              id TEXT PRIMARY KEY NOT NULL,
              namespace_id INTEGER NOT NULL,
              state TEXT NOT NULL,
              plan_options TEXT NOT NULL,
              plan_location TEXT,
              result_location TEXT,
              receipt_handle TEXT,
              created_at INTEGER NOT NULL,
              updated_at INTEGER NOT NULL,
              FOREIGN KEY(namespace_id) REFERENCES namespace(id)
          );
          CREATE INDEX IF NOT EXISTS idx_deployment_namespace_id ON deployment(namespace_id);
      "#}),
        // M::up( indoc! { r#"
        //     SQL GOES HERE
        // "#}),
    ]);

    conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
    migrations
        .to_latest(&mut conn)
        .map_err(|e| AppError::DatabaseMigration(e.to_string()))?;
    Ok(())
}
