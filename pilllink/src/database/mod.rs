//! Database module
//!
//! Local offline store for family members, alarms and intake logs:
//! - Schema and migrations
//! - Model definitions shared with the remote API
//! - Repository implementing the collaborator traits

pub mod models;
pub mod repository;
pub mod schema;

pub use models::*;
pub use repository::Repository;
pub use schema::initialize_database;

use crate::error::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Scheduler tick plus concurrent service calls
const LOCAL_POOL_SIZE: u32 = 5;

/// How long a confirmation write waits for the reminder poll to release the file
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection options for the offline store.
///
/// The reminder scheduler reads alarms and intake logs on every tick while
/// dose confirmations write, so the journal is WAL and writers wait out
/// `BUSY_TIMEOUT` instead of failing with `SQLITE_BUSY`. Foreign keys are on
/// so a member's alarms and intake logs go with the member; intake logs
/// keep their `alarm_id` after the alarm itself is deleted.
fn connect_options(db_path: &Path) -> std::result::Result<SqliteConnectOptions, sqlx::Error> {
    let url = format!("sqlite://{}?mode=rwc", db_path.display());
    let opts = SqliteConnectOptions::from_str(&url)?
        .create_if_missing(true)
        .busy_timeout(BUSY_TIMEOUT)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true);
    Ok(opts)
}

/// Open the offline store at `db_path`, creating and migrating it as needed.
///
/// Migrations run on their own single connection, closed before the
/// shared pool opens, so no pooled connection caches a pre-migration schema.
/// The shared pool is sized for the scheduler plus a few concurrent
/// service calls.
pub async fn create_pool(db_path: &Path) -> Result<SqlitePool> {
    tracing::info!("Opening local store at: {:?}", db_path);

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let migration_pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(connect_options(db_path)?)
        .await?;

    initialize_database(&migration_pool).await?;
    migration_pool.close().await;

    let pool = SqlitePoolOptions::new()
        .max_connections(LOCAL_POOL_SIZE)
        .connect_with(connect_options(db_path)?)
        .await?;

    tracing::info!("Local store ready ({} connections max)", LOCAL_POOL_SIZE);

    Ok(pool)
}
