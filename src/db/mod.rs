use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};

use crate::error::{MobilityError, Result};

pub mod queries;

pub type DbPool = Pool<Sqlite>;

const CREATE_USERS: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    username TEXT NOT NULL UNIQUE
);
"#;

const CREATE_MOBILITY: &str = r#"
CREATE TABLE IF NOT EXISTS mobility (
    id INTEGER PRIMARY KEY,
    uuid TEXT NOT NULL UNIQUE,
    user_id INTEGER NOT NULL REFERENCES users(id),
    client TEXT NOT NULL,
    epoch_millis INTEGER NOT NULL,
    upload_millis INTEGER NOT NULL,
    phone_timezone TEXT NOT NULL,
    location_status TEXT NOT NULL,
    location TEXT,
    mode TEXT NOT NULL,
    privacy_state TEXT NOT NULL
);
"#;

const CREATE_MOBILITY_EXTENDED: &str = r#"
CREATE TABLE IF NOT EXISTS mobility_extended (
    mobility_id INTEGER PRIMARY KEY REFERENCES mobility(id) ON DELETE CASCADE,
    sensor_data TEXT NOT NULL,
    features TEXT NOT NULL,
    classifier_version TEXT NOT NULL
);
"#;

const CREATE_USER_TIME_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_mobility_user_time ON mobility(user_id, epoch_millis);";

/// Opens a connection pool for the given database URL, e.g.
/// `sqlite://mobility.db?mode=rwc` or `sqlite::memory:`.
pub async fn init_pool(database_url: &str) -> Result<DbPool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .map_err(MobilityError::storage("init_pool"))?;
    Ok(pool)
}

/// Creates the mobility schema if it does not exist yet. The uuid
/// uniqueness constraint backing duplicate-upload detection lives here.
pub async fn init_schema(pool: &DbPool) -> Result<()> {
    for ddl in [
        CREATE_USERS,
        CREATE_MOBILITY,
        CREATE_MOBILITY_EXTENDED,
        CREATE_USER_TIME_INDEX,
    ] {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .map_err(MobilityError::storage("init_schema"))?;
    }
    Ok(())
}
