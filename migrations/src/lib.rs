pub use sqlx;

use std::str::FromStr;

use log::info;
use sqlx::{
    migrate::{MigrateError, Migrator},
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

static MIGRATOR: Migrator = sqlx::migrate!("./sql");

#[derive(thiserror::Error, Debug)]
pub enum MigrationError {
    #[error("error connecting to the database: {0}")]
    Connection(#[from] sqlx::Error),
    #[error("error applying migrations: {0}")]
    Migration(#[from] MigrateError),
}

pub fn migrations() -> &'static Migrator {
    &MIGRATOR
}

pub async fn pool(database_url: &str, max_connections: u32) -> sqlx::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect_with(options)
        .await
}

/// Opens a single-connection pool over a private in-memory database. The
/// connection is never recycled, since dropping it discards the data.
pub async fn memory_pool() -> sqlx::Result<SqlitePool> {
    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
}

pub async fn run_all(pool: &SqlitePool) -> Result<(), MigrateError> {
    migrations().run(pool).await
}

pub async fn initialize(
    database_url: &str,
    max_connections: u32,
) -> Result<SqlitePool, MigrationError> {
    let pool = pool(database_url, max_connections).await?;
    info!("connected to {}", database_url);

    run_all(&pool).await?;
    info!("applied {} migrations", migrations().iter().count());

    Ok(pool)
}

pub async fn initialize_in_memory() -> Result<SqlitePool, MigrationError> {
    let pool = memory_pool().await?;
    run_all(&pool).await?;
    Ok(pool)
}
