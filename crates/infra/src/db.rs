//! Postgres pool construction and schema migrations.

use std::time::Duration;

use sqlx::migrate::Migrator;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Connect to Postgres and apply pending migrations.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .test_before_acquire(true)
        .connect(database_url)
        .await?;

    MIGRATOR.run(&pool).await?;
    info!(max_connections, "postgres pool ready, migrations applied");

    Ok(pool)
}
