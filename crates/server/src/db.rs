use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, warn};

/// Create the PostgreSQL pool and make sure the `users` table exists.
pub async fn init_pg_pool(config: &roster_core::config::PostgresConfig) -> anyhow::Result<PgPool> {
    if !config.is_configured() {
        warn!("Neither DATABASE_URL nor DB_USER is set; connecting as 'postgres'");
    }

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(&config.database_url())
        .await
        .with_context(|| format!("failed to connect to PostgreSQL at {}:{}", config.host, config.port))?;
    info!("PostgreSQL connected: {}", config.host);

    info!("Creating users table if it does not exist...");
    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .context("failed to initialize database schema")?;
    info!("Database initialized successfully");

    Ok(pool)
}
